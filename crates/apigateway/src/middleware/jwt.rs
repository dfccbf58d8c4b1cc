use axum::{
    Extension, Json,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use shared::{abstract_trait::DynJwtService, errors::ErrorResponse, errors::ServiceError};
use tracing::debug;

type AuthRejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(message: &str) -> AuthRejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            status: "fail".to_string(),
            message: message.to_string(),
        }),
    )
}

/// Accepts an access token from the `token` cookie or a bearer header and
/// stores the caller's user id (`i32`) in the request extensions.
pub async fn auth_middleware(
    cookie_jar: CookieJar,
    Extension(jwt): Extension<DynJwtService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, AuthRejection> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer ").map(str::to_owned))
        })
        .ok_or_else(|| unauthorized("You are not logged in, please provide token"))?;

    let user_id = jwt.verify_token(&token, "access").map_err(|e| {
        debug!("Rejected token: {e}");
        match e {
            ServiceError::TokenExpired => unauthorized("Token has expired"),
            ServiceError::InvalidTokenType => unauthorized("Access token required"),
            _ => unauthorized("Invalid token"),
        }
    })?;

    let user_id = i32::try_from(user_id).map_err(|_| unauthorized("Invalid token"))?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
