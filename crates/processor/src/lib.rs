pub mod abstract_trait;
pub mod circuit_breaker;
pub mod config;
pub mod di;
pub mod domain;
pub mod health;
pub mod metrics;
pub mod model;
pub mod poller;
pub mod repository;
pub mod service;
pub mod state;
