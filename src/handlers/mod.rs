//! HTTP handlers

mod health;

pub use health::{health_check, health_router, HealthState};
