pub mod analytics;
pub mod auth;
pub mod auto_checkout;
pub mod calculator;
pub mod donations;
pub mod registry;
pub mod sessions;
pub mod waiver;
