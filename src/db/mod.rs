pub mod donations;
pub mod initialize;
pub mod log;
pub mod migrate;
pub mod outbox;
pub mod pool;
pub mod queries;
pub mod sessions;
pub mod settings;
pub mod staff;
pub mod stats;
pub mod waivers;
