pub mod donation;
pub mod session;
pub mod settings;
pub mod staff;
pub mod user;
pub mod waiver;
