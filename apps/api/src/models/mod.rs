pub mod food;
pub mod profile;
pub mod user;
