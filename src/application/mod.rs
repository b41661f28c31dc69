pub mod confirm;
pub mod error;
pub mod events;
pub mod persistence;
pub mod render;
pub mod service;
