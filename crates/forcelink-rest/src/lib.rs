//! REST data API client for forcelink.

pub mod auth;
pub mod client;

pub use auth::{login, Session};
pub use client::RestClient;
