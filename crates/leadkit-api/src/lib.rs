// leadkit-api: Async Rust client for the lead-capture backend

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{Anonymous, StaticToken, TokenSource};
pub use client::{ApiClient, LeadQuery};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
