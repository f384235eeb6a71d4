//! URL resolution: free-text query to ranked candidate page URLs.

pub mod client;
pub mod types;

pub use client::{BingClient, UrlResolver};
