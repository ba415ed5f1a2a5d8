//! Registry HTTP access
//!
//! This module provides the shared HTTP fetcher every resolver uses to
//! talk to its upstream registry.

mod client;

pub use client::HttpClient;
