//! Client for the remote video generation API.
//!
//! This crate provides:
//! - The `VideoApi` capability (create, remix, status, content download)
//! - `SoraClient`, its reqwest implementation with bearer auth
//! - Environment-driven client configuration

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use api::VideoApi;
pub use client::SoraClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ClientError, ClientResult};
pub use types::{CreateVideoRequest, Download};
