//! Client for the Autolab REST API with OAuth2 device-flow authorization.

pub mod auth;
pub mod catalog;
mod client;
pub mod config;
mod errors;
pub mod path;
pub mod retry;
pub mod telemetry;
pub mod transport;
pub mod types;

pub use auth::{AuthorizeOutcome, DeviceFlowPrompt, FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
pub use catalog::Endpoint;
pub use client::{AUTH_FAILED_SENTINEL, Client, RawClient, signals_auth_failure};
pub use config::{Config, ConfigLocation, read_config};
pub use errors::Error;
pub use transport::{DownloadTarget, Method, RequestOptions, ResponseBody, ResponseOutcome};
