use std::sync::Arc;

use crate::auth::{AuthController, TokenPair, TokenStore};
use crate::transport::Transport;

mod impls;
mod raw;

pub use raw::{AUTH_FAILED_SENTINEL, signals_auth_failure};

/// Request engine: builds authenticated requests, refreshes expired tokens once,
/// and hands back buffered bodies or saved files.
pub struct RawClient {
    transport: Transport,
    auth: AuthController,
    tokens: Option<TokenPair>,
    store: Option<Arc<dyn TokenStore>>,
    api_version: u32,
}

/// Typed wrapper over [`RawClient`] mapping responses into records.
pub struct Client {
    raw: RawClient,
}
