//! OAuth device-flow authorization and token persistence.

mod controller;
mod device_flow;
mod store;
mod tokens;

pub use controller::{AuthController, AuthorizeResult, ClientCredentials};
pub use device_flow::{AuthorizeOutcome, DeviceFlowPrompt, DeviceFlowSession, DeviceFlowState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use tokens::TokenPair;
