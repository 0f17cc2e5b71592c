/// State of the device authorization handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceFlowState {
    Idle,
    AwaitingDeviceCode,
    Polling,
    Granted,
    Denied,
    /// A code was granted but the token endpoint did not hand out a pair for it.
    ExchangeFailed,
    TimedOut,
    NotInitiated,
}

/// Codes handed out by `device_flow_init`. Cleared once the user grants or denies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFlowSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
}

/// What the user needs to see to approve the client on another device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceFlowPrompt {
    pub user_code: String,
    pub verification_uri: String,
}

impl From<&DeviceFlowSession> for DeviceFlowPrompt {
    fn from(session: &DeviceFlowSession) -> Self {
        Self {
            user_code: session.user_code.clone(),
            verification_uri: session.verification_uri.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    Granted,
    Denied,
    /// The session is kept; authorization can be polled again.
    TimedOut,
    NotInitiated,
}

impl AuthorizeOutcome {
    /// Numeric status: 0 granted, 1 denied, -1 not initiated, -2 timed out.
    pub fn code(self) -> i32 {
        match self {
            AuthorizeOutcome::Granted => 0,
            AuthorizeOutcome::Denied => 1,
            AuthorizeOutcome::NotInitiated => -1,
            AuthorizeOutcome::TimedOut => -2,
        }
    }
}
