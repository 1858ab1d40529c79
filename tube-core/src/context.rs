//! Per-call context handed to services and hooks.

/// Who is calling and under which request.
///
/// Transports fill this in; services must not assume any field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Correlation id, usually the `x-request-id` header.
    pub request_id: Option<String>,
    /// Wallet address the caller claims (`x-wallet-address`). Not verified.
    pub wallet: Option<String>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }
}
