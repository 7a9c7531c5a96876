use std::sync::Arc;

use secrecy::SecretString;

/// Ambient source of the bearer token attached to outgoing requests.
///
/// [`ApiClient`](crate::ApiClient) consults its token source synchronously
/// immediately before dispatching every request. Nothing is cached on the
/// client side, so logging in or out takes effect on the very next call.
pub trait TokenSource: Send + Sync {
    /// The current bearer token, or `None` when logged out.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// A token source that never yields a token (anonymous requests only).
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn bearer_token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token, for scripting and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub SecretString);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    fn bearer_token(&self) -> Option<SecretString> {
        (**self).bearer_token()
    }
}
