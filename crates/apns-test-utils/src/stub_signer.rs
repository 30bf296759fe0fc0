//! Stub signers for exercising issuance and caching logic.

use apple_auth::{AuthError, Claims, Es256Signer, SignedToken, SigningKey, TokenPurpose, TokenSigner};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`TokenSigner`] that counts invocations and can fail scripted calls.
///
/// Delegates real signing to [`Es256Signer`], so the tokens it produces are
/// genuine; what it adds is observability (how many times was signing
/// actually performed?) and fault injection.
pub struct CountingSigner {
    inner: Es256Signer,
    calls: AtomicUsize,
    fail_calls: HashSet<usize>,
}

impl CountingSigner {
    /// A counting signer that never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::failing_on([])
    }

    /// A counting signer that fails the given (1-based) call numbers with
    /// a signing error.
    #[must_use]
    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            inner: Es256Signer::new(),
            calls: AtomicUsize::new(0),
            fail_calls: calls.into_iter().collect(),
        }
    }

    /// How many times `sign` has been invoked (including failed calls).
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSigner for CountingSigner {
    fn sign(
        &self,
        key: &SigningKey,
        claims: &Claims,
        purpose: TokenPurpose,
    ) -> Result<SignedToken, AuthError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_calls.contains(&call) {
            return Err(AuthError::Signing(format!(
                "injected failure on call {call}"
            )));
        }
        self.inner.sign(key, claims, purpose)
    }
}
