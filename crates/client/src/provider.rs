//! Identity-provider seam on the client.

use async_trait::async_trait;
use tokio::sync::watch;

use hrms_auth::AuthError;

/// What the identity provider currently knows about the user.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum ProviderState {
    /// The provider has not decided yet (e.g. still restoring a persisted sign-in).
    #[default]
    Pending,
    /// The user is signed in; `credential` is the provider's fresh ID token.
    SignedIn { credential: String },
    SignedOut,
}

impl core::fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProviderState::Pending => f.write_str("Pending"),
            ProviderState::SignedIn { .. } => f.write_str("SignedIn { credential: <redacted> }"),
            ProviderState::SignedOut => f.write_str("SignedOut"),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current auth state plus every later change.
    ///
    /// A receiver obtained after the provider settled still sees that state.
    fn subscribe(&self) -> watch::Receiver<ProviderState>;

    /// End the provider-side sign-in.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
