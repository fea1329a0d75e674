//! Client auth context: the one place UI code learns who is signed in.
//!
//! State machine: `Loading -> {Authenticated(Principal), Unauthenticated}`,
//! plus an orthogonal connectivity flag. Observers subscribe to a
//! `watch` channel and always see a complete snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Notify, watch};

use hrms_auth::{AuthError, Capability, Principal};

use crate::backend::AuthBackend;
use crate::provider::{IdentityProvider, ProviderState};
use crate::types::{AuthSnapshot, AuthStatus, ConnectivityState};

struct Inner {
    state: watch::Sender<AuthSnapshot>,
    provider: Arc<dyn IdentityProvider>,
    backend: Arc<dyn AuthBackend>,
    mounted: AtomicBool,
    /// Bumped on every sign-in/sign-out; a resolution only publishes if the
    /// generation it started under is still current.
    generation: AtomicU64,
    shutdown: Notify,
}

/// Handle to a mounted auth context.
///
/// Dropping the handle unmounts it.
pub struct AuthContext {
    inner: Arc<Inner>,
}

impl AuthContext {
    /// Start in `Loading` and follow the provider's auth state, beginning
    /// with whatever it already knows.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(provider: Arc<dyn IdentityProvider>, backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::loading());
        let states = provider.subscribe();

        let inner = Arc::new(Inner {
            state,
            provider,
            backend,
            mounted: AtomicBool::new(true),
            generation: AtomicU64::new(0),
            shutdown: Notify::new(),
        });

        tokio::spawn(listen(inner.clone(), states));
        tracing::debug!("auth context mounted");

        Self { inner }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.inner.state.borrow().principal().cloned()
    }

    /// The only permission check UI code should use.
    pub fn has_permission(&self, capability: Capability) -> bool {
        self.inner.state.borrow().has_permission(capability)
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn set_online(&self) {
        self.inner.set_connectivity(ConnectivityState::Online);
    }

    pub fn set_offline(&self) {
        self.inner.set_connectivity(ConnectivityState::Offline);
    }

    /// Sign out everywhere this client is signed in.
    ///
    /// The state flips to `Unauthenticated` before any network call. The
    /// provider is signed out even if ending the server session fails; the
    /// first failure is returned and kept in the snapshot.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.publish(AuthStatus::Unauthenticated, None);

        let ended = self.inner.backend.end_session().await;
        let signed_out = self.inner.provider.sign_out().await;
        let result = ended.and(signed_out);

        if let Err(e) = &result {
            tracing::warn!(error = %e, "logout did not complete");
            self.inner.state.send_modify(|s| s.error = Some(e.clone()));
        }
        result
    }

    /// Stop following the provider. A resolution already in flight runs to
    /// completion and its result is dropped.
    pub fn unmount(&self) {
        if self.inner.mounted.swap(false, Ordering::SeqCst) {
            self.inner.shutdown.notify_one();
            tracing::debug!("auth context unmounted");
        }
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl Inner {
    fn publish(&self, status: AuthStatus, error: Option<AuthError>) {
        self.state.send_modify(|s| {
            s.status = status;
            s.error = error;
        });
    }

    fn set_connectivity(&self, connectivity: ConnectivityState) {
        self.state.send_if_modified(|s| {
            let changed = s.connectivity != connectivity;
            s.connectivity = connectivity;
            changed
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn signed_in(&self, credential: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(AuthStatus::Loading, None);

        // Both steps must finish before anyone sees `Authenticated`.
        if let Err(e) = self.backend.establish_session(credential).await {
            self.finish(generation, Err(e));
            return;
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            // Logged out while the session was being created.
            self.end_orphaned_session().await;
            return;
        }

        let result = self.backend.fetch_principal(credential).await;
        if result.is_err() {
            self.end_orphaned_session().await;
        }
        self.finish(generation, result);
    }

    fn finish(&self, generation: u64, result: Result<Principal, AuthError>) {
        if !self.is_current(generation) {
            tracing::debug!("discarding stale sign-in result");
            return;
        }

        match result {
            Ok(principal) => {
                tracing::info!(principal_id = %principal.id, role = %principal.role, "signed in");
                self.publish(AuthStatus::Authenticated(principal), None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-in could not be completed");
                self.publish(AuthStatus::Unauthenticated, Some(e));
            }
        }
    }

    /// Revoke a server session nobody will use.
    async fn end_orphaned_session(&self) {
        if let Err(e) = self.backend.end_session().await {
            tracing::warn!(error = %e, "failed to end orphaned server session");
        }
    }

    async fn signed_out(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let had_session = matches!(self.state.borrow().status, AuthStatus::Authenticated(_));
        // Already signed out (e.g. our own logout): keep whatever error it recorded.
        self.state.send_if_modified(|s| {
            if s.status == AuthStatus::Unauthenticated {
                return false;
            }
            s.status = AuthStatus::Unauthenticated;
            s.error = None;
            true
        });

        if had_session {
            if let Err(e) = self.backend.end_session().await {
                tracing::warn!(error = %e, "failed to end server session");
                if self.mounted.load(Ordering::SeqCst) {
                    self.state.send_modify(|s| s.error = Some(e));
                }
            }
        }
    }
}

async fn listen(inner: Arc<Inner>, mut states: watch::Receiver<ProviderState>) {
    loop {
        let state = states.borrow_and_update().clone();
        match state {
            ProviderState::Pending => {}
            ProviderState::SignedIn { credential } => inner.signed_in(&credential).await,
            ProviderState::SignedOut => inner.signed_out().await,
        }

        if !inner.mounted.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = inner.shutdown.notified() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    tracing::debug!("identity provider went away");
                    break;
                }
            }
        }
    }
    tracing::debug!("auth context listener stopped");
}
