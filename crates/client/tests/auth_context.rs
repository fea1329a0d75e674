use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hrms_auth::{AuthError, Capability, IdentityClaims, Principal, Role};
use hrms_client::{
    AuthBackend, AuthContext, AuthStatus, ConnectivityState, GuardView, IdentityProvider, ProtectedRoute,
    ProviderState,
};
use hrms_core::UserId;
use tokio::sync::{Semaphore, watch};

// ─────────────────────────────────────────────────────────────────────────────
// Fakes
// ─────────────────────────────────────────────────────────────────────────────

struct FakeProvider {
    state: watch::Sender<ProviderState>,
    sign_outs: AtomicUsize,
}

impl FakeProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: watch::Sender::new(ProviderState::Pending),
            sign_outs: AtomicUsize::new(0),
        })
    }

    fn sign_in(&self, credential: &str) {
        self.state.send_replace(ProviderState::SignedIn {
            credential: credential.to_string(),
        });
    }

    fn signed_out_elsewhere(&self) {
        self.state.send_replace(ProviderState::SignedOut);
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn subscribe(&self) -> watch::Receiver<ProviderState> {
        self.state.subscribe()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ProviderState::SignedOut);
        Ok(())
    }
}

#[derive(Default)]
struct FakeBackend {
    /// credential -> principal lookup result
    users: HashMap<String, Result<Principal, AuthError>>,
    /// When set, principal lookups wait for a permit.
    gate: Option<Arc<Semaphore>>,
    /// When set, session creation waits for a permit.
    establish_gate: Option<Arc<Semaphore>>,
    /// Ending the session fails as if the server were unreachable.
    offline: bool,
    establishing: AtomicUsize,
    sessions: AtomicUsize,
    lookups_done: AtomicUsize,
    ends: AtomicUsize,
    /// Whether the server currently holds a session for this client.
    live: AtomicBool,
}

impl FakeBackend {
    fn with_user(mut self, credential: &str, result: Result<Principal, AuthError>) -> Self {
        self.users.insert(credential.to_string(), result);
        self
    }

    fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn establish_gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.establish_gate = Some(gate);
        self
    }

    fn offline(mut self) -> Self {
        self.offline = true;
        self
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn establish_session(&self, _credential: &str) -> Result<(), AuthError> {
        self.establishing.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.establish_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.live.store(true, Ordering::SeqCst);
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_principal(&self, credential: &str) -> Result<Principal, AuthError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        let result = self
            .users
            .get(credential)
            .cloned()
            .unwrap_or(Err(AuthError::PrincipalNotFound));
        self.lookups_done.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn end_session(&self) -> Result<(), AuthError> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(AuthError::ProviderUnavailable("offline".to_string()));
        }
        self.live.store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn principal(id: &str, role: Role) -> Principal {
    let user_id = UserId::new(id).unwrap();
    let now = Utc::now();
    Principal {
        id: user_id.clone(),
        verified_identity: IdentityClaims {
            principal_id: user_id,
            email: Some(format!("{id}@example.com")),
            issued_at: now,
            expires_at: now + chrono::Duration::hours(1),
        },
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        role,
        department: None,
        manager_id: None,
    }
}

async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

async fn wait_for_status(ctx: &AuthContext, pred: impl Fn(&AuthStatus) -> bool) {
    let mut rx = ctx.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| pred(&s.status)))
        .await
        .expect("timed out waiting for auth state")
        .expect("auth context dropped");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn authenticated_only_after_session_and_role_are_known() {
    let gate = Arc::new(Semaphore::new(0));
    let provider = FakeProvider::new();
    let backend = Arc::new(
        FakeBackend::default()
            .with_user("tok-emp", Ok(principal("emp-1", Role::Employee)))
            .gated(gate.clone()),
    );
    let ctx = AuthContext::mount(provider.clone(), backend.clone());
    assert!(ctx.snapshot().is_loading());

    provider.sign_in("tok-emp");
    eventually(|| backend.sessions.load(Ordering::SeqCst) == 1).await;

    // Session exists but the role is not resolved yet.
    assert!(ctx.snapshot().is_loading());
    assert!(Capability::ALL.iter().all(|c| !ctx.has_permission(*c)));

    gate.add_permits(1);
    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;

    assert_eq!(ctx.principal().unwrap().role, Role::Employee);
    assert!(ctx.has_permission(Capability::CanViewAttendance));
    assert!(!ctx.has_permission(Capability::CanManageEmployees));
    assert_eq!(ctx.snapshot().error, None);
}

#[tokio::test]
async fn unknown_account_ends_unauthenticated_with_error_kept() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default());
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    provider.sign_in("tok-ghost");
    wait_for_status(&ctx, |s| *s == AuthStatus::Unauthenticated).await;

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.error, Some(AuthError::PrincipalNotFound));
    assert_eq!(snapshot.principal(), None);
    assert!(!ctx.has_permission(Capability::CanViewAttendance));
    // The session created for an account we cannot resolve is not left behind.
    assert!(!backend.live.load(Ordering::SeqCst));
}

#[tokio::test]
async fn store_outage_is_surfaced_as_retryable() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user(
        "tok-emp",
        Err(AuthError::StoreUnavailable("timeout".to_string())),
    ));
    let ctx = AuthContext::mount(provider.clone(), backend);

    provider.sign_in("tok-emp");
    wait_for_status(&ctx, |s| *s == AuthStatus::Unauthenticated).await;

    let error = ctx.snapshot().error.expect("error retained");
    assert!(error.is_transient());
    assert!(!error.requires_sign_in());
}

#[tokio::test]
async fn guard_settles_on_exactly_one_terminal_view() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user("tok-emp", Ok(principal("emp-1", Role::Employee))));
    let ctx = AuthContext::mount(provider.clone(), backend);

    let mut states = ctx.subscribe();
    let mut guard = ProtectedRoute::new("/login").require(Capability::CanProcessPayroll);
    assert_eq!(guard.observe(&states.borrow()), Some(GuardView::Loading));

    provider.sign_in("tok-emp");
    let view = tokio::time::timeout(Duration::from_secs(2), guard.settle(&mut states))
        .await
        .unwrap();
    assert_eq!(
        view,
        GuardView::Denied {
            capability: Capability::CanProcessPayroll
        }
    );

    // Nothing new to render for the same resolution.
    assert_eq!(guard.observe(&ctx.snapshot()), None);
}

#[tokio::test]
async fn logout_is_immediate_and_revokes_once() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user("tok-mgr", Ok(principal("mgr-1", Role::Manager))));
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    provider.sign_in("tok-mgr");
    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;

    ctx.logout().await.unwrap();
    assert_eq!(ctx.snapshot().status, AuthStatus::Unauthenticated);
    assert_eq!(ctx.principal(), None);
    assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);

    // The provider's SignedOut echo must not trigger a second revocation.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.ends.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_sign_out_ends_the_server_session() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user("tok-mgr", Ok(principal("mgr-1", Role::Manager))));
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    provider.sign_in("tok-mgr");
    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;

    provider.signed_out_elsewhere();
    wait_for_status(&ctx, |s| *s == AuthStatus::Unauthenticated).await;
    eventually(|| backend.ends.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn logout_during_session_creation_leaves_no_live_session() {
    let gate = Arc::new(Semaphore::new(0));
    let provider = FakeProvider::new();
    let backend = Arc::new(
        FakeBackend::default()
            .with_user("tok-emp", Ok(principal("emp-1", Role::Employee)))
            .establish_gated(gate.clone()),
    );
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    provider.sign_in("tok-emp");
    eventually(|| backend.establishing.load(Ordering::SeqCst) == 1).await;

    ctx.logout().await.unwrap();
    gate.add_permits(1);
    eventually(|| backend.sessions.load(Ordering::SeqCst) == 1).await;
    eventually(|| !backend.live.load(Ordering::SeqCst)).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!backend.live.load(Ordering::SeqCst));
    assert_eq!(ctx.snapshot().status, AuthStatus::Unauthenticated);
    assert_eq!(backend.lookups_done.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_signs_out_of_the_provider_even_when_offline() {
    let provider = FakeProvider::new();
    let backend = Arc::new(
        FakeBackend::default()
            .with_user("tok-mgr", Ok(principal("mgr-1", Role::Manager)))
            .offline(),
    );
    let ctx = AuthContext::mount(provider.clone(), backend);

    provider.sign_in("tok-mgr");
    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;

    let err = ctx.logout().await.unwrap_err();
    assert_eq!(err, AuthError::ProviderUnavailable("offline".to_string()));
    assert_eq!(provider.sign_outs.load(Ordering::SeqCst), 1);
    assert_eq!(*provider.state.borrow(), ProviderState::SignedOut);

    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.status, AuthStatus::Unauthenticated);
    assert!(snapshot.error.is_some_and(|e| e.is_transient()));
}

#[tokio::test]
async fn mounting_after_the_provider_signed_in_still_resolves() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user("tok-emp", Ok(principal("emp-1", Role::Employee))));

    provider.sign_in("tok-emp");
    let ctx = AuthContext::mount(provider.clone(), backend);

    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;
    assert_eq!(ctx.principal().unwrap().id.as_str(), "emp-1");
}

#[tokio::test]
async fn initial_signed_out_state_does_not_call_the_server() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().offline());

    provider.signed_out_elsewhere();
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    wait_for_status(&ctx, |s| *s == AuthStatus::Unauthenticated).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(backend.ends.load(Ordering::SeqCst), 0);
    assert_eq!(ctx.snapshot().error, None);
}

#[tokio::test]
async fn connectivity_is_independent_of_auth_state() {
    let provider = FakeProvider::new();
    let backend = Arc::new(FakeBackend::default().with_user("tok-adm", Ok(principal("adm-1", Role::Admin))));
    let ctx = AuthContext::mount(provider.clone(), backend);

    provider.sign_in("tok-adm");
    wait_for_status(&ctx, |s| matches!(s, AuthStatus::Authenticated(_))).await;

    ctx.set_offline();
    let snapshot = ctx.snapshot();
    assert_eq!(snapshot.connectivity, ConnectivityState::Offline);
    assert!(matches!(snapshot.status, AuthStatus::Authenticated(_)));
    assert!(ctx.has_permission(Capability::CanManageSettings));

    ctx.set_online();
    assert_eq!(ctx.snapshot().connectivity, ConnectivityState::Online);
}

#[tokio::test]
async fn result_arriving_after_unmount_is_discarded() {
    let gate = Arc::new(Semaphore::new(0));
    let provider = FakeProvider::new();
    let backend = Arc::new(
        FakeBackend::default()
            .with_user("tok-emp", Ok(principal("emp-1", Role::Employee)))
            .gated(gate.clone()),
    );
    let ctx = AuthContext::mount(provider.clone(), backend.clone());

    provider.sign_in("tok-emp");
    eventually(|| backend.sessions.load(Ordering::SeqCst) == 1).await;

    ctx.unmount();
    assert!(!ctx.is_mounted());

    gate.add_permits(1);
    eventually(|| backend.lookups_done.load(Ordering::SeqCst) == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(ctx.snapshot().is_loading());
    assert_eq!(ctx.principal(), None);
}
