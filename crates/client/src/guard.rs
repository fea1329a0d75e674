//! Protected-route guard: what a view should show for the current auth state.

use serde::Serialize;
use tokio::sync::watch;

use hrms_auth::{Capability, RouteTable};

use crate::types::{AuthSnapshot, AuthStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum GuardView {
    /// Neutral placeholder; nothing protected is shown yet.
    Loading,
    /// Not signed in: navigate to the sign-in page.
    Redirect { to: String },
    /// Signed in but missing `capability`: show a denial in place.
    Denied { capability: Capability },
    /// Render the protected content.
    Render,
}

impl GuardView {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuardView::Loading)
    }
}

#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    required: Option<Capability>,
    sign_in: String,
    last: Option<GuardView>,
}

impl ProtectedRoute {
    pub fn new(sign_in_path: impl Into<String>) -> Self {
        Self {
            required: None,
            sign_in: sign_in_path.into(),
            last: None,
        }
    }

    pub fn require(mut self, capability: Capability) -> Self {
        self.required = Some(capability);
        self
    }

    /// Guard for `path`, classified by the same table the edge gate uses.
    pub fn for_path(table: &RouteTable, path: &str) -> Self {
        Self {
            required: table.required_capability(path),
            sign_in: table.sign_in_location(path),
            last: None,
        }
    }

    pub fn required(&self) -> Option<Capability> {
        self.required
    }

    pub fn evaluate(&self, snapshot: &AuthSnapshot) -> GuardView {
        match &snapshot.status {
            AuthStatus::Loading => GuardView::Loading,
            AuthStatus::Unauthenticated => GuardView::Redirect { to: self.sign_in.clone() },
            AuthStatus::Authenticated(_) => match self.required {
                Some(capability) if !snapshot.has_permission(capability) => GuardView::Denied { capability },
                _ => GuardView::Render,
            },
        }
    }

    /// Like [`evaluate`](Self::evaluate), but only returns a view when it
    /// differs from the last one emitted.
    pub fn observe(&mut self, snapshot: &AuthSnapshot) -> Option<GuardView> {
        let view = self.evaluate(snapshot);
        if self.last.as_ref() == Some(&view) {
            return None;
        }
        self.last = Some(view.clone());
        Some(view)
    }

    /// Wait for the first terminal view.
    ///
    /// If the context goes away while still loading, `Loading` is returned.
    pub async fn settle(&mut self, states: &mut watch::Receiver<AuthSnapshot>) -> GuardView {
        loop {
            let snapshot = states.borrow_and_update().clone();
            let view = self.evaluate(&snapshot);
            self.observe(&snapshot);
            if view.is_terminal() {
                return view;
            }
            if states.changed().await.is_err() {
                return view;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectivityState;
    use chrono::{Duration, Utc};
    use hrms_auth::{IdentityClaims, Principal, Role};
    use hrms_core::UserId;

    fn snapshot(status: AuthStatus) -> AuthSnapshot {
        AuthSnapshot {
            status,
            connectivity: ConnectivityState::Online,
            error: None,
        }
    }

    fn signed_in(role: Role) -> AuthSnapshot {
        let id = UserId::new("u1").unwrap();
        let now = Utc::now();
        snapshot(AuthStatus::Authenticated(Principal {
            id: id.clone(),
            verified_identity: IdentityClaims {
                principal_id: id,
                email: None,
                issued_at: now,
                expires_at: now + Duration::hours(1),
            },
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role,
            department: None,
            manager_id: None,
        }))
    }

    #[test]
    fn views_per_state() {
        let guard = ProtectedRoute::new("/login").require(Capability::CanProcessPayroll);

        assert_eq!(guard.evaluate(&snapshot(AuthStatus::Loading)), GuardView::Loading);
        assert_eq!(
            guard.evaluate(&snapshot(AuthStatus::Unauthenticated)),
            GuardView::Redirect { to: "/login".to_string() }
        );
        assert_eq!(
            guard.evaluate(&signed_in(Role::Employee)),
            GuardView::Denied { capability: Capability::CanProcessPayroll }
        );
        assert_eq!(guard.evaluate(&signed_in(Role::Admin)), GuardView::Render);
    }

    #[test]
    fn path_guard_uses_the_shared_route_table() {
        let table = RouteTable::default();
        let guard = ProtectedRoute::for_path(&table, "/payroll/process");
        assert_eq!(guard.required(), Some(Capability::CanProcessPayroll));
        assert_eq!(
            guard.evaluate(&snapshot(AuthStatus::Unauthenticated)),
            GuardView::Redirect { to: "/login?next=%2Fpayroll%2Fprocess".to_string() }
        );

        let open = ProtectedRoute::for_path(&table, "/dashboard");
        assert_eq!(open.evaluate(&signed_in(Role::Employee)), GuardView::Render);
    }

    #[test]
    fn observe_emits_one_terminal_view_per_resolution() {
        let mut guard = ProtectedRoute::new("/login");
        let states = [
            snapshot(AuthStatus::Loading),
            snapshot(AuthStatus::Loading),
            signed_in(Role::Manager),
            signed_in(Role::Manager),
        ];
        let emitted: Vec<GuardView> = states.iter().filter_map(|s| guard.observe(s)).collect();
        assert_eq!(emitted, vec![GuardView::Loading, GuardView::Render]);
    }

    #[test]
    fn connectivity_changes_do_not_re_render() {
        let mut guard = ProtectedRoute::new("/login");
        let mut state = signed_in(Role::Employee);
        assert_eq!(guard.observe(&state), Some(GuardView::Render));
        state.connectivity = ConnectivityState::Offline;
        assert_eq!(guard.observe(&state), None);
    }
}
