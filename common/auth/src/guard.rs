use std::sync::Arc;

use common_observability::SessionMetrics;
use common_token_store::TokenStore;
use tracing::{debug, warn};

use crate::claims::{decode_claims, Claims};
use crate::config::GuardConfig;
use crate::error::AuthError;
use crate::navigation::Navigator;
use crate::notify::{NotificationKind, Notifier, UNAUTHORIZED_MESSAGE};
use crate::roles::Role;
use crate::routes::RouteAccess;

/// Why a navigation attempt was refused.
#[derive(Debug)]
pub enum Denial {
    /// No token stored; the session is logged out.
    MissingToken,
    /// The stored token could not be read as claims.
    InvalidToken(AuthError),
    /// The token carries a role outside the recognized set.
    UnrecognizedRole(String),
    /// Valid session whose role is not allowed into the route.
    RoleNotAllowed { role: Role, allowed: Vec<Role> },
    /// Role matched but the presence re-check failed.
    NotAuthenticated,
}

impl Denial {
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::MissingToken => "missing_token",
            Denial::InvalidToken(_) => "invalid_token",
            Denial::UnrecognizedRole(_) => "unrecognized_role",
            Denial::RoleNotAllowed { .. } => "role_not_allowed",
            Denial::NotAuthenticated => "not_authenticated",
        }
    }

    /// Denials that end the session and send the user back to the public entry.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Denial::MissingToken | Denial::InvalidToken(_) | Denial::UnrecognizedRole(_)
        )
    }
}

#[derive(Debug)]
pub enum GuardDecision {
    Permitted(Claims),
    Denied(Denial),
}

impl GuardDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, GuardDecision::Permitted(_))
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            GuardDecision::Permitted(claims) => Some(claims),
            GuardDecision::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            GuardDecision::Permitted(_) => None,
            GuardDecision::Denied(denial) => Some(denial),
        }
    }
}

/// Gates navigation into protected routes using the role in the stored token.
///
/// Evaluation never fails: every problem becomes a [`Denial`] plus its side
/// effects (token removal, redirect, notification).
#[derive(Clone)]
pub struct RouteGuard {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    config: GuardConfig,
    metrics: Option<SessionMetrics>,
}

impl RouteGuard {
    pub fn new(
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        config: GuardConfig,
    ) -> Self {
        Self {
            store,
            navigator,
            notifier,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SessionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Presence check on the stored token, independent of its contents.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_present()
    }

    pub fn can_activate(&self, access: &RouteAccess) -> bool {
        self.evaluate(access).is_permitted()
    }

    pub fn evaluate(&self, access: &RouteAccess) -> GuardDecision {
        let Some(token) = self.store.get() else {
            return self.end_session(Denial::MissingToken);
        };

        let claims = match decode_claims(&token, &self.config.decode) {
            Ok(claims) => claims,
            Err(err) => return self.end_session(Denial::InvalidToken(err)),
        };

        let role = match claims.role() {
            Ok(role) => role,
            Err(_) => return self.end_session(Denial::UnrecognizedRole(claims.role.clone())),
        };

        if !access.permits(role) {
            return self.refuse(Denial::RoleNotAllowed {
                role,
                allowed: access.roles().to_vec(),
            });
        }

        if !self.is_authenticated() {
            return self.refuse(Denial::NotAuthenticated);
        }

        debug!(%role, "route access permitted");
        self.record("permitted");
        GuardDecision::Permitted(claims)
    }

    fn end_session(&self, denial: Denial) -> GuardDecision {
        warn!(reason = denial.reason(), detail = ?denial, "route access denied; ending session");
        self.store.clear();
        if let Some(metrics) = &self.metrics {
            metrics.token_cleared(denial.reason());
        }
        self.navigator.navigate(&self.config.public_entry);
        self.record(denial.reason());
        GuardDecision::Denied(denial)
    }

    fn refuse(&self, denial: Denial) -> GuardDecision {
        warn!(reason = denial.reason(), detail = ?denial, "route access denied");
        self.notifier
            .notify(UNAUTHORIZED_MESSAGE, NotificationKind::Error);
        self.navigator.navigate(&self.config.default_landing);
        self.record(denial.reason());
        GuardDecision::Denied(denial)
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.guard_decision(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeConfig;
    use crate::navigation::InMemoryNavigator;
    use crate::notify::MemoryNotifier;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    struct Harness {
        store: TokenStore,
        navigator: Arc<InMemoryNavigator>,
        notifier: Arc<MemoryNotifier>,
        metrics: SessionMetrics,
        guard: RouteGuard,
    }

    fn harness() -> Harness {
        let store = TokenStore::in_memory();
        let navigator = Arc::new(InMemoryNavigator::new("/cafe/dashboard"));
        let notifier = Arc::new(MemoryNotifier::new());
        let metrics = SessionMetrics::new().expect("metrics");
        let guard = RouteGuard::new(
            store.clone(),
            navigator.clone(),
            notifier.clone(),
            GuardConfig::default(),
        )
        .with_metrics(metrics.clone());
        Harness {
            store,
            navigator,
            notifier,
            metrics,
            guard,
        }
    }

    fn token_with_role(role: &str) -> String {
        let claims = json!({
            "sub": "staff@cafe.test",
            "role": role,
            "iat": Utc::now().timestamp(),
            "exp": Utc::now().timestamp() + 600,
        });
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"btechdays")).unwrap()
    }

    fn admin_only() -> RouteAccess {
        RouteAccess::new(["admin"]).unwrap()
    }

    fn staff() -> RouteAccess {
        RouteAccess::new(["user", "admin"]).unwrap()
    }

    #[test]
    fn permits_when_role_is_allowed() {
        let h = harness();
        for role in ["user", "admin"] {
            h.store.set(&token_with_role(role));
            let decision = h.guard.evaluate(&staff());
            assert!(decision.is_permitted(), "{role} should enter");
            assert_eq!(decision.claims().unwrap().role, role);
        }
        assert!(h.navigator.history().is_empty());
        assert!(h.notifier.notifications().is_empty());
        assert!(h.store.is_present());
    }

    #[test]
    fn membership_decides_for_every_role_and_route() {
        let routes = [
            RouteAccess::new(["admin"]).unwrap(),
            RouteAccess::new(["user"]).unwrap(),
            RouteAccess::new(["user", "admin"]).unwrap(),
        ];
        for access in &routes {
            for role in Role::ALL {
                let h = harness();
                h.store.set(&token_with_role(role.as_str()));
                assert_eq!(h.guard.can_activate(access), access.permits(role));
            }
        }
    }

    #[test]
    fn missing_token_goes_to_public_entry() {
        let h = harness();
        let decision = h.guard.evaluate(&staff());

        assert!(matches!(decision.denial(), Some(Denial::MissingToken)));
        assert_eq!(h.navigator.history(), vec!["/"]);
        assert!(h.notifier.notifications().is_empty());
    }

    #[test]
    fn undecodable_token_clears_storage_regardless_of_route() {
        for access in [admin_only(), staff()] {
            let h = harness();
            h.store.set("definitely.not.ajwt");

            let decision = h.guard.evaluate(&access);
            assert!(matches!(decision.denial(), Some(Denial::InvalidToken(_))));
            assert_eq!(h.store.get(), None);
            assert_eq!(h.navigator.history(), vec!["/"]);
            assert!(h.notifier.notifications().is_empty());
        }
    }

    #[test]
    fn expired_token_ends_session() {
        let h = harness();
        let claims = json!({ "role": "admin", "exp": Utc::now().timestamp() - 3600 });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap();
        h.store.set(&token);

        let decision = h.guard.evaluate(&admin_only());
        assert!(matches!(
            decision.denial(),
            Some(Denial::InvalidToken(AuthError::Expired))
        ));
        assert_eq!(h.store.get(), None);
    }

    #[test]
    fn oversized_leeway_does_not_break_evaluation() {
        let store = TokenStore::in_memory();
        let navigator = Arc::new(InMemoryNavigator::new("/cafe/dashboard"));
        let decode = DecodeConfig {
            leeway_seconds: u32::MAX,
            validate_expiry: true,
        };
        let guard = RouteGuard::new(
            store.clone(),
            navigator,
            Arc::new(MemoryNotifier::new()),
            GuardConfig::default().with_decode(decode),
        );
        let claims = json!({ "role": "admin", "exp": 4_000_000_000_i64 });
        store.set(&encode(&Header::default(), &claims, &EncodingKey::from_secret(b"k")).unwrap());

        assert!(guard.can_activate(&admin_only()));
        assert!(store.is_present());
    }

    #[test]
    fn unrecognized_role_ends_session() {
        let h = harness();
        h.store.set(&token_with_role("manager"));

        let decision = h.guard.evaluate(&staff());
        match decision.denial() {
            Some(Denial::UnrecognizedRole(role)) => assert_eq!(role, "manager"),
            other => panic!("unexpected decision: {other:?}"),
        }
        assert_eq!(h.store.get(), None);
        assert_eq!(h.navigator.history(), vec!["/"]);
        assert!(h.notifier.notifications().is_empty());
    }

    #[test]
    fn wrong_role_redirects_to_landing_and_notifies_once() {
        let h = harness();
        let token = token_with_role("user");
        h.store.set(&token);

        let decision = h.guard.evaluate(&admin_only());
        match decision.denial() {
            Some(Denial::RoleNotAllowed { role, allowed }) => {
                assert_eq!(*role, Role::User);
                assert_eq!(allowed, &vec![Role::Admin]);
            }
            other => panic!("unexpected decision: {other:?}"),
        }

        assert_eq!(h.navigator.history(), vec!["/cafe/dashboard"]);
        let notes = h.notifier.notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, UNAUTHORIZED_MESSAGE);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(h.store.get().as_deref(), Some(token.as_str()));
    }

    #[test]
    fn metrics_track_outcomes() {
        let h = harness();
        h.guard.evaluate(&staff());
        h.store.set(&token_with_role("user"));
        h.guard.evaluate(&staff());
        h.guard.evaluate(&admin_only());

        let decisions = &h.metrics.guard_decisions_total;
        assert_eq!(decisions.with_label_values(&["missing_token"]).get(), 1);
        assert_eq!(decisions.with_label_values(&["permitted"]).get(), 1);
        assert_eq!(decisions.with_label_values(&["role_not_allowed"]).get(), 1);
        assert_eq!(
            h.metrics
                .token_clears_total
                .with_label_values(&["missing_token"])
                .get(),
            1
        );
    }

    #[test]
    fn denial_classification() {
        assert!(Denial::MissingToken.ends_session());
        assert!(Denial::UnrecognizedRole("x".into()).ends_session());
        assert!(!Denial::NotAuthenticated.ends_session());
        assert!(!Denial::RoleNotAllowed {
            role: Role::User,
            allowed: vec![Role::Admin]
        }
        .ends_session());
    }
}
