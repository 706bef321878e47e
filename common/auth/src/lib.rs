//! Client-side session core: token claims, role-gated route guard and the
//! request authenticator layer.

pub mod authenticator;
pub mod claims;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod notify;
pub mod roles;
pub mod routes;
pub mod transport;

pub use authenticator::{
    bearer_value, is_auth_rejection, Authenticator, AuthenticatorLayer,
    RejectionStatus,
};
pub use claims::{decode_claims, Claims};
pub use config::{
    DecodeConfig, GuardConfig, DEFAULT_LANDING, DEFAULT_PUBLIC_ENTRY, MAX_LEEWAY_SECONDS,
};
pub use error::{AuthError, AuthResult};
pub use guard::{Denial, GuardDecision, RouteGuard};
pub use navigation::{InMemoryNavigator, Navigator};
pub use notify::{
    LogNotifier, MemoryNotifier, Notification, NotificationKind, Notifier,
    GENERIC_ERROR_MESSAGE, UNAUTHORIZED_MESSAGE,
};
pub use roles::{Role, ROLE_ADMIN, ROLE_USER};
pub use routes::{normalize_path, Route, RouteAccess, RouteKind, RouteTable, RouteTableBuilder};
pub use transport::HttpTransport;
