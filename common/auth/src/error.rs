use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token has expired")]
    Expired,
    #[error("token is missing the '{0}' claim")]
    MissingClaim(&'static str),
    #[error("invalid claim '{0}' with value '{1}'")]
    InvalidClaim(&'static str, String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("unrecognized role '{0}'")]
    UnknownRole(String),
    #[error("route must allow at least one role")]
    EmptyRouteRoles,
    #[error("route path '{0}' must start with '/'")]
    InvalidRoutePath(String),
    #[error("route '{0}' is declared more than once")]
    DuplicateRoute(String),
    #[error("route '{path}' redirects to undeclared route '{target}'")]
    UnknownRedirectTarget { path: String, target: String },
    #[error("route '{0}' must be declared as {1}")]
    MisplacedRoute(String, &'static str),
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("failed to build HTTP transport: {0}")]
    Transport(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::Json(err) => Self::InvalidJson(err.to_string()),
            _ => Self::MalformedToken(value.to_string()),
        }
    }
}
