use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use common_observability::SessionMetrics;
use common_token_store::TokenStore;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Request, Response, StatusCode};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::navigation::Navigator;
use crate::routes::normalize_path;

/// Exposes the HTTP status carried by a failed request, if any.
pub trait RejectionStatus {
    fn rejection_status(&self) -> Option<StatusCode>;
}

impl RejectionStatus for reqwest::Error {
    fn rejection_status(&self) -> Option<StatusCode> {
        self.status()
    }
}

impl RejectionStatus for StatusCode {
    fn rejection_status(&self) -> Option<StatusCode> {
        Some(*self)
    }
}

impl RejectionStatus for Infallible {
    fn rejection_status(&self) -> Option<StatusCode> {
        match *self {}
    }
}

impl RejectionStatus for tower::BoxError {
    fn rejection_status(&self) -> Option<StatusCode> {
        self.downcast_ref::<reqwest::Error>()
            .and_then(reqwest::Error::status)
    }
}

pub fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// `Authorization` header value for a bearer token.
pub fn bearer_value(token: &str) -> AuthResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| AuthError::InvalidAuthorization)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Shared policy behind every [`Authenticator`] produced by one layer.
struct Policy {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    public_entry: String,
    metrics: Option<SessionMetrics>,
}

impl Policy {
    fn authorize<B>(&self, request: &mut Request<B>) {
        let Some(token) = self.store.get().filter(|token| !token.is_empty()) else {
            return;
        };

        match bearer_value(&token) {
            Ok(value) => {
                request.headers_mut().insert(AUTHORIZATION, value);
                debug!(uri = %request.uri(), "attached bearer token");
            }
            Err(err) => {
                warn!(error = %err, uri = %request.uri(), "stored token is not a valid header value; sending request without it");
            }
        }
    }

    fn on_rejection(&self, status: StatusCode) {
        let current = normalize_path(&self.navigator.current_route());
        if current == self.public_entry {
            debug!(%status, "auth rejection at public entry; leaving session untouched");
            self.record(status, "ignored");
            return;
        }

        warn!(%status, route = %current, "upstream rejected credentials; ending session");
        self.store.clear();
        if let Some(metrics) = &self.metrics {
            metrics.token_cleared("upstream_rejection");
        }
        self.navigator.navigate(&self.public_entry);
        self.record(status, "logout");
    }

    fn record(&self, status: StatusCode, action: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.auth_rejection(status.as_u16(), action);
        }
    }
}

/// Layer that attaches the stored bearer token to outgoing requests and ends the
/// session when the upstream answers 401 or 403.
#[derive(Clone)]
pub struct AuthenticatorLayer {
    policy: Arc<Policy>,
}

impl AuthenticatorLayer {
    pub fn new(
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
        public_entry: impl AsRef<str>,
    ) -> Self {
        Self::build(store, navigator, public_entry.as_ref(), None)
    }

    pub fn with_metrics(
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
        public_entry: impl AsRef<str>,
        metrics: SessionMetrics,
    ) -> Self {
        Self::build(store, navigator, public_entry.as_ref(), Some(metrics))
    }

    fn build(
        store: TokenStore,
        navigator: Arc<dyn Navigator>,
        public_entry: &str,
        metrics: Option<SessionMetrics>,
    ) -> Self {
        Self {
            policy: Arc::new(Policy {
                store,
                navigator,
                public_entry: normalize_path(public_entry),
                metrics,
            }),
        }
    }
}

impl<S> Layer<S> for AuthenticatorLayer {
    type Service = Authenticator<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authenticator {
            inner,
            policy: self.policy.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Authenticator<S> {
    inner: S,
    policy: Arc<Policy>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Authenticator<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: RejectionStatus + Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        self.policy.authorize(&mut request);
        let future = self.inner.call(request);
        let policy = self.policy.clone();

        Box::pin(async move {
            let outcome = future.await;
            let status = match &outcome {
                Ok(response) => Some(response.status()),
                Err(err) => err.rejection_status(),
            };
            if let Some(status) = status.filter(|status| is_auth_rejection(*status)) {
                policy.on_rejection(status);
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::InMemoryNavigator;
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    struct Harness {
        store: TokenStore,
        navigator: Arc<InMemoryNavigator>,
        metrics: SessionMetrics,
        layer: AuthenticatorLayer,
    }

    fn harness(current_route: &str) -> Harness {
        let store = TokenStore::in_memory();
        let navigator = Arc::new(InMemoryNavigator::new(current_route));
        let metrics = SessionMetrics::new().expect("metrics");
        let layer =
            AuthenticatorLayer::with_metrics(store.clone(), navigator.clone(), "/", metrics.clone());
        Harness {
            store,
            navigator,
            metrics,
            layer,
        }
    }

    /// Echoes the received authorization header back in the body.
    async fn echo(request: Request<()>) -> Result<Response<Option<String>>, StatusCode> {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap().to_string());
        Ok(Response::new(header))
    }

    async fn respond_with(status: StatusCode) -> Result<Response<()>, StatusCode> {
        let mut response = Response::new(());
        *response.status_mut() = status;
        Ok(response)
    }

    fn request() -> Request<()> {
        Request::builder()
            .uri("http://api.test/user/checkToken")
            .body(())
            .unwrap()
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let h = harness("/cafe/dashboard");
        h.store.set("abc.def.ghi");

        let service = ServiceBuilder::new().layer(h.layer.clone()).service(service_fn(echo));
        let response = service.oneshot(request()).await.unwrap();
        assert_eq!(response.into_body().as_deref(), Some("Bearer abc.def.ghi"));
    }

    #[tokio::test]
    async fn leaves_request_alone_without_token() {
        let h = harness("/cafe/dashboard");
        let service = h.layer.layer(service_fn(echo));
        let response = service.oneshot(request()).await.unwrap();
        assert_eq!(response.into_body(), None);

        h.store.set("");
        let service = h.layer.layer(service_fn(echo));
        let response = service.oneshot(request()).await.unwrap();
        assert_eq!(response.into_body(), None);
    }

    #[tokio::test]
    async fn overrides_caller_supplied_authorization() {
        let h = harness("/cafe/dashboard");
        h.store.set("stored");
        let mut req = request();
        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer stale"));

        let response = h.layer.layer(service_fn(echo)).oneshot(req).await.unwrap();
        assert_eq!(response.into_body().as_deref(), Some("Bearer stored"));
    }

    #[tokio::test]
    async fn unauthorized_response_ends_session_once() {
        let h = harness("/cafe/order");
        h.store.set("abc.def.ghi");

        let service = h
            .layer
            .layer(service_fn(|_req: Request<()>| respond_with(StatusCode::UNAUTHORIZED)));
        let response = service.oneshot(request()).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(h.store.get(), None);
        assert_eq!(h.navigator.history(), vec!["/"]);
        assert_eq!(
            h.metrics
                .auth_rejections_total
                .with_label_values(&["401", "logout"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn rejection_at_public_entry_changes_nothing() {
        let h = harness("/");
        h.store.set("abc.def.ghi");

        let service = h
            .layer
            .layer(service_fn(|_req: Request<()>| respond_with(StatusCode::UNAUTHORIZED)));
        service.oneshot(request()).await.unwrap();

        assert_eq!(h.store.get().as_deref(), Some("abc.def.ghi"));
        assert!(h.navigator.history().is_empty());
        assert_eq!(
            h.metrics
                .auth_rejections_total
                .with_label_values(&["401", "ignored"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn forbidden_error_is_propagated_after_logout() {
        let h = harness("/cafe/product");
        h.store.set("abc.def.ghi");

        let service = h.layer.layer(service_fn(|_req: Request<()>| async {
            Err::<Response<()>, _>(StatusCode::FORBIDDEN)
        }));
        let err = service.oneshot(request()).await.expect_err("error propagates");

        assert_eq!(err, StatusCode::FORBIDDEN);
        assert_eq!(h.store.get(), None);
        assert_eq!(h.navigator.history(), vec!["/"]);
    }

    #[tokio::test]
    async fn other_failures_pass_through() {
        let h = harness("/cafe/product");
        h.store.set("abc.def.ghi");

        for status in [
            StatusCode::OK,
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            let service = h
                .layer
                .layer(service_fn(move |_req: Request<()>| respond_with(status)));
            let response = service.oneshot(request()).await.unwrap();
            assert_eq!(response.status(), status);
        }

        let failing = h.layer.layer(service_fn(|_req: Request<()>| async {
            Err::<Response<()>, _>(StatusCode::BAD_GATEWAY)
        }));
        assert_eq!(
            failing.oneshot(request()).await.unwrap_err(),
            StatusCode::BAD_GATEWAY
        );

        assert_eq!(h.store.get().as_deref(), Some("abc.def.ghi"));
        assert!(h.navigator.history().is_empty());
    }

    #[test]
    fn boxed_errors_without_status_are_not_rejections() {
        let other: tower::BoxError = "timeout".into();
        assert_eq!(other.rejection_status(), None);
    }

    #[test]
    fn bearer_value_rejects_control_characters() {
        assert!(matches!(
            bearer_value("line\nbreak"),
            Err(AuthError::InvalidAuthorization)
        ));
        assert!(bearer_value("abc").unwrap().is_sensitive());
    }
}
