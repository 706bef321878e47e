use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use common_auth::{
    decode_claims, AuthResult, AuthenticatorLayer, Claims, Denial, GuardDecision, HttpTransport,
    Navigator, NotificationKind, Notifier, Role, RouteGuard, RouteKind, RouteTable,
};
use common_observability::SessionMetrics;
use common_token_store::{KeyValueStorage, TokenStore};
use tower::Layer;
use tracing::info;

use crate::catalog::{Bill, PageData};
use crate::client::{CafeClient, ChangePasswordRequest, ClientResult, LoginRequest, SignupRequest};
use crate::config::AdminConfig;
use crate::navigation::StoredNavigator;
use crate::routes::{self, cafe_routes};

/// Result of trying to open a route.
#[derive(Debug)]
pub enum Visit {
    Entered { path: String, role: Option<Role> },
    Denied { path: String, denial: Denial, redirected_to: String },
}

impl Visit {
    pub fn is_entered(&self) -> bool {
        matches!(self, Visit::Entered { .. })
    }
}

/// Top-level wiring: one token store shared by the guard and the API client.
pub struct AdminApp {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    routes: RouteTable,
    guard: RouteGuard,
    client: CafeClient,
    metrics: SessionMetrics,
}

impl AdminApp {
    pub fn new(
        config: AdminConfig,
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let routes = cafe_routes(config.guard.clone()).context("invalid route table")?;
        let metrics = SessionMetrics::new().context("failed to register session metrics")?;

        let store = TokenStore::new(storage.clone());
        let navigator: Arc<dyn Navigator> =
            Arc::new(StoredNavigator::new(storage, routes.public_entry()));

        let guard = RouteGuard::new(
            store.clone(),
            navigator.clone(),
            notifier.clone(),
            routes.config().clone(),
        )
        .with_metrics(metrics.clone());

        let transport = HttpTransport::with_timeout(Duration::from_secs(config.http_timeout_secs))
            .context("failed to build HTTP client")?;
        let authenticator = AuthenticatorLayer::with_metrics(
            store.clone(),
            navigator.clone(),
            routes.public_entry(),
            metrics.clone(),
        );
        let client = CafeClient::new(config.api_url, authenticator.layer(transport));

        Ok(Self {
            store,
            navigator,
            notifier,
            routes,
            guard,
            client,
            metrics,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    pub fn current_route(&self) -> String {
        self.navigator.current_route()
    }

    /// Opens `path`, consulting the guard for protected routes.
    pub fn visit(&self, path: &str) -> Visit {
        let route = self.routes.resolve(path);
        let access = match &route.kind {
            RouteKind::Protected(access) => access,
            RouteKind::Public | RouteKind::Redirect(_) => {
                self.navigator.navigate(&route.path);
                return Visit::Entered {
                    path: route.path.clone(),
                    role: None,
                };
            }
        };

        match self.guard.evaluate(access) {
            GuardDecision::Permitted(claims) => {
                self.navigator.navigate(&route.path);
                Visit::Entered {
                    path: route.path.clone(),
                    role: claims.role().ok(),
                }
            }
            GuardDecision::Denied(denial) => Visit::Denied {
                path: route.path.clone(),
                denial,
                redirected_to: self.navigator.current_route(),
            },
        }
    }

    /// Opens `path` and, once inside, fetches the data that page shows.
    ///
    /// Fetch failures are reported through the notifier. A 401 or 403 also ends
    /// the session through the request authenticator.
    pub async fn open(&self, path: &str) -> ClientResult<(Visit, Option<PageData>)> {
        let visit = self.visit(path);
        let data = match &visit {
            Visit::Entered { path, .. } => self.load(path).await?,
            Visit::Denied { .. } => None,
        };
        Ok((visit, data))
    }

    async fn load(&self, path: &str) -> ClientResult<Option<PageData>> {
        let data = match path {
            routes::DASHBOARD => self
                .client
                .dashboard_details()
                .await
                .map(PageData::Dashboard),
            routes::CATEGORY | routes::ORDER => {
                self.client.categories().await.map(PageData::Categories)
            }
            routes::PRODUCT => self.client.products().await.map(PageData::Products),
            _ => return Ok(None),
        };
        self.notify_failure(data).map(Some)
    }

    pub async fn bills(&self) -> ClientResult<Vec<Bill>> {
        self.notify_failure(self.client.bills().await)
    }

    /// Logs in, stores the token and opens the default landing route.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Visit> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token = self.notify_failure(self.client.login(&request).await)?;

        self.store.set(&token);
        info!(email, "logged in");
        Ok(self.visit(self.routes.default_landing()))
    }

    pub fn logout(&self) {
        self.store.clear();
        self.metrics.token_cleared("logout");
        self.navigator.navigate(self.routes.public_entry());
        info!("logged out");
    }

    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<String> {
        self.report(self.client.signup(request).await)
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        self.report(self.client.forgot_password(email).await)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<String> {
        self.report(self.client.change_password(request).await)
    }

    pub async fn check_token(&self) -> ClientResult<String> {
        self.notify_failure(self.client.check_token().await)
    }

    /// Claims of the stored token, if any. Not verified.
    pub fn current_claims(&self) -> AuthResult<Option<Claims>> {
        self.store
            .get()
            .map(|token| decode_claims(&token, &self.routes.config().decode))
            .transpose()
    }

    fn notify_failure<T>(&self, outcome: ClientResult<T>) -> ClientResult<T> {
        outcome.inspect_err(|err| {
            self.notifier
                .notify(&err.user_message(), NotificationKind::Error);
        })
    }

    fn report(&self, outcome: ClientResult<String>) -> ClientResult<String> {
        match &outcome {
            Ok(message) => self.notifier.notify(message, NotificationKind::Success),
            Err(err) => self
                .notifier
                .notify(&err.user_message(), NotificationKind::Error),
        }
        outcome
    }
}
