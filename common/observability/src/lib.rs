use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub type MetricsResult<T> = Result<T, prometheus::Error>;

/// Counters describing client session health: guard outcomes, upstream auth
/// rejections and forced logouts.
#[derive(Clone)]
pub struct SessionMetrics {
    pub registry: Registry,
    pub guard_decisions_total: IntCounterVec,
    pub auth_rejections_total: IntCounterVec,
    pub token_clears_total: IntCounterVec,
}

impl SessionMetrics {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();

        let guard_decisions_total = IntCounterVec::new(
            Opts::new(
                "route_guard_decisions_total",
                "Route guard evaluations grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(guard_decisions_total.clone()))?;

        let auth_rejections_total = IntCounterVec::new(
            Opts::new(
                "http_auth_rejections_total",
                "Upstream 401/403 responses seen by the request authenticator",
            ),
            &["status", "action"],
        )?;
        registry.register(Box::new(auth_rejections_total.clone()))?;

        let token_clears_total = IntCounterVec::new(
            Opts::new(
                "session_token_clears_total",
                "Stored bearer token removals grouped by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(token_clears_total.clone()))?;

        Ok(Self {
            registry,
            guard_decisions_total,
            auth_rejections_total,
            token_clears_total,
        })
    }

    pub fn guard_decision(&self, outcome: &str) {
        self.guard_decisions_total.with_label_values(&[outcome]).inc();
    }

    pub fn auth_rejection(&self, status: u16, action: &str) {
        self.auth_rejections_total
            .with_label_values(&[&status.to_string(), action])
            .inc();
    }

    pub fn token_cleared(&self, reason: &str) {
        self.token_clears_total.with_label_values(&[reason]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
