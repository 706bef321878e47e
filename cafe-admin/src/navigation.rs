use std::sync::Arc;

use common_auth::{normalize_path, Navigator};
use common_token_store::KeyValueStorage;
use tracing::info;

/// Storage key holding the active route between runs.
pub const ROUTE_KEY: &str = "route";

/// Navigator that keeps the active route in client storage, so a later run
/// knows whether it is already on the public entry.
#[derive(Clone)]
pub struct StoredNavigator {
    storage: Arc<dyn KeyValueStorage>,
    fallback: String,
}

impl StoredNavigator {
    pub fn new(storage: Arc<dyn KeyValueStorage>, fallback: &str) -> Self {
        Self {
            storage,
            fallback: normalize_path(fallback),
        }
    }
}

impl Navigator for StoredNavigator {
    fn current_route(&self) -> String {
        self.storage
            .get(ROUTE_KEY)
            .map(|route| normalize_path(&route))
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn navigate(&self, route: &str) {
        let route = normalize_path(route);
        info!(from = %self.current_route(), to = %route, "navigating");
        self.storage.set(ROUTE_KEY, &route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_token_store::MemoryStorage;

    #[test]
    fn falls_back_until_first_navigation() {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = StoredNavigator::new(storage.clone(), "/");
        assert_eq!(navigator.current_route(), "/");

        navigator.navigate("/cafe/order/");
        assert_eq!(storage.get(ROUTE_KEY).as_deref(), Some("/cafe/order"));

        let next_run = StoredNavigator::new(storage, "/");
        assert_eq!(next_run.current_route(), "/cafe/order");
    }
}
