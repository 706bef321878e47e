use std::sync::Mutex;

use tracing::info;

use crate::routes::normalize_path;

/// Capability to read and change the active route.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn navigate(&self, route: &str);
}

#[derive(Debug)]
struct NavigationState {
    current: String,
    history: Vec<String>,
}

/// Navigator keeping the active route in process memory.
///
/// `history` records every navigation in order, which is what tests assert on.
#[derive(Debug)]
pub struct InMemoryNavigator {
    state: Mutex<NavigationState>,
}

impl InMemoryNavigator {
    pub fn new(initial: &str) -> Self {
        Self {
            state: Mutex::new(NavigationState {
                current: normalize_path(initial),
                history: Vec::new(),
            }),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.state.lock().expect("mutex poisoned").history.clone()
    }
}

impl Default for InMemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for InMemoryNavigator {
    fn current_route(&self) -> String {
        self.state.lock().expect("mutex poisoned").current.clone()
    }

    fn navigate(&self, route: &str) {
        let route = normalize_path(route);
        let mut state = self.state.lock().expect("mutex poisoned");
        info!(from = %state.current, to = %route, "navigating");
        state.current = route.clone();
        state.history.push(route);
    }
}
