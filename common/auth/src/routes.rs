use std::collections::HashSet;

use crate::config::GuardConfig;
use crate::error::{AuthError, AuthResult};
use crate::roles::Role;

/// Ordered, duplicate-free set of roles allowed into a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAccess {
    roles: Vec<Role>,
}

impl RouteAccess {
    /// Parses role tags, keeping first-seen order. Unknown tags and empty sets are rejected.
    pub fn new<I, S>(roles: I) -> AuthResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = roles
            .into_iter()
            .map(|role| role.as_ref().parse::<Role>())
            .collect::<AuthResult<Vec<_>>>()?;
        Self::from_roles(parsed)
    }

    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> AuthResult<Self> {
        let mut seen = HashSet::new();
        let roles: Vec<Role> = roles.into_iter().filter(|role| seen.insert(*role)).collect();
        if roles.is_empty() {
            return Err(AuthError::EmptyRouteRoles);
        }
        Ok(Self { roles })
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    Protected(RouteAccess),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub kind: RouteKind,
}

impl Route {
    pub fn access(&self) -> Option<&RouteAccess> {
        match &self.kind {
            RouteKind::Protected(access) => Some(access),
            _ => None,
        }
    }
}

/// Normalizes a navigation target: trims whitespace, drops query and fragment,
/// and strips trailing slashes except on the root.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Route table validated once at construction.
#[derive(Debug, Clone)]
pub struct RouteTable {
    config: GuardConfig,
    routes: Vec<Route>,
    entry: usize,
}

impl RouteTable {
    pub fn builder(config: GuardConfig) -> RouteTableBuilder {
        RouteTableBuilder::new(config)
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn public_entry(&self) -> &str {
        &self.config.public_entry
    }

    pub fn default_landing(&self) -> &str {
        &self.config.default_landing
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, path: &str) -> Option<&Route> {
        let path = normalize_path(path);
        self.routes.iter().find(|route| route.path == path)
    }

    /// Follows redirects to the route that would render. Unknown paths land on
    /// the public entry.
    pub fn resolve(&self, path: &str) -> &Route {
        let mut current = self.get(path);
        // Targets are validated at build time; the hop limit only guards cycles.
        for _ in 0..self.routes.len() {
            match current {
                Some(Route {
                    kind: RouteKind::Redirect(target),
                    ..
                }) => current = self.get(target),
                Some(route) => return route,
                None => break,
            }
        }
        &self.routes[self.entry]
    }
}

pub struct RouteTableBuilder {
    config: GuardConfig,
    routes: Vec<Route>,
    error: Option<AuthError>,
}

impl RouteTableBuilder {
    fn new(mut config: GuardConfig) -> Self {
        config.public_entry = normalize_path(&config.public_entry);
        config.default_landing = normalize_path(&config.default_landing);
        Self {
            config,
            routes: Vec::new(),
            error: None,
        }
    }

    pub fn public(self, path: &str) -> Self {
        self.push(path, Ok(RouteKind::Public))
    }

    pub fn protected<I, S>(self, path: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kind = RouteAccess::new(roles).map(RouteKind::Protected);
        self.push(path, kind)
    }

    pub fn redirect(self, path: &str, target: &str) -> Self {
        self.push(path, Ok(RouteKind::Redirect(normalize_path(target))))
    }

    fn push(mut self, path: &str, kind: AuthResult<RouteKind>) -> Self {
        if self.error.is_some() {
            return self;
        }

        if !path.trim().starts_with('/') {
            self.error = Some(AuthError::InvalidRoutePath(path.to_string()));
            return self;
        }

        let path = normalize_path(path);
        if self.routes.iter().any(|route| route.path == path) {
            self.error = Some(AuthError::DuplicateRoute(path));
            return self;
        }

        match kind {
            Ok(kind) => self.routes.push(Route { path, kind }),
            Err(err) => self.error = Some(err),
        }
        self
    }

    pub fn build(self) -> AuthResult<RouteTable> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let find = |path: &str| self.routes.iter().find(|route| route.path == path);

        let entry = self
            .routes
            .iter()
            .position(|route| {
                route.path == self.config.public_entry && route.kind == RouteKind::Public
            })
            .ok_or_else(|| {
                AuthError::MisplacedRoute(self.config.public_entry.clone(), "a public route")
            })?;

        match find(&self.config.default_landing) {
            Some(Route {
                kind: RouteKind::Protected(_),
                ..
            }) => {}
            _ => {
                return Err(AuthError::MisplacedRoute(
                    self.config.default_landing.clone(),
                    "a protected route",
                ))
            }
        }

        for route in &self.routes {
            if let RouteKind::Redirect(target) = &route.kind {
                if find(target).is_none() {
                    return Err(AuthError::UnknownRedirectTarget {
                        path: route.path.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(RouteTable {
            config: self.config,
            routes: self.routes,
            entry,
        })
    }
}
