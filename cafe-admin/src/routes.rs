use common_auth::{AuthResult, GuardConfig, RouteTable, ROLE_ADMIN, ROLE_USER};

pub const HOME: &str = "/";
pub const CAFE: &str = "/cafe";
pub const DASHBOARD: &str = "/cafe/dashboard";
pub const CATEGORY: &str = "/cafe/category";
pub const PRODUCT: &str = "/cafe/product";
pub const ORDER: &str = "/cafe/order";

/// The admin console's navigation map.
pub fn cafe_routes(config: GuardConfig) -> AuthResult<RouteTable> {
    RouteTable::builder(config)
        .public(HOME)
        .redirect(CAFE, DASHBOARD)
        .protected(DASHBOARD, [ROLE_USER, ROLE_ADMIN])
        .protected(CATEGORY, [ROLE_ADMIN])
        .protected(PRODUCT, [ROLE_ADMIN])
        .protected(ORDER, [ROLE_ADMIN, ROLE_USER])
        .build()
}
