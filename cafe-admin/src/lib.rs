pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod navigation;
pub mod routes;
pub mod validation;

pub use app::{AdminApp, Visit};
pub use catalog::{Bill, Category, DashboardDetails, PageData, Product};
pub use client::{
    CafeClient, ChangePasswordRequest, ClientError, ClientResult, LoginRequest, SignupRequest,
};
pub use config::AdminConfig;
pub use navigation::{StoredNavigator, ROUTE_KEY};
pub use routes::cafe_routes;
pub use validation::InputError;
