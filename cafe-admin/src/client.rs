use bytes::Bytes;
use common_auth::{is_auth_rejection, Authenticator, HttpTransport, GENERIC_ERROR_MESSAGE};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower::ServiceExt;
use tracing::debug;

use crate::catalog::{Bill, Category, DashboardDetails, Product};
use crate::validation::{self, InputError};

pub type ApiService = Authenticator<HttpTransport>;
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered {status}")]
    Status {
        path: String,
        status: StatusCode,
        message: Option<String>,
    },
    #[error("unexpected response body from {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("failed to build request for {path}: {reason}")]
    Request { path: String, reason: String },
    #[error(transparent)]
    Input(#[from] InputError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_auth_rejection(&self) -> bool {
        self.status().is_some_and(is_auth_rejection)
    }

    /// Text shown to the user: the server's message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Input(err) => err.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// Café REST API client. Every call goes through the request authenticator.
#[derive(Clone)]
pub struct CafeClient {
    base_url: String,
    service: ApiService,
}

impl CafeClient {
    pub fn new(base_url: impl Into<String>, service: ApiService) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service,
        }
    }

    /// Exchanges credentials for a bearer token.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<String> {
        validation::email(&request.email)?;
        validation::required("password", &request.password)?;
        let path = "/user/login";
        let response = self.send(Method::POST, path, Some(request)).await?;
        let body: LoginResponse = decode_json(path, response)?;
        if body.token.trim().is_empty() {
            return Err(ClientError::Decode {
                path: path.to_string(),
                reason: "login response carried an empty token".to_string(),
            });
        }
        Ok(body.token)
    }

    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<String> {
        validation::name(&request.name)?;
        validation::email(&request.email)?;
        validation::contact_number(&request.contact_number)?;
        validation::required("password", &request.password)?;
        let path = "/user/signup";
        let response = self.send(Method::POST, path, Some(request)).await?;
        decode_message(path, response)
    }

    pub async fn forgot_password(&self, email: &str) -> ClientResult<String> {
        validation::email(email)?;
        let path = "/user/forgotPassword";
        let response = self
            .send(Method::POST, path, Some(&ForgotPasswordRequest { email }))
            .await?;
        decode_message(path, response)
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ClientResult<String> {
        let path = "/user/changePassword";
        let response = self.send(Method::POST, path, Some(request)).await?;
        decode_message(path, response)
    }

    /// Asks the backend whether the stored token is still accepted.
    pub async fn check_token(&self) -> ClientResult<String> {
        let path = "/user/checkToken";
        let response = self.send::<()>(Method::GET, path, None).await?;
        decode_message(path, response)
    }

    pub async fn dashboard_details(&self) -> ClientResult<DashboardDetails> {
        self.get_json("/dashboard/details").await
    }

    pub async fn categories(&self) -> ClientResult<Vec<Category>> {
        self.get_json("/category/get").await
    }

    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        self.get_json("/product/get").await
    }

    pub async fn bills(&self) -> ClientResult<Vec<Bill>> {
        self.get_json("/bill/getBills").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        decode_json(path, response)
    }

    async fn send<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> ClientResult<Response<Bytes>> {
        let payload = match body {
            Some(body) => Bytes::from(serde_json::to_vec(body).map_err(|err| {
                ClientError::Request {
                    path: path.to_string(),
                    reason: err.to_string(),
                }
            })?),
            None => Bytes::new(),
        };

        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder.body(payload).map_err(|err| ClientError::Request {
            path: path.to_string(),
            reason: err.to_string(),
        })?;

        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .map_err(|source| ClientError::Transport {
                path: path.to_string(),
                source,
            })?;

        debug!(path, status = %response.status(), "café API responded");
        if !response.status().is_success() {
            return Err(ClientError::Status {
                path: path.to_string(),
                status: response.status(),
                message: server_message(response.body()),
            });
        }
        Ok(response)
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<MessageBody>(body)
        .ok()
        .map(|body| body.message)
}

fn decode_json<T: DeserializeOwned>(path: &str, response: Response<Bytes>) -> ClientResult<T> {
    serde_json::from_slice(response.body()).map_err(|err| ClientError::Decode {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Reads `{"message": ...}` bodies, falling back to the raw text.
fn decode_message(path: &str, response: Response<Bytes>) -> ClientResult<String> {
    if let Some(message) = server_message(response.body()) {
        return Ok(message);
    }
    String::from_utf8(response.into_body().to_vec()).map_err(|err| ClientError::Decode {
        path: path.to_string(),
        reason: err.to_string(),
    })
}
