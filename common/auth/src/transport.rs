use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use reqwest::Client;
use tower::Service;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// `reqwest`-backed transport exposed as a tower service over buffered bodies.
///
/// Non-success statuses come back as `Ok` responses so layers above can inspect them.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Service<Request<Bytes>> for HttpTransport {
    type Response = Response<Bytes>;
    type Error = reqwest::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = self.client.clone();
        Box::pin(async move {
            let request = reqwest::Request::try_from(request)?;
            let method = request.method().clone();
            let url = request.url().to_string();

            let response = client.execute(request).await?;
            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            debug!(%method, %url, %status, bytes = body.len(), "HTTP exchange completed");

            let mut converted = Response::new(body);
            *converted.status_mut() = status;
            *converted.version_mut() = version;
            *converted.headers_mut() = headers;
            Ok(converted)
        })
    }
}
