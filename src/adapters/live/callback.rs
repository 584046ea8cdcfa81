//! Live [`CallbackClient`] over reqwest.

use std::time::Instant;

use reqwest::Client;
use tokio::runtime::Handle;

use super::{apply_headers, headers_from, parse_method, reason_phrase};
use crate::ports::callback::{
    CallbackClient, HttpRequest, HttpResponse, SendCallback, SendResult, TransportError,
};

/// Sends requests on a tokio runtime and reports through the callback.
#[derive(Debug, Clone)]
pub struct ReqwestCallbackClient {
    client: Client,
    handle: Handle,
}

impl ReqwestCallbackClient {
    /// Creates a client whose requests run on `handle`.
    #[must_use]
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    async fn execute(client: Client, request: HttpRequest) -> SendResult {
        let started = Instant::now();
        let method = parse_method(&request.method).map_err(TransportError)?;
        let mut builder = apply_headers(client.request(method, &request.url), &request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status();
        let headers = headers_from(response.headers());
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: reason_phrase(status),
            headers,
            body: body.to_vec(),
            url: Some(url),
            elapsed: started.elapsed(),
            error: None,
        })
    }
}

impl CallbackClient for ReqwestCallbackClient {
    fn send(&self, request: HttpRequest, on_done: SendCallback) {
        let client = self.client.clone();
        self.handle.spawn(async move {
            let result = Self::execute(client, request).await;
            on_done(result);
        });
    }
}
