//! Live [`FetchClient`] over reqwest.

use std::time::Instant;

use reqwest::Client;
use tokio::runtime::Handle;

use super::{apply_headers, headers_from, parse_method, reason_phrase};
use crate::canonical::Headers;
use crate::ports::fetch::{
    FetchClient, FetchError, FetchRequest, FetchResponse, KeyCallback, KeyResponse,
};
use crate::splice::{INTERCEPT_FAILURE_REASON, INTERCEPT_FAILURE_STATUS};

/// Runs each fetch on a tokio runtime, then hands the caller the key.
///
/// Header and streaming callbacks are honored: header lines are reported
/// as they are read and a streamed body is not buffered into the response.
#[derive(Debug, Clone)]
pub struct ReqwestFetchClient {
    client: Client,
    handle: Handle,
}

impl ReqwestFetchClient {
    /// Creates a client whose fetches run on `handle`.
    #[must_use]
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }

    async fn execute(client: Client, request: FetchRequest) -> FetchResponse {
        let started = Instant::now();
        let headers = request.effective_headers();
        let FetchRequest {
            method,
            url,
            body,
            body_producer,
            mut header_callback,
            mut streaming_callback,
            ..
        } = request;

        let transport_failure = |reason: String| FetchResponse {
            code: INTERCEPT_FAILURE_STATUS,
            reason: INTERCEPT_FAILURE_REASON.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
            effective_url: Some(url.clone()),
            request_time: started.elapsed(),
            error: Some(FetchError::Transport(reason)),
        };

        let method = match parse_method(&method) {
            Ok(method) => method,
            Err(reason) => return transport_failure(reason),
        };
        let mut builder = apply_headers(client.request(method, &url), &headers);
        if let Some(producer) = body_producer {
            let mut bytes = Vec::new();
            producer(&mut |chunk: &[u8]| bytes.extend_from_slice(chunk));
            builder = builder.body(bytes);
        } else if let Some(body) = body {
            builder = builder.body(body);
        }

        let mut response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return transport_failure(err.to_string()),
        };
        let status = response.status();
        let headers = headers_from(response.headers());
        if let Some(on_header) = header_callback.as_mut() {
            on_header(&format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason_phrase(status)));
            for (name, value) in headers.pairs() {
                on_header(&format!("{name}: {value}\r\n"));
            }
            on_header("\r\n");
        }
        let effective_url = response.url().to_string();

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => match streaming_callback.as_mut() {
                    Some(on_chunk) => on_chunk(&chunk),
                    None => body.extend_from_slice(&chunk),
                },
                Ok(None) => break,
                Err(err) => return transport_failure(err.to_string()),
            }
        }

        let code = status.as_u16();
        FetchResponse {
            code,
            reason: reason_phrase(status),
            headers,
            body,
            effective_url: Some(effective_url),
            request_time: started.elapsed(),
            error: (!status.is_success()).then_some(FetchError::Http(code)),
        }
    }
}

impl FetchClient for ReqwestFetchClient {
    fn fetch(&self, request: FetchRequest, on_key: KeyCallback) {
        let client = self.client.clone();
        self.handle.spawn(async move {
            let response = Self::execute(client, request).await;
            on_key(KeyResponse::new(move |on_response| on_response(response)));
        });
    }
}
