//! Live [`Agent`] over reqwest.

use reqwest::{Client, Response};
use tokio::runtime::Handle;

use super::{apply_headers, headers_from, parse_method, reason_phrase};
use crate::canonical::Headers;
use crate::ports::agent::{
    Agent, AgentBody, AgentError, AgentResponse, BodyEnd, BodyProtocol, BodySource, Deferred,
};

/// Issues requests through reqwest; bodies are streamed chunk by chunk.
#[derive(Debug, Clone)]
pub struct ReqwestAgent {
    client: Client,
    handle: Handle,
}

impl ReqwestAgent {
    /// Creates an agent whose body deliveries run on `handle`.
    #[must_use]
    pub fn new(client: Client, handle: Handle) -> Self {
        Self { client, handle }
    }
}

impl Agent for ReqwestAgent {
    fn request(
        &self,
        method: &str,
        uri: &str,
        headers: Option<Headers>,
        body: Option<AgentBody>,
    ) -> Deferred<AgentResponse> {
        let method = match parse_method(method) {
            Ok(method) => method,
            Err(reason) => return Deferred::fail(AgentError::Transport(reason)),
        };
        let mut builder = self.client.request(method, uri);
        if let Some(headers) = &headers {
            builder = apply_headers(builder, headers);
        }
        match body {
            Some(AgentBody::Bytes(bytes)) => builder = builder.body(bytes),
            Some(AgentBody::Producer(producer)) => {
                let mut bytes = Vec::new();
                producer.produce(&mut |chunk: &[u8]| bytes.extend_from_slice(chunk));
                builder = builder.body(bytes);
            }
            None => {}
        }
        let handle = self.handle.clone();
        Deferred::new(async move {
            let response =
                builder.send().await.map_err(|e| AgentError::Transport(e.to_string()))?;
            let status = response.status();
            let headers = headers_from(response.headers());
            Ok(AgentResponse::new(
                status.as_u16(),
                reason_phrase(status),
                headers,
                StreamedBody { response, handle },
            ))
        })
    }
}

/// Pushes a live response body into a protocol as chunks arrive.
struct StreamedBody {
    response: Response,
    handle: Handle,
}

impl BodySource for StreamedBody {
    fn deliver(self: Box<Self>, mut protocol: Box<dyn BodyProtocol>) {
        let Self { mut response, handle } = *self;
        handle.spawn(async move {
            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) => protocol.data_received(&chunk),
                    Ok(None) => {
                        protocol.connection_lost(BodyEnd::Done);
                        break;
                    }
                    Err(err) => {
                        protocol.connection_lost(BodyEnd::Failed(err.to_string()));
                        break;
                    }
                }
            }
        });
    }
}
