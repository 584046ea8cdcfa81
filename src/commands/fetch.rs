//! `vcr-splice fetch` command.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

use crate::adapters::intercepting::{
    InterceptingAgent, InterceptingCallbackClient, InterceptingFetchClient,
};
use crate::adapters::live::agent::ReqwestAgent;
use crate::adapters::live::callback::ReqwestCallbackClient;
use crate::adapters::live::diagnostics::TracingDiagnostics;
use crate::adapters::live::fetch::ReqwestFetchClient;
use crate::adapters::live::scheduler::TokioScheduler;
use crate::canonical::{CanonicalRequest, Headers};
use crate::cassette::YamlCassette;
use crate::cli::{ClientKind, FetchArgs};
use crate::config::InterceptConfig;
use crate::error::InterceptError;
use crate::ports::{
    collect_body, Agent, AgentBody, CallbackClient, Diagnostics, FetchClient, FetchError,
    FetchRequest, HttpRequest,
};
use crate::splice::Splicer;

/// How long to wait for the caller's continuation to fire.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent the fetch client applies when no `User-Agent` header is given.
const USER_AGENT: &str = concat!("vcr-splice/", env!("CARGO_PKG_VERSION"));

const SILENCED: &str = "no response: the request matched a silenced path";

/// Execute the `fetch` command.
///
/// Issues one request through the selected intercepting client, prints the
/// response and saves any newly recorded interaction.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded or saved, the
/// request fails, or the response is a synthetic interception failure.
pub fn run(args: &FetchArgs) -> Result<(), String> {
    let config = InterceptConfig::from(args.intercept.clone());
    let parts = RequestParts {
        method: args.method.clone(),
        url: args.url.clone(),
        headers: parse_headers(&args.headers)?,
        body: args.data.clone().map(String::into_bytes),
    };
    let cassette = Arc::new(config.open_cassette().map_err(|e| e.to_string())?);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    let outcome = runtime.block_on(issue(args.client, parts, &config, Arc::clone(&cassette)));

    // Save before reporting, so a failed print never loses a recording.
    if let Some(path) = cassette.save().map_err(|e| e.to_string())? {
        eprintln!("Cassette saved to: {}", path.display());
    }

    let outcome = outcome?;
    print_outcome(&outcome)?;
    match outcome.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// The request as given on the command line.
struct RequestParts {
    method: String,
    url: String,
    headers: Headers,
    body: Option<Vec<u8>>,
}

/// What the chosen client delivered.
struct Outcome {
    status: u16,
    reason: String,
    headers: Headers,
    body: Vec<u8>,
    error: Option<String>,
}

async fn issue(
    kind: ClientKind,
    parts: RequestParts,
    config: &InterceptConfig,
    cassette: Arc<YamlCassette>,
) -> Result<Outcome, String> {
    let handle = Handle::current();
    let silenced = Arc::new(Notify::new());
    let splicer = config
        .splicer(cassette, Arc::new(TokioScheduler::new(handle.clone())))
        .with_diagnostics(Arc::new(SilenceWatch { silenced: Arc::clone(&silenced) }));
    let http = reqwest::Client::new();
    tracing::debug!(client = ?kind, method = %parts.method, url = %parts.url, "issuing request");

    let delivered = async move {
        match kind {
            ClientKind::Callback => via_callback(splicer, http, handle, parts).await,
            ClientKind::Agent => via_agent(splicer, http, handle, parts).await,
            ClientKind::Fetch => via_fetch(splicer, http, handle, parts).await,
        }
    };
    // A silenced agent call leaves its deferred unfired forever.
    let pending = async move {
        tokio::select! {
            outcome = delivered => outcome,
            () = silenced.notified() => Err(SILENCED.to_string()),
        }
    };
    tokio::time::timeout(RESPONSE_TIMEOUT, pending).await.map_err(|_| {
        format!("timed out after {}s waiting for a response", RESPONSE_TIMEOUT.as_secs())
    })?
}

/// Logs like [`TracingDiagnostics`] and wakes the command when the call is
/// silenced.
struct SilenceWatch {
    silenced: Arc<Notify>,
}

impl Diagnostics for SilenceWatch {
    fn report(&self, call_id: Uuid, error: &InterceptError) {
        TracingDiagnostics.report(call_id, error);
    }

    fn abandoned(&self, call_id: Uuid, request: &CanonicalRequest) {
        TracingDiagnostics.abandoned(call_id, request);
        self.silenced.notify_one();
    }
}

async fn via_callback(
    splicer: Splicer,
    http: reqwest::Client,
    handle: Handle,
    parts: RequestParts,
) -> Result<Outcome, String> {
    let live = ReqwestCallbackClient::new(http, handle);
    let client = InterceptingCallbackClient::new(Box::new(live), splicer);
    let request = HttpRequest {
        method: parts.method,
        url: parts.url,
        headers: parts.headers,
        body: parts.body,
    };

    let (tx, rx) = oneshot::channel();
    client.send(
        request,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    );
    let response = rx.await.map_err(|_| SILENCED.to_string())?.map_err(|e| e.to_string())?;
    Ok(Outcome {
        status: response.status,
        reason: response.reason,
        headers: response.headers,
        body: response.body,
        error: response.error.map(|e| e.to_string()),
    })
}

async fn via_agent(
    splicer: Splicer,
    http: reqwest::Client,
    handle: Handle,
    parts: RequestParts,
) -> Result<Outcome, String> {
    let live = ReqwestAgent::new(http, handle);
    let agent = InterceptingAgent::new(Box::new(live), splicer);

    let response = agent
        .request(&parts.method, &parts.url, Some(parts.headers), parts.body.map(AgentBody::Bytes))
        .await
        .map_err(|e| e.to_string())?;
    let status = response.code;
    let reason = response.phrase.clone();
    let headers = response.headers.clone();
    let error = response.error.as_ref().map(ToString::to_string);
    let body = collect_body(response).await.map_err(|e| e.to_string())?;
    Ok(Outcome { status, reason, headers, body, error })
}

async fn via_fetch(
    splicer: Splicer,
    http: reqwest::Client,
    handle: Handle,
    parts: RequestParts,
) -> Result<Outcome, String> {
    let live = ReqwestFetchClient::new(http, handle);
    let client = InterceptingFetchClient::new(Box::new(live), splicer);
    let mut request = FetchRequest::new(parts.method, parts.url).user_agent(USER_AGENT);
    request.headers = parts.headers;
    request.body = parts.body;

    let (tx, rx) = oneshot::channel();
    client.fetch(
        request,
        Box::new(move |key| {
            key.resume(Box::new(move |response| {
                let _ = tx.send(response);
            }));
        }),
    );
    let response = rx.await.map_err(|_| SILENCED.to_string())?;
    let error = match response.error {
        None | Some(FetchError::Http(_)) => None,
        Some(other) => Some(other.to_string()),
    };
    Ok(Outcome {
        status: response.code,
        reason: response.reason,
        headers: response.headers,
        body: response.body,
        error,
    })
}

fn print_outcome(outcome: &Outcome) -> Result<(), String> {
    let mut out = std::io::stdout().lock();
    let mut write = || -> std::io::Result<()> {
        writeln!(out, "HTTP {} {}", outcome.status, outcome.reason)?;
        for (name, value) in outcome.headers.pairs() {
            writeln!(out, "{name}: {value}")?;
        }
        writeln!(out)?;
        out.write_all(&outcome.body)?;
        if !outcome.body.ends_with(b"\n") && !outcome.body.is_empty() {
            writeln!(out)?;
        }
        out.flush()
    };
    write().map_err(|e| format!("failed to write response: {e}"))
}

/// Parses `Name: value` header arguments.
fn parse_headers(raw: &[String]) -> Result<Headers, String> {
    let mut headers = Headers::new();
    for line in raw {
        let (name, value) = line
            .split_once(':')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| format!("invalid header {line:?}: expected 'Name: value'"))?;
        headers.add(name.trim(), value.trim());
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_headers_in_order() {
        let headers = parse_headers(&[
            "Accept: application/json".to_string(),
            "X-Trace:1".to_string(),
            "x-trace: 2".to_string(),
        ])
        .unwrap();
        assert_eq!(headers.get("accept"), Some("application/json"));
        assert_eq!(headers.get_all("X-Trace"), ["1", "2"]);
    }

    #[test]
    fn rejects_headers_without_a_name() {
        assert!(parse_headers(&["no colon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }

    #[tokio::test]
    async fn silence_watch_wakes_the_command() {
        let silenced = Arc::new(Notify::new());
        let watch = SilenceWatch { silenced: Arc::clone(&silenced) };
        let request = CanonicalRequest::new("GET", "http://example.test/v2/subscribe/x");
        watch.abandoned(Uuid::new_v4(), &request);
        let woke = tokio::time::timeout(Duration::from_millis(50), silenced.notified()).await;
        assert!(woke.is_ok(), "a call silenced before the wait still wakes it");
    }

    #[test]
    fn value_may_contain_colons() {
        let headers = parse_headers(&["Referer: http://example.test:8080/".to_string()]).unwrap();
        assert_eq!(headers.get("referer"), Some("http://example.test:8080/"));
    }
}
