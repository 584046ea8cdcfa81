//! Shared doubles for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use vcr_splice::adapters::deterministic::{CollectingDiagnostics, ManualClock, ManualScheduler};
use vcr_splice::canonical::{CanonicalInteraction, CanonicalRequest, CanonicalResponse, Headers};
use vcr_splice::cassette::{Cassette, CassetteConfig, RecordMode, YamlCassette};
use vcr_splice::error::CassetteError;
use vcr_splice::ports::{
    Agent, AgentBody, AgentResponse, BodyEnd, BufferedBody, CallbackClient, Deferred,
    FetchClient, FetchRequest, FetchResponse, HttpRequest, HttpResponse, KeyCallback,
    KeyResponse, Scheduler, SendCallback,
};
use vcr_splice::splice::Splicer;

/// The instant every test clock starts at.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 14, 30, 0).unwrap()
}

/// The recorded `GET http://example.test/a -> 200 {"ok":true}` interaction.
pub fn ok_interaction() -> CanonicalInteraction {
    let mut headers = Headers::new();
    headers.add("Content-Type", "application/json");
    CanonicalInteraction::new(
        CanonicalRequest::new("GET", "http://example.test/a"),
        CanonicalResponse::new(200, "OK", "{\"ok\":true}")
            .with_headers(headers)
            .with_url("http://example.test/a"),
    )
}

/// A cassette that counts every call the splicer makes and can be told to
/// fail plays or appends.
pub struct CountingCassette {
    pub inner: YamlCassette,
    pub can_play_calls: AtomicUsize,
    pub play_calls: AtomicUsize,
    pub append_calls: AtomicUsize,
    pub fail_plays: bool,
    pub fail_appends: bool,
}

impl CountingCassette {
    /// A cassette holding `interactions` as if loaded from disk.
    pub fn loaded(mode: RecordMode, interactions: Vec<CanonicalInteraction>) -> Self {
        Self::wrap(YamlCassette::from_interactions(
            "fixtures/test.yaml",
            CassetteConfig::with_record_mode(mode),
            interactions,
        ))
    }

    /// A cassette that has never been written.
    pub fn fresh(mode: RecordMode) -> Self {
        Self::wrap(YamlCassette::empty("fixtures/new.yaml", CassetteConfig::with_record_mode(mode)))
    }

    fn wrap(inner: YamlCassette) -> Self {
        Self {
            inner,
            can_play_calls: AtomicUsize::new(0),
            play_calls: AtomicUsize::new(0),
            append_calls: AtomicUsize::new(0),
            fail_plays: false,
            fail_appends: false,
        }
    }

    /// Total lookups (`can_play` plus `play`).
    pub fn lookups(&self) -> usize {
        self.can_play_calls.load(Ordering::SeqCst) + self.play_calls.load(Ordering::SeqCst)
    }

    pub fn appends(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }
}

impl Cassette for CountingCassette {
    fn can_play(&self, request: &CanonicalRequest) -> bool {
        self.can_play_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_plays || self.inner.can_play(request)
    }

    fn play(&self, request: &CanonicalRequest) -> Result<CanonicalInteraction, CassetteError> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_plays {
            return Err(CassetteError::NoMatch(request.clone()));
        }
        self.inner.play(request)
    }

    fn append(&self, interaction: CanonicalInteraction) -> Result<(), CassetteError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends {
            return Err(CassetteError::Poisoned);
        }
        self.inner.append(interaction)
    }

    fn is_write_protected(&self) -> bool {
        self.inner.is_write_protected()
    }

    fn filter(&self, request: &CanonicalRequest) -> bool {
        self.inner.filter(request)
    }

    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn record_mode(&self) -> RecordMode {
        self.inner.record_mode()
    }
}

/// Everything a splice test drives by hand.
pub struct Harness {
    pub cassette: Arc<CountingCassette>,
    pub scheduler: Arc<ManualScheduler>,
    pub clock: Arc<ManualClock>,
    pub diagnostics: Arc<CollectingDiagnostics>,
    pub splicer: Splicer,
}

impl Harness {
    pub fn new(cassette: CountingCassette) -> Self {
        let cassette = Arc::new(cassette);
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let diagnostics = Arc::new(CollectingDiagnostics::new());
        let splicer = Splicer::new(cassette.clone(), scheduler.clone())
            .with_clock(clock.clone())
            .with_diagnostics(diagnostics.clone());
        Self { cassette, scheduler, clock, diagnostics, splicer }
    }
}

/// Collects every value a continuation receives.
pub struct Inbox<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Send + 'static> Inbox<T> {
    pub fn new() -> Self {
        Self { values: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn sink(&self) -> Box<dyn FnOnce(T) + Send + 'static> {
        let values = Arc::clone(&self.values);
        Box::new(move |value| values.lock().unwrap().push(value))
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.values.lock().unwrap())
    }
}

/// A callback client that answers on the scheduler with a canned response.
pub struct FakeCallbackClient {
    pub scheduler: Arc<ManualScheduler>,
    pub response: HttpResponse,
    pub calls: Arc<AtomicUsize>,
}

impl FakeCallbackClient {
    pub fn new(scheduler: Arc<ManualScheduler>, status: u16, body: &str) -> Self {
        Self {
            scheduler,
            response: HttpResponse {
                status,
                reason: "Created".into(),
                headers: Headers::new(),
                body: body.as_bytes().to_vec(),
                url: None,
                elapsed: Duration::from_millis(7),
                error: None,
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CallbackClient for FakeCallbackClient {
    fn send(&self, request: HttpRequest, on_done: SendCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut response = self.response.clone();
        response.url = Some(request.url);
        self.scheduler.call_later(Duration::ZERO, Box::new(move || on_done(Ok(response))));
    }
}

/// An agent whose responses arrive in the given chunks.
pub struct FakeAgent {
    pub chunks: Vec<Vec<u8>>,
    pub end: BodyEnd,
    pub calls: Arc<AtomicUsize>,
}

impl FakeAgent {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
            end: BodyEnd::Done,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Agent for FakeAgent {
    fn request(
        &self,
        _method: &str,
        _uri: &str,
        _headers: Option<Headers>,
        _body: Option<AgentBody>,
    ) -> Deferred<AgentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        Deferred::succeed(AgentResponse::new(
            200,
            "OK",
            headers,
            BufferedBody::chunked(self.chunks.clone(), self.end.clone()),
        ))
    }
}

/// A fetch client that hands out its key on the scheduler.
pub struct FakeFetchClient {
    pub scheduler: Arc<ManualScheduler>,
    pub response: FetchResponse,
    pub calls: Arc<AtomicUsize>,
}

impl FakeFetchClient {
    pub fn new(scheduler: Arc<ManualScheduler>, response: FetchResponse) -> Self {
        Self { scheduler, response, calls: Arc::new(AtomicUsize::new(0)) }
    }
}

impl FetchClient for FakeFetchClient {
    fn fetch(&self, _request: FetchRequest, on_key: KeyCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        self.scheduler.call_later(
            Duration::ZERO,
            Box::new(move || {
                on_key(KeyResponse::new(move |on_response| on_response(response)));
            }),
        );
    }
}
