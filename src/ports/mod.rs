//! Port traits defining external boundaries.
//!
//! The host-facing ports (time, event loop, diagnostics) are what the
//! splicer depends on. The client ports describe the three continuation
//! shapes an intercepted HTTP client can have. Implementations live in
//! `src/adapters/`.

pub mod agent;
pub mod callback;
pub mod clock;
pub mod diagnostics;
pub mod fetch;
pub mod scheduler;

pub use agent::{
    capture_collected, collect_body, Agent, AgentBody, AgentError, AgentRequest, AgentResponse,
    AgentResult, BodyEnd, BodyProducer, BodyProtocol, BodySource, BufferedBody, CollectedBody,
    CollectingProtocol, Deferred, DeferredSender,
};
pub use callback::{
    CallbackClient, HttpRequest, HttpResponse, SendCallback, SendResult, TransportError,
};
pub use clock::Clock;
pub use diagnostics::Diagnostics;
pub use fetch::{
    FetchClient, FetchError, FetchRequest, FetchResponse, KeyCallback, KeyResponse,
    ResponseCallback,
};
pub use scheduler::{Scheduler, Task};
