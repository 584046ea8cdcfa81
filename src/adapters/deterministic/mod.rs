//! Hand-driven host adapters for tests and offline tools.

pub mod clock;
pub mod diagnostics;
pub mod scheduler;

pub use clock::ManualClock;
pub use diagnostics::CollectingDiagnostics;
pub use scheduler::ManualScheduler;
