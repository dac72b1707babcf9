//! Deterministic stand-ins for testing.
//!
//! Available behind the `test-utils` feature flag. Every stub counts its
//! calls so tests can assert that something was (or was not) invoked.

mod recording_hook;
mod recording_sink;
mod static_step;
mod stub_connector;
mod stub_reasoner;

pub use recording_hook::RecordingHook;
pub use recording_sink::RecordingSink;
pub use static_step::StaticStep;
pub use stub_connector::StubConnector;
pub use stub_reasoner::StubReasoner;
