//! Liveness probing for extension sources
//!
//! # Modules
//!
//! - [`board`]: Per-source result slots guarded by a generation counter
//! - [`checker`]: Short-circuiting, never-failing probe entry points
//! - [`error`]: Probe transport errors
//! - [`prober`]: Prober trait with proxy-service and direct HTTP implementations

pub mod board;
pub mod checker;
pub mod error;
pub mod prober;

pub use board::{ProbeBoard, ProbeKey, SlotState};
pub use checker::LivenessChecker;
pub use prober::{DirectProber, ProbeResult, Prober, ProxyProber};
