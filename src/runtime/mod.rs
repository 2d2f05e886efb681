//! Routine runtime
//!
//! Routine descriptors, suspension-point builders, pause and cancellation
//! gates, and the phase-ordered runner that resumes them.

pub mod awaiter;
pub mod cancel;
pub mod clock;
pub mod pause;
pub mod phase;
pub mod routine;
pub mod scheduler;
pub mod signal;
