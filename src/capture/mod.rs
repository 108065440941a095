//! Capture of change notes on save.
//!
//! The host application signals each completed save. The throttle decides
//! whether that save should prompt for a note at all; the session appends
//! the note and runs the optional push to master. The registry lets the
//! application shell keep exactly one save listener per open project.

pub mod registry;
pub mod session;
pub mod throttle;

pub use registry::ListenerRegistry;
pub use session::{CommitOutcome, MirrorOutcome, ProjectSession};
pub use throttle::{Decision, Evaluation, Reason};
