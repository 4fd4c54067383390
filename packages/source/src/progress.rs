//! Progress reporting for downloads and dataset reads.
//!
//! [`ProgressCallback`] keeps the acquisition code independent of how
//! progress is shown; the CLI plugs in `indicatif` bars, tests use
//! [`NullProgress`].

/// Receives progress updates from a long-running acquisition step.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (bytes or records).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
