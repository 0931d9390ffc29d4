//! Coalesced re-mount scheduling.
//!
//! Observer notifications only mark a pass as pending. A flush runs at most
//! one pass, and only when the document changed structurally since the last
//! one. The epoch is recorded after the pass, so insertions made by the pass
//! itself do not schedule another.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciler {
    pending: bool,
    settled_epoch: Option<u64>,
    passes: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation notification.
    pub fn notify(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether a flush at `epoch` should run a pass. Clears the pending flag.
    pub fn begin(&mut self, epoch: u64) -> bool {
        let pending = std::mem::take(&mut self.pending);
        pending && self.settled_epoch != Some(epoch)
    }

    /// Mark the document settled at `epoch` after a pass.
    pub fn settle(&mut self, epoch: u64) {
        self.settled_epoch = Some(epoch);
        self.passes += 1;
    }

    /// Passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}
