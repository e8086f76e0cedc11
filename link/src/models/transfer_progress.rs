use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Progress counter and cancellation flag shared between a blob transfer
/// and an observer thread.
///
/// The transfer writes progress and polls [`is_cancelled`](Self::is_cancelled)
/// at each checkpoint; the observer reads progress and calls
/// [`cancel`](Self::cancel). Share it as `Arc<TransferProgress>`.
///
/// ```rust
/// use aceql_link::TransferProgress;
/// use std::sync::Arc;
///
/// let progress = Arc::new(TransferProgress::new());
/// let observer = Arc::clone(&progress);
/// std::thread::spawn(move || {
///     if observer.percent() < 50 {
///         observer.cancel();
///     }
/// });
/// ```
#[derive(Debug, Default)]
pub struct TransferProgress {
    percent: AtomicU32,
    bytes_transferred: AtomicU64,
    total_bytes: AtomicU64,
    cancelled: AtomicBool,
}

impl TransferProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percent complete, 0-100.
    pub fn percent(&self) -> u32 {
        self.percent.load(Ordering::Acquire)
    }

    pub fn set_percent(&self, percent: u32) {
        self.percent.store(percent.min(100), Ordering::Release);
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Acquire)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Acquire)
    }

    /// Request cancellation; observed at the transfer's next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear counters before a new transfer. The cancellation flag is left as is.
    pub fn begin(&self, total_bytes: u64) {
        self.total_bytes.store(total_bytes, Ordering::Release);
        self.bytes_transferred.store(0, Ordering::Release);
        self.percent.store(0, Ordering::Release);
    }

    /// Record `count` more bytes. While bytes are in flight the percentage
    /// is capped at 99; only [`complete`](Self::complete) reports 100.
    pub fn record(&self, count: u64) {
        let done = self.bytes_transferred.fetch_add(count, Ordering::AcqRel) + count;
        let total = self.total_bytes();
        if total > 0 {
            let percent = ((done.saturating_mul(100)) / total).min(99) as u32;
            self.percent.store(percent, Ordering::Release);
        }
    }

    pub fn complete(&self) {
        self.percent.store(100, Ordering::Release);
    }

    /// Reset everything, including the cancellation flag.
    pub fn reset(&self) {
        self.begin(0);
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn snapshot(&self) -> TransferSnapshot {
        TransferSnapshot {
            bytes_transferred: self.bytes_transferred(),
            total_bytes: self.total_bytes(),
            percent: self.percent(),
            cancelled: self.is_cancelled(),
        }
    }
}

/// Point-in-time copy of a [`TransferProgress`], e.g. for a UI refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSnapshot {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    /// Percent complete (0-100)
    pub percent: u32,
    pub cancelled: bool,
}
