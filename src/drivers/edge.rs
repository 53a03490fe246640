//! ISR-fed debounced edge watcher for the push-button line.
//!
//! ## Delivery contract
//!
//! The GPIO ISR does the minimum possible in interrupt context: it stores
//! a millisecond timestamp into an atomic. The dispatch context (main
//! loop) consumes that timestamp with [`take_edge_stamp`] and hands it to
//! [`EdgeWatcher::on_edge`], which decides whether the edge qualifies and,
//! if so, runs the registered callback exactly once.
//!
//! ## Qualifying edge
//!
//! Rising edge only (fixed at interrupt registration), at least the
//! debounce window since the last accepted edge. The hardware/host layer
//! is expected to filter contact bounce, but the watcher re-checks the
//! window so the at-most-once-per-press contract holds on hosts without
//! input filtering.
//!
//! ## Re-entrancy
//!
//! The callback body runs under an atomic try-lock. A second edge arriving
//! while the callback is in flight is dropped, preserving the
//! at-most-one-concurrent-invocation guarantee even without a masking
//! interrupt delivery mechanism.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
/// Written by the ISR, read by the dispatch loop.
static EDGE_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

/// Last timestamp already handed to the watcher.
static EDGE_CONSUMED: AtomicU32 = AtomicU32::new(0);

/// ISR handler body. Register this on the button GPIO rising edge.
/// Safe to call from interrupt context (lock-free atomic store).
pub fn edge_isr_handler(now_ms: u32) {
    EDGE_ISR_TIMESTAMP.store(now_ms, Ordering::Release);
}

/// Consume a pending edge timestamp, if the ISR recorded a new one.
/// Called from the dispatch loop; single consumer.
pub fn take_edge_stamp() -> Option<u32> {
    let stamp = EDGE_ISR_TIMESTAMP.load(Ordering::Acquire);
    if stamp == 0 || stamp == EDGE_CONSUMED.load(Ordering::Relaxed) {
        return None;
    }
    EDGE_CONSUMED.store(stamp, Ordering::Relaxed);
    Some(stamp)
}

/// Debounce + dispatch state machine for one input line.
///
/// Armed at acquisition, disarmed at teardown; a disarmed watcher ignores
/// every edge. All state is atomic so `on_edge` works through `&self`
/// from the shared device handle.
pub struct EdgeWatcher {
    debounce_ms: u32,
    armed: AtomicBool,
    in_callback: AtomicBool,
    seen_edge: AtomicBool,
    last_accepted_ms: AtomicU32,
}

impl EdgeWatcher {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            armed: AtomicBool::new(false),
            in_callback: AtomicBool::new(false),
            seen_edge: AtomicBool::new(false),
            last_accepted_ms: AtomicU32::new(0),
        }
    }

    /// Start accepting edges. Called once acquisition completes.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Stop accepting edges. Terminal: called at teardown, after which
    /// any in-flight or late edge is ignored.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Offer one edge to the watcher.
    ///
    /// Runs `callback` synchronously and returns `true` iff the edge
    /// qualified. The callback never overlaps with itself: a concurrent
    /// offer is rejected while one is in flight.
    pub fn on_edge(&self, stamp_ms: u32, callback: impl FnOnce()) -> bool {
        if !self.is_armed() {
            return false;
        }

        // Try-lock guard: mask further dispatch for the callback's
        // duration.
        if self.in_callback.swap(true, Ordering::AcqRel) {
            return false;
        }

        let qualifies = if self.seen_edge.load(Ordering::Relaxed) {
            let last = self.last_accepted_ms.load(Ordering::Relaxed);
            stamp_ms.wrapping_sub(last) >= self.debounce_ms
        } else {
            true
        };

        if !qualifies {
            self.in_callback.store(false, Ordering::Release);
            return false;
        }

        self.last_accepted_ms.store(stamp_ms, Ordering::Relaxed);
        self.seen_edge.store(true, Ordering::Relaxed);

        callback();

        self.in_callback.store(false, Ordering::Release);
        true
    }
}
