//! Run stop coordination: the write-once stop signal and the watchdog.
//!
//! Two things can halt a run before its sources are exhausted: a finish
//! trigger marking it logically complete, or the watchdog killing it at the
//! run timeout. Both go through the shared [`StopSignal`]; the first request
//! wins and the reason is kept so the outcome can tell the two apart.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, after, bounded, select};

/// Why a run was asked to stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A finish trigger marked the run logically complete; evaluation
    /// proceeds as on natural completion.
    TriggerComplete,
    /// The watchdog timed out (or the run was explicitly force-stopped)
    /// before a trustworthy verdict was reached.
    Forced,
}

/// Shared, write-once stop flag for one run.
///
/// The flag is written at most once: the first `request_stop` wins, later
/// calls are no-ops. Sources read it between records (cooperative
/// cancellation), so record delivery does not stop instantaneously.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    reason: Mutex<Option<StopReason>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop. Returns true if this call won the write.
    pub fn request_stop(&self, reason: StopReason) -> bool {
        let mut guard = self.reason.lock().expect("stop reason poisoned");
        if guard.is_some() {
            return false;
        }
        *guard = Some(reason);
        self.stopped.store(true, Ordering::Release);
        true
    }

    /// Whether any stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// The winning stop reason, if any.
    pub fn reason(&self) -> Option<StopReason> {
        *self.reason.lock().expect("stop reason poisoned")
    }

    /// Whether the run was forcibly stopped (watchdog or explicit).
    pub fn is_forced(&self) -> bool {
        self.reason() == Some(StopReason::Forced)
    }
}

/// Supervising timer that forces a stop if the run outlives its timeout.
///
/// The watchdog thread is the only concurrent writer to the stop signal
/// besides finish triggers; disarming it on natural completion keeps a
/// finished run from being marked as forced.
pub struct Watchdog {
    disarm_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Arm a watchdog over the given signal.
    pub fn arm(signal: Arc<StopSignal>, timeout: Duration) -> Self {
        let (disarm_tx, disarm_rx) = bounded::<()>(1);
        let handle = thread::spawn(move || {
            let deadline = after(timeout);
            select! {
                recv(disarm_rx) -> _ => {}
                recv(deadline) -> _ => {
                    if signal.request_stop(StopReason::Forced) {
                        tracing::warn!(
                            "watchdog timeout after {:?}, forcing the run to stop",
                            timeout
                        );
                    }
                }
            }
        });
        Self { disarm_tx, handle }
    }

    /// Disarm the watchdog; the run completed on its own.
    pub fn disarm(self) {
        let _ = self.disarm_tx.send(());
        let _ = self.handle.join();
    }
}
