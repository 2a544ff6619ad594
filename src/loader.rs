//! Shared loading indicator
//!
//! One indicator is shared by every controller that wants to signal activity.
//! Visibility is reference counted: each `show` must be paired with one `hide`,
//! and the indicator stays visible while any caller still holds it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    count: Arc<watch::Sender<usize>>,
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingIndicator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    pub fn show(&self) {
        self.count.send_modify(|count| {
            *count += 1;
            if *count == 1 {
                debug!("Loading indicator visible");
            }
        });
    }

    /// Release one `show`. Extra calls never push the count below zero.
    pub fn hide(&self) {
        self.count.send_modify(|count| {
            if *count == 1 {
                debug!("Loading indicator hidden");
            }
            *count = count.saturating_sub(1);
        });
    }

    pub fn is_visible(&self) -> bool {
        *self.count.borrow() > 0
    }

    /// Number of callers currently holding the indicator
    pub fn holders(&self) -> usize {
        *self.count.borrow()
    }

    /// Watch the holder count; the indicator is visible while it is non-zero
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }

    /// Show the indicator after `grace` unless the returned ticket is finished first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, grace: Duration) -> PendingLoader {
        let state = Arc::new(AtomicU8::new(PENDING));
        let indicator = self.clone();
        let timer_state = state.clone();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            indicator.show();
            if timer_state
                .compare_exchange(PENDING, SHOWN, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // Finished while we were showing; give it back.
                indicator.hide();
            }
        });

        PendingLoader {
            indicator: self.clone(),
            state,
            timer: Some(timer),
        }
    }
}

const PENDING: u8 = 0;
const SHOWN: u8 = 1;
const FINISHED: u8 = 2;

/// Ticket for one grace-period show. Finishing it (explicitly or on drop)
/// cancels a pending show and hides the indicator exactly once if it was shown.
#[derive(Debug)]
pub struct PendingLoader {
    indicator: LoadingIndicator,
    state: Arc<AtomicU8>,
    timer: Option<JoinHandle<()>>,
}

impl PendingLoader {
    pub fn finish(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if self.state.swap(FINISHED, Ordering::AcqRel) == SHOWN {
            self.indicator.hide();
        }
    }

    pub fn was_shown(&self) -> bool {
        self.state.load(Ordering::Acquire) == SHOWN
    }
}

impl Drop for PendingLoader {
    fn drop(&mut self) {
        self.finish();
    }
}
