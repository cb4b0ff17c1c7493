//! Platform timers for reconnect scheduling.

use std::cell::Cell;
use std::rc::Rc;

use super::transport::{TimerHandle, TimerScheduler};

/// Timer scheduler backed by the platform event loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformTimers;

#[cfg(target_arch = "wasm32")]
impl TimerScheduler for PlatformTimers {
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        gloo_timers::callback::Timeout::new(delay_ms, move || {
            if !flag.get() {
                callback();
            }
        })
        .forget();
        TimerHandle::new(cancelled)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TimerScheduler for PlatformTimers {
    /// Runs on the caller's `LocalSet`, matching the crate's
    /// single-threaded model.
    fn schedule(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerHandle {
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(std::time::Duration::from_millis(u64::from(delay_ms))).await;
            if !flag.get() {
                callback();
            }
        });
        TimerHandle::new(cancelled)
    }
}
