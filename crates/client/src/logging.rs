//! Cross-platform logging.
//!
//! The client runs in the browser (WASM) and natively under tests and desktop
//! shells. These macros dispatch to the appropriate backend:
//! - Web: `web_sys::console`
//! - Native: the `tracing` crate

#[doc(hidden)]
pub fn info_impl(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::info!("{msg}");
}

#[doc(hidden)]
pub fn warn_impl(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::warn!("{msg}");
}

#[doc(hidden)]
pub fn error_impl(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::error!("{msg}");
}

#[doc(hidden)]
pub fn debug_impl(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    tracing::debug!("{msg}");
}

/// Install the `tracing` subscriber for native hosts. No-op on the web,
/// where the console backend needs no setup.
#[cfg(not(target_arch = "wasm32"))]
pub fn init() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

#[cfg(target_arch = "wasm32")]
pub fn init() {}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::info_impl(&format!($($arg)*))
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::warn_impl(&format!($($arg)*))
    };
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::error_impl(&format!($($arg)*))
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::debug_impl(&format!($($arg)*))
    };
}
