//! Spawning view-scoped futures on the UI event loop.
//!
//! Everything in this crate is single-threaded by design; futures spawned
//! here run on the same thread that owns the stores they mutate.

use std::future::Future;

#[cfg(target_arch = "wasm32")]
pub fn spawn_local(fut: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(fut);
}

/// Native hosts drive the client inside a `tokio::task::LocalSet`.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_local(fut: impl Future<Output = ()> + 'static) {
    tokio::task::spawn_local(fut);
}
