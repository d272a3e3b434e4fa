//! Shutdown state.
//!
//! Ctrl+C sets `SHUTDOWN` and wakes whoever holds the shutdown signal
//! (watch mode). Before anyone is waiting there is nothing to tear down,
//! so the process exits right away.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Wakes the watch loop on Ctrl+C
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        match SHUTDOWN_TX.get() {
            Some(tx) => {
                crate::log!("watch"; "shutting down...");
                let _ = tx.try_send(());
            }
            None => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Receiver that yields once Ctrl+C is pressed.
///
/// Only the first caller gets a live receiver; later callers get one that
/// never fires, which is fine since a process runs one watch loop.
pub fn shutdown_signal() -> Receiver<()> {
    let (tx, rx) = channel::bounded(1);
    if SHUTDOWN_TX.set(tx).is_ok() {
        rx
    } else {
        channel::never()
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
