//! Watch registry
//!
//! Watches the source trees of every asset class and re-runs the matching
//! work when files change.
//!
//! Architecture:
//! ```text
//! notify → Debouncer (pure timing) → TriggerSet (paths → targets) → handler
//! ```
//!
//! Coalescing: events are collected per path until `debounce` has passed
//! without a new event, and two batches are at least `cooldown` apart.
//! Batches run one at a time on a blocking thread; events that arrive while
//! a batch is running are queued for the next one. A target therefore never
//! runs concurrently with itself.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};

use crate::config::PipelineConfig;

mod debouncer;
mod roots;
mod trigger;
mod types;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use roots::{WatchRoots, dedupe_roots};

pub use trigger::TriggerSet;
pub use types::Target;

/// Upper bound on idle sleeps, so missing roots get attached once they appear.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Callback for one debounced batch.
pub type Handler = Arc<dyn Fn(&BTreeSet<Target>) + Send + Sync>;

/// Owns the filesystem watcher and its event loop.
///
/// Dropping the registry stops watching; `stop` does the same explicitly.
pub struct WatchRegistry {
    roots: Vec<PathBuf>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl WatchRegistry {
    /// Start watching everything `config` declares.
    ///
    /// The watcher is attached before this returns, so changes made right
    /// after (e.g. during an initial build) are not lost.
    pub fn start(
        config: &PipelineConfig,
        handler: impl Fn(&BTreeSet<Target>) + Send + Sync + 'static,
    ) -> notify::Result<Self> {
        let triggers = TriggerSet::from_config(config);
        let debouncer = Debouncer::new(config.watch.debounce(), config.watch.cooldown());
        Self::with_triggers(triggers, debouncer, Arc::new(handler))
    }

    fn with_triggers(
        triggers: TriggerSet,
        debouncer: Debouncer,
        handler: Handler,
    ) -> notify::Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the loop has exited.
            let _ = event_tx.send(res);
        })?;

        let mut roots = WatchRoots::new(dedupe_roots(triggers.dirs().to_vec()));
        roots.attach_existing(&mut watcher)?;
        let desired = roots.desired().to_vec();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(notify::Error::io)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let event_loop = EventLoop {
            events: event_rx,
            watcher,
            roots,
            debouncer,
            triggers,
            handler,
        };
        let thread = thread::Builder::new()
            .name("watch".into())
            .spawn(move || event_loop.run(runtime, shutdown_rx))
            .map_err(notify::Error::io)?;

        for root in &desired {
            crate::debug!("watch"; "watching {}", root.display());
        }

        Ok(Self {
            roots: desired,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Directories being watched (some may not exist yet).
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop watching and wait for a running batch to finish. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            crate::log!("watch"; "event loop panicked");
        }
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.stop();
    }
}

struct EventLoop {
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    /// Kept alive for the lifetime of the loop.
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    debouncer: Debouncer,
    triggers: TriggerSet,
    handler: Handler,
}

impl EventLoop {
    fn run(mut self, runtime: Runtime, mut shutdown: oneshot::Receiver<()>) {
        runtime.block_on(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    event = self.events.recv() => match event {
                        Some(Ok(event)) => self.debouncer.add_event(&event),
                        Some(Err(e)) => crate::log!("watch"; "notify error: {}", e),
                        None => break,
                    },
                    _ = tokio::time::sleep(self.debouncer.sleep_duration().min(MAINTAIN_INTERVAL)) => {
                        self.roots.maintain(&mut self.watcher);
                        self.process_batch().await;
                    }
                }
            }
        });
        crate::debug!("watch"; "event loop stopped");
    }

    async fn process_batch(&mut self) {
        let Some(changes) = self.debouncer.take_if_ready() else {
            return;
        };

        let targets = self.triggers.targets(changes.keys());
        if targets.is_empty() {
            crate::debug!("watch"; "{} change(s), nothing to rebuild", changes.len());
            return;
        }

        let names: Vec<String> = targets.iter().map(ToString::to_string).collect();
        crate::debug!("watch"; "{} change(s) -> {}", changes.len(), names.join(", "));

        let handler = Arc::clone(&self.handler);
        if let Err(e) = tokio::task::spawn_blocking(move || handler(&targets)).await {
            crate::log!("error"; "rebuild panicked: {}", e);
        }
    }
}
