use futures::StreamExt;
use mockapi_core::log_stream::{
    Applied, ChannelEvent, LogEntry, LogStreamState, ReconnectPolicy, StreamStatus,
};
use mockapi_interaction::LogChannel;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a view renders for one log stream.
///
/// `generation` increases on every `start` and `stop`; a background
/// connection only writes while the generation it was started with is
/// current.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogStreamView {
    generation: u64,
    stream: Option<LogStreamState>,
}

impl LogStreamView {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `None` until the consumer is started for the first time.
    pub fn stream(&self) -> Option<&LogStreamState> {
        self.stream.as_ref()
    }

    pub fn status(&self) -> Option<&StreamStatus> {
        self.stream.as_ref().map(LogStreamState::status)
    }

    /// Buffered entries, newest first.
    pub fn entries(&self) -> Vec<&LogEntry> {
        self.stream
            .as_ref()
            .map(|stream| stream.entries().collect())
            .unwrap_or_default()
    }

    pub fn accepted_total(&self) -> u64 {
        self.stream
            .as_ref()
            .map(LogStreamState::accepted_total)
            .unwrap_or(0)
    }
}

struct Running {
    cancel: CancellationToken,
    // Detached on stop; the task exits on its own once cancelled.
    task: JoinHandle<()>,
}

/// Consumes the shared log channel for one viewed project.
///
/// Owns at most one connection at a time. `start` replaces any previous
/// connection and buffer; `stop` tears the connection down and must be
/// called when the view goes away or switches projects (dropping the
/// consumer does it too).
pub struct LogStreamConsumer {
    channel: Arc<dyn LogChannel>,
    url: String,
    policy: ReconnectPolicy,
    view: Arc<watch::Sender<LogStreamView>>,
    running: Mutex<Option<Running>>,
}

impl LogStreamConsumer {
    pub fn new(channel: Arc<dyn LogChannel>, url: impl Into<String>) -> Self {
        let (view, _) = watch::channel(LogStreamView::default());
        Self {
            channel,
            url: url.into(),
            policy: ReconnectPolicy::Never,
            view: Arc::new(view),
            running: Mutex::new(None),
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<LogStreamView> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> LogStreamView {
        self.view.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// True once the connection task has exited: stopped, superseded, or
    /// terminal with no reconnect left to try.
    pub fn has_finished(&self) -> bool {
        self.lock_running()
            .as_ref()
            .is_none_or(|running| running.task.is_finished())
    }

    /// Opens a connection for `target_slug`. Status starts at `Connecting`
    /// with an empty buffer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, target_slug: impl Into<String>) {
        let target_slug = target_slug.into();
        let mut running = self.lock_running();
        if let Some(previous) = running.take() {
            previous.cancel.cancel();
        }

        let mut generation = 0;
        self.view.send_modify(|view| {
            view.generation += 1;
            view.stream = Some(LogStreamState::new(target_slug.clone()));
            generation = view.generation;
        });

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_connection(
            self.channel.clone(),
            self.url.clone(),
            self.policy,
            self.view.clone(),
            generation,
            cancel.clone(),
        ));
        tracing::debug!("[LogStream] Started for '{}' (generation {})", target_slug, generation);

        *running = Some(Running { cancel, task });
    }

    /// Closes the connection. Safe to call repeatedly and in any status.
    ///
    /// Once this returns, no further entries reach the view; the buffer is
    /// kept for display with status `Closed`.
    pub fn stop(&self) {
        let Some(running) = self.lock_running().take() else {
            return;
        };
        running.cancel.cancel();

        self.view.send_modify(|view| {
            view.generation += 1;
            if let Some(stream) = view.stream.as_mut() {
                stream.close();
            }
        });
        tracing::debug!("[LogStream] Stopped");
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for LogStreamConsumer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Applies `f` to the stream state if `generation` is still current.
///
/// Returns `None` when the connection has been superseded.
fn publish<F>(view: &watch::Sender<LogStreamView>, generation: u64, f: F) -> Option<Applied>
where
    F: FnOnce(&mut LogStreamState) -> Applied,
{
    let mut outcome = None;
    view.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        let Some(stream) = current.stream.as_mut() else {
            return false;
        };
        let applied = f(stream);
        outcome = Some(applied);
        applied.is_visible()
    });
    outcome
}

async fn run_connection(
    channel: Arc<dyn LogChannel>,
    url: String,
    policy: ReconnectPolicy,
    view: Arc<watch::Sender<LogStreamView>>,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = channel.connect(&url) => result,
        };

        match connected {
            Ok(mut events) => {
                if publish(&view, generation, |s| s.apply(ChannelEvent::Opened)).is_none() {
                    return;
                }
                attempt = 0;

                loop {
                    let event = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        event = events.next() => event.unwrap_or(ChannelEvent::Closed),
                    };

                    let terminal = matches!(event, ChannelEvent::Error(_) | ChannelEvent::Closed);
                    if let ChannelEvent::Error(message) = &event {
                        tracing::warn!("[LogStream] Channel error: {}", message);
                    }

                    match publish(&view, generation, |s| s.apply(event)) {
                        None => return,
                        Some(Applied::Malformed) => {
                            tracing::warn!("[LogStream] Dropped a frame that is not a log entry");
                        }
                        Some(_) => {}
                    }

                    if terminal {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("[LogStream] {}", e);
                let message = e.to_string();
                if publish(&view, generation, |s| s.apply(ChannelEvent::Error(message))).is_none() {
                    return;
                }
            }
        }

        attempt += 1;
        let Some(delay) = policy.delay_for(attempt) else {
            tracing::debug!("[LogStream] Not reconnecting");
            return;
        };
        tracing::info!("[LogStream] Reconnecting in {:?} (attempt {})", delay, attempt);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        if publish(&view, generation, LogStreamState::reconnecting).is_none() {
            return;
        }
    }
}
