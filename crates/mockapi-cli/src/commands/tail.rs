use anyhow::Result;
use colored::{ColoredString, Colorize};
use mockapi_application::LogStreamConsumer;
use mockapi_core::log_stream::{LogEntry, LogStreamState, StreamStatus};
use mockapi_interaction::WebSocketLogChannel;
use std::sync::Arc;
use std::time::Duration;

use crate::console::Console;

/// How often to check whether the connection task has given up.
const FINISH_POLL: Duration = Duration::from_millis(250);

pub async fn run(console: &Console, slug: &str, reconnect: bool) -> Result<()> {
    console.require_session()?;

    let mut reconnect_config = console.config.log_stream.reconnect.clone();
    reconnect_config.enabled |= reconnect;

    let url = console.config.log_stream.url.clone();
    let consumer = LogStreamConsumer::new(Arc::new(WebSocketLogChannel::new()), url.clone())
        .with_reconnect_policy(reconnect_config.policy());
    let mut view = consumer.subscribe();

    println!("{}", format!("Tailing {} via {} (Ctrl-C to stop)", slug, url).bright_black());
    consumer.start(slug);

    let mut tracker = Tracker::default();
    let mut poll = tokio::time::interval(FINISH_POLL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                consumer.stop();
                println!();
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                if let Some(stream) = snapshot.stream() {
                    print_updates(&mut tracker, stream);
                }
            }
            _ = poll.tick() => {
                if consumer.has_finished() {
                    break;
                }
            }
        }
    }

    if let Some(stream) = consumer.snapshot().stream() {
        print_updates(&mut tracker, stream);
    }
    Ok(())
}

fn print_updates(tracker: &mut Tracker, stream: &LogStreamState) {
    if let Some(status) = tracker.status_change(stream) {
        println!("{}", status_line(&status));
    }
    for entry in tracker.take_new(stream) {
        println!("{}", entry_line(entry));
    }
}

/// Remembers what has been printed so each update prints only the difference.
#[derive(Default)]
struct Tracker {
    status: Option<StreamStatus>,
    printed: u64,
}

impl Tracker {
    fn status_change(&mut self, stream: &LogStreamState) -> Option<StreamStatus> {
        let current = stream.status();
        if self.status.as_ref() == Some(current) {
            return None;
        }
        self.status = Some(current.clone());
        Some(current.clone())
    }

    /// Entries accepted since the last call, oldest first. Entries that
    /// already fell out of the buffer are skipped.
    fn take_new<'a>(&mut self, stream: &'a LogStreamState) -> Vec<&'a LogEntry> {
        let fresh = stream.accepted_total().saturating_sub(self.printed);
        self.printed = stream.accepted_total();

        let fresh = usize::try_from(fresh).unwrap_or(usize::MAX);
        let mut entries: Vec<&LogEntry> = stream.entries().take(fresh).collect();
        entries.reverse();
        entries
    }
}

fn status_line(status: &StreamStatus) -> ColoredString {
    match status {
        StreamStatus::Connecting => status.label().yellow(),
        StreamStatus::Live => status.label().green(),
        StreamStatus::Error(reason) => format!("{} ({})", status.label(), reason).red(),
        StreamStatus::Closed => status.label().red(),
    }
}

fn entry_line(entry: &LogEntry) -> String {
    let time = entry.local_time().unwrap_or_else(|| "--:--:--".to_string());
    let code = if entry.is_failure() {
        entry.status_code.to_string().red()
    } else {
        entry.status_code.to_string().green()
    };
    let mut line = format!(
        "{} {:<7} {} {}",
        time.bright_black(),
        entry.method.bold(),
        code,
        entry.path
    );
    if let Some(detail) = &entry.detail {
        line.push_str(&format!(" {}", detail.bright_black()));
    }
    line
}
