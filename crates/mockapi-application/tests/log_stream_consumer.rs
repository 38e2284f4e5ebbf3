mod support;

use mockapi_application::{LogStreamConsumer, LogStreamView};
use mockapi_core::log_stream::{ChannelEvent, LOG_BUFFER_CAPACITY, ReconnectPolicy, StreamStatus};
use std::time::Duration;
use support::{ScriptedChannel, log_frame};
use tokio::sync::watch;

const LOG_URL: &str = "ws://logs.test/ws/logs";

async fn wait_for<F>(rx: &mut watch::Receiver<LogStreamView>, predicate: F) -> LogStreamView
where
    F: FnMut(&LogStreamView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("view did not reach the expected state in time")
        .expect("consumer dropped")
        .clone()
}

fn paths(view: &LogStreamView) -> Vec<String> {
    view.entries().iter().map(|entry| entry.path.clone()).collect()
}

#[tokio::test]
async fn test_keeps_only_target_project_newest_first() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    for seq in 0..60 {
        let slug = if seq % 3 == 2 { "other-api" } else { "shop-api" };
        tx.unbounded_send(log_frame(slug, seq)).unwrap();
    }

    let view = wait_for(&mut rx, |view| view.accepted_total() == 40).await;

    assert_eq!(view.status(), Some(&StreamStatus::Live));
    assert_eq!(view.entries().len(), 40);
    assert!(view.entries().iter().all(|entry| entry.project_slug == "shop-api"));
    assert_eq!(view.entries()[0].path, "/items/58");
    assert_eq!(view.entries()[39].path, "/items/0");
    assert_eq!(channel.connect_count(), 1);
}

#[tokio::test]
async fn test_buffer_holds_newest_fifty() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    for seq in 0..70 {
        tx.unbounded_send(log_frame("shop-api", seq)).unwrap();
    }

    let view = wait_for(&mut rx, |view| view.accepted_total() == 70).await;

    assert_eq!(view.entries().len(), LOG_BUFFER_CAPACITY);
    assert_eq!(view.entries()[0].path, "/items/69");
    assert_eq!(view.entries()[LOG_BUFFER_CAPACITY - 1].path, "/items/20");
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    tx.unbounded_send(log_frame("shop-api", 1)).unwrap();
    tx.unbounded_send(ChannelEvent::Frame("not json at all".to_string()))
        .unwrap();
    tx.unbounded_send(ChannelEvent::Frame(r#"{"project_slug":"shop-api"}"#.to_string()))
        .unwrap();
    tx.unbounded_send(log_frame("shop-api", 2)).unwrap();

    let view = wait_for(&mut rx, |view| view.accepted_total() == 2).await;

    assert_eq!(paths(&view), vec!["/items/2", "/items/1"]);
    assert_eq!(view.status(), Some(&StreamStatus::Live));
    assert_eq!(view.stream().unwrap().malformed_total(), 2);
}

#[tokio::test]
async fn test_status_starts_connecting() {
    let channel = ScriptedChannel::new();
    let _tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);

    assert_eq!(consumer.snapshot().status(), None);
    consumer.start("shop-api");

    let view = consumer.snapshot();
    assert_eq!(view.status(), Some(&StreamStatus::Connecting));
    assert!(view.entries().is_empty());
    assert!(consumer.is_running());
    assert!(!consumer.has_finished());
}

#[tokio::test]
async fn test_stop_ends_delivery() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    tx.unbounded_send(log_frame("shop-api", 1)).unwrap();
    wait_for(&mut rx, |view| view.accepted_total() == 1).await;

    consumer.stop();
    let _ = tx.unbounded_send(log_frame("shop-api", 2));

    let view = consumer.snapshot();
    assert_eq!(view.status(), Some(&StreamStatus::Closed));
    assert_eq!(paths(&view), vec!["/items/1"]);
    assert!(!consumer.is_running());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(consumer.snapshot(), view);

    consumer.stop();
    assert_eq!(consumer.snapshot(), view);
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let channel = ScriptedChannel::new();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.stop();
    consumer.stop();

    assert!(!rx.has_changed().unwrap());
    assert_eq!(consumer.snapshot(), LogStreamView::default());
    assert_eq!(channel.connect_count(), 0);
}

#[tokio::test]
async fn test_stop_while_connecting() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);

    consumer.start("shop-api");
    consumer.stop();
    let _ = tx.unbounded_send(ChannelEvent::Opened);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(consumer.snapshot().status(), Some(&StreamStatus::Closed));
}

#[tokio::test]
async fn test_switching_projects_resets_buffer() {
    let channel = ScriptedChannel::new();
    let first = channel.accept();
    let second = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    first.unbounded_send(ChannelEvent::Opened).unwrap();
    first.unbounded_send(log_frame("shop-api", 1)).unwrap();
    wait_for(&mut rx, |view| view.accepted_total() == 1).await;

    consumer.start("blog-api");
    let view = consumer.snapshot();
    assert_eq!(view.stream().unwrap().target_slug(), "blog-api");
    assert_eq!(view.status(), Some(&StreamStatus::Connecting));
    assert!(view.entries().is_empty());

    let _ = first.unbounded_send(log_frame("blog-api", 99));
    second.unbounded_send(ChannelEvent::Opened).unwrap();
    second.unbounded_send(log_frame("shop-api", 2)).unwrap();
    second.unbounded_send(log_frame("blog-api", 3)).unwrap();

    let view = wait_for(&mut rx, |view| view.accepted_total() == 1).await;
    assert_eq!(paths(&view), vec!["/items/3"]);
    assert_eq!(channel.connect_count(), 2);
}

#[tokio::test]
async fn test_connect_failure_reports_error() {
    let channel = ScriptedChannel::new();
    channel.refuse("connection refused");
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");

    let view = wait_for(&mut rx, |view| {
        matches!(view.status(), Some(StreamStatus::Error(_)))
    })
    .await;
    assert!(view.entries().is_empty());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(channel.connect_count(), 1);
    assert!(consumer.has_finished());
    assert!(consumer.is_running());
}

#[tokio::test]
async fn test_channel_error_is_terminal_without_reconnect() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    tx.unbounded_send(log_frame("shop-api", 1)).unwrap();
    tx.unbounded_send(ChannelEvent::Error("connection reset".to_string()))
        .unwrap();

    let view = wait_for(&mut rx, |view| view.status().is_some_and(StreamStatus::is_terminal)).await;

    assert_eq!(
        view.status(),
        Some(&StreamStatus::Error("connection reset".to_string()))
    );
    assert_eq!(paths(&view), vec!["/items/1"]);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(channel.connect_count(), 1);
}

#[tokio::test]
async fn test_server_close_reports_closed() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    drop(tx);

    let view = wait_for(&mut rx, |view| view.status() == Some(&StreamStatus::Closed)).await;
    assert!(view.entries().is_empty());
}

#[tokio::test]
async fn test_reconnect_keeps_buffer() {
    let channel = ScriptedChannel::new();
    let first = channel.accept();
    let second = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL).with_reconnect_policy(
        ReconnectPolicy::Backoff {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
    );
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    first.unbounded_send(ChannelEvent::Opened).unwrap();
    first.unbounded_send(log_frame("shop-api", 1)).unwrap();
    wait_for(&mut rx, |view| view.accepted_total() == 1).await;

    first
        .unbounded_send(ChannelEvent::Error("connection reset".to_string()))
        .unwrap();
    second.unbounded_send(ChannelEvent::Opened).unwrap();
    second.unbounded_send(log_frame("shop-api", 2)).unwrap();

    let view = wait_for(&mut rx, |view| view.accepted_total() == 2).await;

    assert_eq!(view.status(), Some(&StreamStatus::Live));
    assert_eq!(paths(&view), vec!["/items/2", "/items/1"]);
    assert_eq!(channel.connect_count(), 2);
}

#[tokio::test]
async fn test_reconnect_gives_up_after_max_attempts() {
    let channel = ScriptedChannel::new();
    for _ in 0..3 {
        channel.refuse("connection refused");
    }
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL).with_reconnect_policy(
        ReconnectPolicy::Backoff {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
    );

    consumer.start("shop-api");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(channel.connect_count(), 3);
    assert!(matches!(
        consumer.snapshot().status(),
        Some(StreamStatus::Error(_))
    ));
}

#[tokio::test]
async fn test_stop_during_backoff_prevents_reconnect() {
    let channel = ScriptedChannel::new();
    channel.refuse("connection refused");
    let _next = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL).with_reconnect_policy(
        ReconnectPolicy::Backoff {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(200),
        },
    );
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    wait_for(&mut rx, |view| {
        matches!(view.status(), Some(StreamStatus::Error(_)))
    })
    .await;

    consumer.stop();
    assert!(consumer.has_finished());
    assert_eq!(consumer.snapshot().status(), Some(&StreamStatus::Closed));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(channel.connect_count(), 1);
    assert_eq!(consumer.snapshot().status(), Some(&StreamStatus::Closed));
}

#[tokio::test]
async fn test_attempt_counter_resets_after_live() {
    let channel = ScriptedChannel::new();
    let first = channel.accept();
    let second = channel.accept();
    let third = channel.accept();
    let consumer = LogStreamConsumer::new(channel.clone(), LOG_URL).with_reconnect_policy(
        ReconnectPolicy::Backoff {
            max_attempts: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
    );
    let mut rx = consumer.subscribe();

    first.unbounded_send(ChannelEvent::Opened).unwrap();
    first
        .unbounded_send(ChannelEvent::Error("connection reset".to_string()))
        .unwrap();
    second.unbounded_send(ChannelEvent::Opened).unwrap();
    second
        .unbounded_send(ChannelEvent::Error("connection reset".to_string()))
        .unwrap();
    third.unbounded_send(ChannelEvent::Opened).unwrap();
    third.unbounded_send(log_frame("shop-api", 1)).unwrap();

    consumer.start("shop-api");

    let view = wait_for(&mut rx, |view| view.accepted_total() == 1).await;
    assert_eq!(view.status(), Some(&StreamStatus::Live));
    assert_eq!(channel.connect_count(), 3);
}

#[tokio::test]
async fn test_drop_releases_connection() {
    let channel = ScriptedChannel::new();
    let tx = channel.accept();
    let consumer = LogStreamConsumer::new(channel, LOG_URL);
    let mut rx = consumer.subscribe();

    consumer.start("shop-api");
    tx.unbounded_send(ChannelEvent::Opened).unwrap();
    wait_for(&mut rx, |view| view.status() == Some(&StreamStatus::Live)).await;

    drop(consumer);

    tokio::time::timeout(Duration::from_secs(2), async {
        while !tx.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("connection was not released");
}
