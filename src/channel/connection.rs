//! Per-attempt connection task and the reconnect timer.
//!
//! Both report back to the manager through [`ChannelEvent`]s tagged with the
//! generation they were started for. Neither touches manager state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};
use url::Url;

use super::endpoint::redacted;
use super::transport::Connector;

#[derive(Debug)]
pub(super) enum ChannelEvent {
    Opened { generation: u64 },
    Frame { generation: u64, text: String },
    Closed { generation: u64 },
    RetryDue { generation: u64 },
}

impl ChannelEvent {
    pub(super) fn generation(&self) -> u64 {
        match self {
            ChannelEvent::Opened { generation }
            | ChannelEvent::Frame { generation, .. }
            | ChannelEvent::Closed { generation }
            | ChannelEvent::RetryDue { generation } => *generation,
        }
    }
}

/// Owner side of one connection attempt. Dropping it closes the connection.
pub(super) struct ConnectionHandle {
    shutdown: Option<oneshot::Sender<()>>,
    _task: JoinHandle<()>,
}

impl ConnectionHandle {
    pub(super) fn spawn(
        connector: Arc<dyn Connector>,
        url: Url,
        generation: u64,
        ping_interval: Duration,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_connection(
            connector,
            url,
            generation,
            ping_interval,
            events,
            shutdown_rx,
        ));
        ConnectionHandle {
            shutdown: Some(shutdown_tx),
            _task: task,
        }
    }

    /// Ask the task to close the socket. It exits without reporting `Closed`.
    pub(super) fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn run_connection(
    connector: Arc<dyn Connector>,
    url: Url,
    generation: u64,
    ping_interval: Duration,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let shown = redacted(&url);

    let mut stream = tokio::select! {
        res = connector.connect(&url) => match res {
            Ok(stream) => stream,
            Err(e) => {
                error!("[feed#{}] Connection to {} failed: {}", generation, shown, e);
                let _ = events.send(ChannelEvent::Closed { generation });
                return;
            }
        },
        _ = &mut shutdown => {
            debug!("[feed#{}] Cancelled while connecting to {}", generation, shown);
            return;
        }
    };

    if events.send(ChannelEvent::Opened { generation }).is_err() {
        stream.close().await;
        return;
    }

    // A half-open socket never yields a frame or an error on read; only a
    // failed write reveals it.
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = stream.next_frame() => match frame {
                Some(Ok(text)) => {
                    if events.send(ChannelEvent::Frame { generation, text }).is_err() {
                        stream.close().await;
                        return;
                    }
                }
                Some(Err(e)) => {
                    error!("[feed#{}] Transport error on {}: {}", generation, shown, e);
                    break;
                }
                None => {
                    warn!("[feed#{}] Server closed {}", generation, shown);
                    break;
                }
            },
            _ = ping.tick() => {
                if let Err(e) = stream.ping().await {
                    error!("[feed#{}] Ping to {} failed: {}", generation, shown, e);
                    break;
                }
            }
            _ = &mut shutdown => {
                debug!("[feed#{}] Closing {}", generation, shown);
                stream.close().await;
                return;
            }
        }
    }

    let _ = events.send(ChannelEvent::Closed { generation });
}

/// A single pending reconnect. Dropping it cancels the timer.
pub(super) struct RetryTimer {
    task: JoinHandle<()>,
}

impl RetryTimer {
    pub(super) fn spawn(
        delay: Duration,
        generation: u64,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ChannelEvent::RetryDue { generation });
        });
        RetryTimer { task }
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
