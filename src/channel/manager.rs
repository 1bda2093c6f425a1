//! The channel manager: at most one live feed connection, shared by every
//! consumer of that feed.
//!
//! Architecture:
//! ```text
//!  ChannelManager (cloneable handle)
//!      │  Command::{Subscribe, Unsubscribe, Shutdown}
//!      ▼
//!  ManagerActor (one task, owns all state)  ◀── ChannelEvent ──  connection task
//!      │  watch::Sender<Option<Snapshot>>   ◀── ChannelEvent ──  retry timer
//!      ▼
//!  FeedSubscription (watch::Receiver)
//! ```
//!
//! Every connection attempt gets a fresh generation number. Events from a
//! connection or timer whose generation is no longer current are dropped, so
//! a superseded socket can never publish, close, or reconnect the active feed.

#![allow(dead_code)]

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use url::Url;

use super::connection::{ChannelEvent, ConnectionHandle, RetryTimer};
use super::endpoint::{feed_url, redacted};
use super::error::ChannelError;
use super::transport::Connector;
use crate::feed::{decode_frame, Snapshot};

/// Fixed delay between an unexpected close and the next connection attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// How often an open connection is pinged. A failed ping counts as a close.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    ClosedPendingRetry,
}

/// Observable state of the manager's single feed slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub path: Option<String>,
    pub state: ChannelState,
    pub subscribers: usize,
}

impl ChannelStatus {
    fn disconnected() -> Self {
        ChannelStatus {
            path: None,
            state: ChannelState::Disconnected,
            subscribers: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Base endpoint, e.g. `ws://localhost:8080`
    pub base_url: String,
    pub retry_delay: Duration,
    pub ping_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            base_url: "ws://localhost:8080".to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

enum Command {
    Subscribe {
        path: String,
        credential: Option<String>,
        url: Url,
        reply: oneshot::Sender<Joined>,
    },
    Unsubscribe {
        path: String,
        /// Only drop a subscriber of this particular feed instance
        feed_id: Option<u64>,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct Joined {
    feed_id: u64,
    snapshots: watch::Receiver<Option<Snapshot>>,
}

/// Handle to the channel manager. Cheap to clone; all clones drive the same
/// actor. The actor stops once every handle is dropped or [`shutdown`] is
/// called.
///
/// [`shutdown`]: ChannelManager::shutdown
#[derive(Clone)]
pub struct ChannelManager {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ChannelStatus>,
    base_url: String,
}

impl ChannelManager {
    /// Spawn the manager actor. Must be called inside a tokio runtime.
    pub fn new(config: ManagerConfig, connector: Arc<dyn Connector>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ChannelStatus::disconnected());
        let base_url = config.base_url.clone();

        let (actor, events_rx) = ManagerActor::new(config, connector, status_tx);
        tokio::spawn(actor.run(commands_rx, events_rx));

        ChannelManager {
            commands: commands_tx,
            status: status_rx,
            base_url,
        }
    }

    /// Register interest in a feed and get a live view of its latest snapshot.
    ///
    /// Reuses the active connection when it already serves `path` with the
    /// same credential; otherwise the active feed (if any) is torn down and a
    /// new connection is started.
    pub async fn subscribe(
        &self,
        path: &str,
        credential: Option<&str>,
    ) -> Result<FeedSubscription, ChannelError> {
        let url = feed_url(&self.base_url, path, credential)?;
        let path = normalize_path(path);
        let credential = credential.filter(|c| !c.is_empty()).map(str::to_string);

        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Subscribe {
                path: path.clone(),
                credential,
                url,
                reply,
            })
            .map_err(|_| ChannelError::ManagerClosed)?;
        let joined = reply_rx.await.map_err(|_| ChannelError::ManagerClosed)?;

        Ok(FeedSubscription {
            path,
            feed_id: joined.feed_id,
            snapshots: joined.snapshots,
        })
    }

    /// Drop one subscriber of `path`. The connection is closed once no
    /// subscribers remain. A no-op when `path` is not the active feed.
    pub async fn unsubscribe(&self, path: &str) {
        self.send_unsubscribe(normalize_path(path), None).await;
    }

    /// Give back a subscription. Unlike [`unsubscribe`](Self::unsubscribe)
    /// this only counts against the feed the subscription was issued for, so
    /// a consumer whose feed was superseded cannot release a newer feed that
    /// happens to use the same path.
    pub async fn release(&self, subscription: FeedSubscription) {
        self.send_unsubscribe(subscription.path, Some(subscription.feed_id))
            .await;
    }

    async fn send_unsubscribe(&self, path: String, feed_id: Option<u64>) {
        let (reply, reply_rx) = oneshot::channel();
        let cmd = Command::Unsubscribe {
            path,
            feed_id,
            reply,
        };
        if self.commands.send(cmd).is_ok() {
            let _ = reply_rx.await;
        }
    }

    /// Tear down the active feed and stop the actor.
    pub async fn shutdown(&self) {
        let (reply, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = reply_rx.await;
        }
    }

    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }
}

/// A consumer's view of one feed.
#[derive(Clone)]
pub struct FeedSubscription {
    path: String,
    feed_id: u64,
    snapshots: watch::Receiver<Option<Snapshot>>,
}

impl FeedSubscription {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Latest snapshot, or `None` before the first frame arrives.
    pub fn latest(&self) -> Option<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Wait for a snapshot newer than the last one seen through this handle.
    ///
    /// Fails with [`ChannelError::FeedEnded`] once the feed has been torn down
    /// or superseded; [`latest`](Self::latest) keeps returning the final value.
    pub async fn changed(&mut self) -> Result<(), ChannelError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| ChannelError::FeedEnded)
    }

    pub fn has_changed(&self) -> bool {
        self.snapshots.has_changed().unwrap_or(false)
    }
}

/// `"tennis/centre"` and `"/tennis/centre"` name the same feed.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

struct ActiveFeed {
    /// Generation the feed was created with; stable across reconnects
    feed_id: u64,
    path: String,
    credential: Option<String>,
    url: Url,
    generation: u64,
    subscribers: usize,
    state: ChannelState,
    connection: Option<ConnectionHandle>,
    retry: Option<RetryTimer>,
    snapshots: watch::Sender<Option<Snapshot>>,
}

struct ManagerActor {
    config: ManagerConfig,
    connector: Arc<dyn Connector>,
    events_tx: mpsc::UnboundedSender<ChannelEvent>,
    status_tx: watch::Sender<ChannelStatus>,
    last_generation: u64,
    active: Option<ActiveFeed>,
}

impl ManagerActor {
    fn new(
        config: ManagerConfig,
        connector: Arc<dyn Connector>,
        status_tx: watch::Sender<ChannelStatus>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let actor = ManagerActor {
            config,
            connector,
            events_tx,
            status_tx,
            last_generation: 0,
            active: None,
        };
        (actor, events_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) {
        info!(
            "Channel manager started (base={}, retry_delay={:?})",
            self.config.base_url, self.config.retry_delay
        );

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd).is_break() {
                            break;
                        }
                    }
                    None => {
                        self.teardown();
                        break;
                    }
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }

        info!("Channel manager stopped");
    }

    fn handle_command(&mut self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Subscribe {
                path,
                credential,
                url,
                reply,
            } => self.subscribe(path, credential, url, reply),
            Command::Unsubscribe {
                path,
                feed_id,
                reply,
            } => {
                self.unsubscribe(&path, feed_id);
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                self.teardown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn subscribe(
        &mut self,
        path: String,
        credential: Option<String>,
        url: Url,
        reply: oneshot::Sender<Joined>,
    ) {
        if let Some(feed) = self.active.as_mut() {
            if feed.path == path && feed.credential == credential {
                let joined = Joined {
                    feed_id: feed.feed_id,
                    snapshots: feed.snapshots.subscribe(),
                };
                if reply.send(joined).is_ok() {
                    feed.subscribers += 1;
                    info!("Joined feed {} ({} subscribers)", feed.path, feed.subscribers);
                    self.publish_status();
                }
                return;
            }
            info!("Feed {} superseded by {}", feed.path, path);
        }
        self.teardown();

        let generation = self.next_generation();
        info!("[feed#{}] Connecting to {}", generation, redacted(&url));
        let (snapshots, snapshots_rx) = watch::channel(None);
        let connection = ConnectionHandle::spawn(
            Arc::clone(&self.connector),
            url.clone(),
            generation,
            self.config.ping_interval,
            self.events_tx.clone(),
        );
        self.active = Some(ActiveFeed {
            feed_id: generation,
            path,
            credential,
            url,
            generation,
            subscribers: 1,
            state: ChannelState::Connecting,
            connection: Some(connection),
            retry: None,
            snapshots,
        });

        let joined = Joined {
            feed_id: generation,
            snapshots: snapshots_rx,
        };
        if reply.send(joined).is_err() {
            // Caller went away before receiving its subscription.
            self.teardown();
        }
        self.publish_status();
    }

    fn unsubscribe(&mut self, path: &str, feed_id: Option<u64>) {
        let Some(feed) = self.active.as_mut() else {
            debug!("Unsubscribe from {} with no active feed", path);
            return;
        };
        if feed.path != path {
            debug!("Unsubscribe from {} ignored; active feed is {}", path, feed.path);
            return;
        }
        if feed_id.is_some_and(|id| id != feed.feed_id) {
            debug!("Unsubscribe from superseded instance of {} ignored", path);
            return;
        }

        feed.subscribers = feed.subscribers.saturating_sub(1);
        if feed.subscribers == 0 {
            self.teardown();
        } else {
            info!("Left feed {} ({} subscribers)", feed.path, feed.subscribers);
        }
        self.publish_status();
    }

    fn handle_event(&mut self, event: ChannelEvent) {
        let Some(feed) = self.active.as_mut() else {
            debug!("[feed#{}] Event with no active feed dropped", event.generation());
            return;
        };
        if event.generation() != feed.generation {
            debug!(
                "[feed#{}] Stale event dropped (active generation {})",
                event.generation(),
                feed.generation
            );
            return;
        }

        match event {
            ChannelEvent::Opened { generation } => {
                info!("[feed#{}] Connected to {}", generation, feed.path);
                feed.state = ChannelState::Open;
            }
            ChannelEvent::Frame { generation, text } => match decode_frame(&text) {
                Ok(update) => {
                    feed.snapshots.send_replace(Some(Snapshot::new(update)));
                }
                Err(e) => {
                    warn!("[feed#{}] Malformed frame on {}: {}", generation, feed.path, e);
                }
            },
            ChannelEvent::Closed { generation } => {
                warn!(
                    "[feed#{}] Disconnected from {}; reconnecting in {:?}",
                    generation, feed.path, self.config.retry_delay
                );
                feed.connection = None;
                feed.state = ChannelState::ClosedPendingRetry;
                // Replacing the timer drops (and cancels) any earlier one.
                feed.retry = Some(RetryTimer::spawn(
                    self.config.retry_delay,
                    generation,
                    self.events_tx.clone(),
                ));
            }
            ChannelEvent::RetryDue { generation } => {
                if feed.state != ChannelState::ClosedPendingRetry {
                    debug!("[feed#{}] Retry fired while {:?}", generation, feed.state);
                    return;
                }
                self.last_generation += 1;
                let next = self.last_generation;
                info!(
                    "[feed#{}] Reconnecting to {} ({})",
                    next,
                    feed.path,
                    redacted(&feed.url)
                );
                feed.retry = None;
                feed.generation = next;
                feed.state = ChannelState::Connecting;
                feed.connection = Some(ConnectionHandle::spawn(
                    Arc::clone(&self.connector),
                    feed.url.clone(),
                    next,
                    self.config.ping_interval,
                    self.events_tx.clone(),
                ));
            }
        }
        self.publish_status();
    }

    /// Close the active connection, cancel its timer and forget the feed.
    /// Subscribers' `changed()` starts failing once the snapshot sender drops.
    fn teardown(&mut self) {
        let Some(feed) = self.active.take() else {
            return;
        };
        info!("[feed#{}] Closing feed {}", feed.generation, feed.path);
        if let Some(connection) = feed.connection {
            connection.close();
        }
        drop(feed.retry);
        self.publish_status();
    }

    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn publish_status(&self) {
        let status = match &self.active {
            Some(feed) => ChannelStatus {
                path: Some(feed.path.clone()),
                state: feed.state,
                subscribers: feed.subscribers,
            },
            None => ChannelStatus::disconnected(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
