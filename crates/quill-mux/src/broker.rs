//! Channel multiplexing over one physical stream.
//!
//! The broker owns the stream and is its sole arbiter: a single writer task
//! serializes all outbound frames, a single reader task routes all inbound
//! frames by channel id. Either side can allocate a fresh id with
//! [`Broker::next_id`], announce it to the peer, and then [`Broker::listen`]
//! for the peer to connect or [`Broker::dial`] a peer-announced id. The
//! listen/dial rendezvous tolerates either side arriving first.
//!
//! Closing the transport is the only teardown mechanism: it unblocks every
//! pending accept, dial, and receive on both sides with an error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use quill_proto::frame::{Frame, PRIMARY_CHANNEL};

use crate::channel::{Channel, ChannelReceiver, ChannelSender};
use crate::error::MuxError;

/// How long a dial waits for the peer to listen before giving up.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound frame queue depth; one queue per broker.
const FRAME_QUEUE: usize = 64;

/// Inbound payload queue depth; one queue per channel.
const CHANNEL_QUEUE: usize = 64;

/// Per-id rendezvous state.
enum Slot {
    /// Local `listen()` registered; `accept()` may be waiting.
    Listening {
        waiter: oneshot::Sender<Channel>,
    },
    /// The peer dialed before we listened.
    PendingOpen,
    /// Local `dial()` in flight; the inbound pipe is wired up front so data
    /// arriving right after the ack is never lost.
    Dialing {
        ack: oneshot::Sender<()>,
        data_tx: mpsc::Sender<Value>,
    },
    /// Established.
    Open {
        data_tx: mpsc::Sender<Value>,
    },
}

struct Shared {
    frames: mpsc::Sender<Frame>,
    channels: Mutex<HashMap<u32, Slot>>,
    next_id: AtomicU32,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl Shared {
    /// Tears down every channel. Idempotent.
    fn shutdown_now(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.cancel();
        // Dropping the slots drops waiters, acks, and data senders, which
        // unblocks every pending accept, dial, and recv with an error.
        self.channels.lock().clear();
    }

    /// Wires up an established channel for `id` and acks the peer's open.
    async fn establish(&self, id: u32) -> Result<Channel, MuxError> {
        let (data_tx, data_rx) = mpsc::channel(CHANNEL_QUEUE);
        self.channels.lock().insert(id, Slot::Open { data_tx });
        self.frames
            .send(Frame::OpenAck { id })
            .await
            .map_err(|_| MuxError::TransportClosed)?;
        Ok(Channel::new(
            ChannelSender::new(id, self.frames.clone()),
            ChannelReceiver::new(id, data_rx),
        ))
    }

    async fn route(&self, frame: Frame) {
        match frame {
            Frame::Data { id, payload } => {
                let data_tx = match self.channels.lock().get(&id) {
                    Some(Slot::Open { data_tx } | Slot::Dialing { data_tx, .. }) => {
                        Some(data_tx.clone())
                    }
                    _ => None,
                };
                match data_tx {
                    // Receiver gone means the local user dropped the channel;
                    // the payload is discarded.
                    Some(tx) => drop(tx.send(payload).await),
                    None => tracing::warn!(channel = id, "data frame for unknown channel"),
                }
            }
            Frame::Open { id } => {
                let waiter = {
                    let mut map = self.channels.lock();
                    match map.remove(&id) {
                        Some(Slot::Listening { waiter }) => Some(waiter),
                        Some(other) => {
                            tracing::warn!(channel = id, "open for channel already in use");
                            map.insert(id, other);
                            return;
                        }
                        None => {
                            // Peer dialed first; park the open until listen().
                            map.insert(id, Slot::PendingOpen);
                            None
                        }
                    }
                };
                if let Some(waiter) = waiter {
                    match self.establish(id).await {
                        // An abandoned accept still leaves the channel open;
                        // the peer tears it down when its traffic goes nowhere.
                        Ok(channel) => drop(waiter.send(channel)),
                        Err(e) => tracing::debug!(channel = id, error = %e, "establish failed"),
                    }
                }
            }
            Frame::OpenAck { id } => {
                let ack = {
                    let mut map = self.channels.lock();
                    match map.remove(&id) {
                        Some(Slot::Dialing { ack, data_tx }) => {
                            map.insert(id, Slot::Open { data_tx });
                            Some(ack)
                        }
                        Some(other) => {
                            map.insert(id, other);
                            None
                        }
                        None => None,
                    }
                };
                match ack {
                    Some(ack) => drop(ack.send(())),
                    None => tracing::warn!(channel = id, "unexpected open_ack"),
                }
            }
            Frame::Close { id } => {
                if self.channels.lock().remove(&id).is_none() {
                    tracing::debug!(channel = id, "close for unknown channel");
                }
            }
        }
    }
}

/// Multiplexes one physical connection into logical channels.
///
/// Cheap to clone; all clones share the same transport.
#[derive(Clone)]
pub struct Broker {
    shared: Arc<Shared>,
}

impl Broker {
    /// Takes ownership of a physical stream and returns the broker together
    /// with the pre-established primary channel (id 0).
    ///
    /// Both sides of a connection construct their broker the same way; the
    /// primary channels pair up implicitly.
    pub fn new<T>(io: T) -> (Self, Channel)
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(io);
        let (frames_tx, frames_rx) = mpsc::channel(FRAME_QUEUE);
        let shared = Arc::new(Shared {
            frames: frames_tx.clone(),
            channels: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(PRIMARY_CHANNEL + 1),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        });

        let (data_tx, data_rx) = mpsc::channel(CHANNEL_QUEUE);
        shared
            .channels
            .lock()
            .insert(PRIMARY_CHANNEL, Slot::Open { data_tx });
        let primary = Channel::new(
            ChannelSender::new(PRIMARY_CHANNEL, frames_tx),
            ChannelReceiver::new(PRIMARY_CHANNEL, data_rx),
        );

        tokio::spawn(write_loop(write_half, frames_rx, shared.shutdown.clone()));
        tokio::spawn(read_loop(read_half, Arc::clone(&shared)));

        (Self { shared }, primary)
    }

    /// Allocates a fresh channel id, unique on this side of the connection.
    ///
    /// IDs are not globally unique across processes; by convention only the
    /// side that needs a new callback channel allocates and announces one.
    pub fn next_id(&self) -> u32 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns true once the transport has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Registers intent to accept exactly one connection on `id`.
    ///
    /// If the peer's open already arrived, the returned listener is ready
    /// immediately; the rendezvous tolerates either order.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::ChannelInUse`] if `id` is already listening,
    /// dialing, or established, and [`MuxError::TransportClosed`] if the
    /// broker has shut down.
    pub async fn listen(&self, id: u32) -> Result<Listener, MuxError> {
        if self.is_closed() {
            return Err(MuxError::TransportClosed);
        }
        let pending = {
            let mut map = self.shared.channels.lock();
            match map.remove(&id) {
                None => {
                    let (waiter, rx) = oneshot::channel();
                    map.insert(id, Slot::Listening { waiter });
                    Some(rx)
                }
                Some(Slot::PendingOpen) => None,
                Some(other) => {
                    map.insert(id, other);
                    return Err(MuxError::ChannelInUse(id));
                }
            }
        };
        let state = match pending {
            Some(rx) => ListenerState::Pending(rx),
            None => ListenerState::Ready(self.shared.establish(id).await?),
        };
        Ok(Listener { id, state })
    }

    /// Cancels a registered listener, failing its pending accept.
    ///
    /// No-op if the channel was already established or never listening.
    pub fn unlisten(&self, id: u32) {
        let mut map = self.shared.channels.lock();
        if matches!(map.get(&id), Some(Slot::Listening { .. })) {
            map.remove(&id);
        }
    }

    /// Dials a peer-announced channel id with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`Broker::dial_timeout`].
    pub async fn dial(&self, id: u32) -> Result<Channel, MuxError> {
        self.dial_timeout(id, DEFAULT_DIAL_TIMEOUT).await
    }

    /// Dials a peer-announced channel id, waiting at most `wait` for the
    /// peer's listener.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::DialTimeout`] if the peer never listens within
    /// `wait`, [`MuxError::ChannelInUse`] if `id` is already taken locally,
    /// and [`MuxError::TransportClosed`] if the transport dies first.
    pub async fn dial_timeout(&self, id: u32, wait: Duration) -> Result<Channel, MuxError> {
        if self.is_closed() {
            return Err(MuxError::TransportClosed);
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        let (data_tx, data_rx) = mpsc::channel(CHANNEL_QUEUE);
        {
            let mut map = self.shared.channels.lock();
            if map.contains_key(&id) {
                return Err(MuxError::ChannelInUse(id));
            }
            map.insert(
                id,
                Slot::Dialing {
                    ack: ack_tx,
                    data_tx,
                },
            );
        }
        if self
            .shared
            .frames
            .send(Frame::Open { id })
            .await
            .is_err()
        {
            self.abandon_dial(id);
            return Err(MuxError::TransportClosed);
        }
        match tokio::time::timeout(wait, ack_rx).await {
            Ok(Ok(())) => Ok(Channel::new(
                ChannelSender::new(id, self.shared.frames.clone()),
                ChannelReceiver::new(id, data_rx),
            )),
            Ok(Err(_)) => {
                self.abandon_dial(id);
                Err(MuxError::TransportClosed)
            }
            Err(_) => {
                self.abandon_dial(id);
                Err(MuxError::DialTimeout(id))
            }
        }
    }

    /// Closes the transport, unblocking all pending operations on this side
    /// and, once the stream drops, on the peer as well.
    pub fn close(&self) {
        self.shared.shutdown_now();
    }

    fn abandon_dial(&self, id: u32) {
        let mut map = self.shared.channels.lock();
        if matches!(map.get(&id), Some(Slot::Dialing { .. })) {
            map.remove(&id);
        }
    }
}

/// Pending-accept handle returned by [`Broker::listen`].
pub struct Listener {
    id: u32,
    state: ListenerState,
}

enum ListenerState {
    Ready(Channel),
    Pending(oneshot::Receiver<Channel>),
}

impl Listener {
    /// Returns the channel id this listener accepts on.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Waits for the peer to dial this id.
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::TransportClosed`] as soon as the broker shuts
    /// down or the listener is cancelled; never blocks past transport death.
    pub async fn accept(self) -> Result<Channel, MuxError> {
        match self.state {
            ListenerState::Ready(channel) => Ok(channel),
            ListenerState::Pending(rx) => rx.await.map_err(|_| MuxError::TransportClosed),
        }
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut frames: mpsc::Receiver<Frame>,
    shutdown: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            () = shutdown.cancelled() => break,
            frame = frames.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        let mut line = match serde_json::to_vec(&frame) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "unencodable frame");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = writer.write_all(&line).await {
            tracing::debug!(error = %e, "transport write failed");
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
    // Dropping the write half signals EOF to the peer.
    shutdown.cancel();
}

async fn read_loop<R>(reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let shutdown = shared.shutdown.clone();
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Frame>(&line) {
                    Ok(frame) => shared.route(frame).await,
                    Err(e) => tracing::warn!(error = %e, "discarding unparseable frame"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "transport read failed");
                break;
            }
        }
    }
    shared.shutdown_now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn broker_pair() -> (Broker, Channel, Broker, Channel) {
        let (a, b) = tokio::io::duplex(16 * 1024);
        let (broker_a, primary_a) = Broker::new(a);
        let (broker_b, primary_b) = Broker::new(b);
        (broker_a, primary_a, broker_b, primary_b)
    }

    #[tokio::test]
    async fn primary_channel_is_ready_on_both_sides() {
        let (_broker_a, primary_a, _broker_b, mut primary_b) = broker_pair();

        primary_a.send(json!({"hello": "plugin"})).await.unwrap();
        let got = primary_b.recv().await.unwrap();
        assert_eq!(got["hello"], "plugin");
    }

    #[tokio::test]
    async fn listen_then_dial_exchanges_data_both_ways() {
        let (broker_a, _pa, broker_b, _pb) = broker_pair();

        let id = broker_a.next_id();
        let listener = broker_a.listen(id).await.unwrap();
        let accept = tokio::spawn(listener.accept());

        let dialed = broker_b.dial(id).await.unwrap();
        let mut accepted = accept.await.unwrap().unwrap();

        dialed.send(json!("ping")).await.unwrap();
        assert_eq!(accepted.recv().await.unwrap(), json!("ping"));

        accepted.send(json!("pong")).await.unwrap();
        let mut dialed = dialed;
        assert_eq!(dialed.recv().await.unwrap(), json!("pong"));
    }

    #[tokio::test]
    async fn dial_before_listen_rendezvous() {
        let (broker_a, _pa, broker_b, _pb) = broker_pair();

        let id = 42;
        let dial = tokio::spawn({
            let broker_b = broker_b.clone();
            async move { broker_b.dial(id).await }
        });

        // Let the open frame land before anyone listens.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let listener = broker_a.listen(id).await.unwrap();
        let mut accepted = listener.accept().await.unwrap();
        let dialed = dial.await.unwrap().unwrap();

        dialed.send(json!(1)).await.unwrap();
        assert_eq!(accepted.recv().await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn dial_without_listener_times_out() {
        let (_broker_a, _pa, broker_b, _pb) = broker_pair();

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            broker_b.dial_timeout(99, Duration::from_millis(100)),
        )
        .await
        .expect("dial must fail within a bounded wait");

        assert!(matches!(result, Err(MuxError::DialTimeout(99))));
    }

    #[tokio::test]
    async fn duplicate_listen_is_rejected() {
        let (broker_a, _pa, _broker_b, _pb) = broker_pair();

        let _listener = broker_a.listen(7).await.unwrap();
        assert!(matches!(
            broker_a.listen(7).await,
            Err(MuxError::ChannelInUse(7))
        ));
    }

    #[tokio::test]
    async fn close_unblocks_pending_accept() {
        let (broker_a, _pa, _broker_b, _pb) = broker_pair();

        let listener = broker_a.listen(5).await.unwrap();
        let accept = tokio::spawn(listener.accept());

        broker_a.close();

        let result = tokio::time::timeout(Duration::from_secs(1), accept)
            .await
            .expect("accept must unblock on close")
            .unwrap();
        assert!(matches!(result, Err(MuxError::TransportClosed)));
    }

    #[tokio::test]
    async fn close_propagates_to_peer() {
        let (broker_a, _pa, _broker_b, mut primary_b) = broker_pair();

        broker_a.close();

        let result = tokio::time::timeout(Duration::from_secs(1), primary_b.recv())
            .await
            .expect("peer recv must unblock once the stream drops");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unlisten_fails_pending_accept() {
        let (broker_a, _pa, _broker_b, _pb) = broker_pair();

        let listener = broker_a.listen(11).await.unwrap();
        let accept = tokio::spawn(listener.accept());
        broker_a.unlisten(11);

        let result = accept.await.unwrap();
        assert!(result.is_err());

        // The id is free again afterwards.
        let _listener = broker_a.listen(11).await.unwrap();
    }

    #[tokio::test]
    async fn channel_close_ends_peer_receive() {
        let (broker_a, _pa, broker_b, _pb) = broker_pair();

        let id = broker_a.next_id();
        let listener = broker_a.listen(id).await.unwrap();
        let accept = tokio::spawn(listener.accept());
        let dialed = broker_b.dial(id).await.unwrap();
        let mut accepted = accept.await.unwrap().unwrap();

        let (sender, _keep) = dialed.split();
        sender.send(json!("last")).await.unwrap();
        sender.close().await.unwrap();

        // The in-flight payload is delivered, then the channel ends; the
        // transport itself stays alive.
        assert_eq!(accepted.recv().await.unwrap(), json!("last"));
        let result = tokio::time::timeout(Duration::from_secs(1), accepted.recv())
            .await
            .expect("recv must end after the peer closes the channel");
        assert!(matches!(result, Err(MuxError::ChannelClosed(_))));
        assert!(!broker_a.is_closed());
        assert!(!broker_b.is_closed());
    }

    #[tokio::test]
    async fn next_id_is_monotonic() {
        let (broker_a, _pa, _broker_b, _pb) = broker_pair();
        let first = broker_a.next_id();
        let second = broker_a.next_id();
        assert!(second > first);
        assert!(first > PRIMARY_CHANNEL);
    }
}
