use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::btuuid::service_label;
use crate::error::ErrorKind;
use crate::transport::{OutputChannel, Transport};
use crate::{Error, PeerAddress, Result};

/// The lifecycle state of a [`SerialSession`]
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// idle
    Idle,
    /// connecting
    Connecting,
    /// connected
    Connected,
    /// closed
    Closed,
}

/// A single outbound serial connection to one peer.
///
/// A session moves through [`SessionState`]s in one direction only: `Idle` → `Connecting` → `Connected` → `Closed`.
/// A closed session cannot be reopened; construct a new one to try again.
///
/// The session imposes no timeouts. [`open`][Self::open] and [`send`][Self::send] wait for as long as the transport
/// does, which for an unreachable peer may be forever. Wrap them in a timeout such as `tokio::time::timeout` if that
/// matters. Dropping an `open` future part-way leaves the session `Connecting`; [`close`][Self::close] then releases
/// whatever the transport had already allocated.
pub struct SerialSession<T: Transport> {
    transport: T,
    state: SessionState,
    peer: Option<PeerAddress>,
    handle: Option<T::Handle>,
    channel: Option<T::Channel>,
}

impl<T: Transport> SerialSession<T> {
    /// Creates an idle session that will connect through `transport`.
    pub fn new(transport: T) -> Self {
        SerialSession {
            transport,
            state: SessionState::Idle,
            peer: None,
            handle: None,
            channel: None,
        }
    }

    /// The current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` if the session can [`send`][Self::send].
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// The peer of the current or most recent connection attempt
    pub fn peer(&self) -> Option<&PeerAddress> {
        self.peer.as_ref()
    }

    /// The transport this session connects through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Connects to `service` on `peer`.
    ///
    /// Only valid on an `Idle` session; any other state fails with [`ErrorKind::InvalidState`] without touching the
    /// transport. Each step reports its own error kind: [`ErrorKind::HandleCreationFailed`],
    /// [`ErrorKind::ConnectFailed`] or [`ErrorKind::ChannelUnavailable`]. After any failure the session is `Closed`
    /// and the socket has been released. A failure to release it is attached to the returned error as
    /// [`suppressed`][Error::suppressed].
    pub async fn open(&mut self, peer: &PeerAddress, service: Uuid) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::invalid_state("open", self.state));
        }

        debug!("connecting to service {} on {}", service_label(&service), peer);
        self.state = SessionState::Connecting;
        self.peer = Some(peer.clone());

        let acquired = self.transport.acquire_handle(peer, service).await;
        let handle = match acquired {
            Ok(handle) => self.handle.insert(handle),
            Err(err) => {
                let err = Error::wrap(ErrorKind::HandleCreationFailed, err, format!("socket for {peer}"));
                return Err(self.abort(err).await);
            }
        };

        let connected = self.transport.connect(handle).await;
        if let Err(err) = connected {
            let err = Error::wrap(ErrorKind::ConnectFailed, err, format!("connecting to {peer}"));
            return Err(self.abort(err).await);
        }
        debug!("connection established to {}", peer);

        let channel = self.transport.output_channel(handle).await;
        match channel {
            Ok(channel) => self.channel = Some(channel),
            Err(err) => {
                let err = Error::wrap(ErrorKind::ChannelUnavailable, err, format!("output stream for {peer}"));
                return Err(self.abort(err).await);
            }
        }

        self.state = SessionState::Connected;
        info!("serial session to {} opened", peer);
        Ok(())
    }

    /// Writes all of `bytes` to the peer.
    ///
    /// Only valid on a `Connected` session; any other state fails with [`ErrorKind::InvalidState`] without touching
    /// the transport. A failed write returns [`ErrorKind::WriteFailed`] and leaves the session connected: part of
    /// `bytes` may already have been delivered, and it is up to the caller to retry or [`close`][Self::close].
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let channel = match (self.state, self.channel.as_mut()) {
            (SessionState::Connected, Some(channel)) => channel,
            (state, _) => return Err(Error::invalid_state("send", state)),
        };

        trace!("sending {} bytes", bytes.len());
        channel.write(bytes).await.map_err(|err| {
            warn!("write of {} bytes failed: {}", bytes.len(), err);
            Error::wrap(ErrorKind::WriteFailed, err, format!("{} bytes", bytes.len()))
        })
    }

    /// Flushes and releases the connection.
    ///
    /// Both steps are attempted even if the first fails, and the session is `Closed` afterwards regardless. If either
    /// step failed the first failure is returned ([`ErrorKind::FlushFailed`] or [`ErrorKind::ReleaseFailed`]) with
    /// any second failure attached as [`suppressed`][Error::suppressed]. An `Err` from `close` never means the session
    /// is still open: it reports cleanup that went wrong on a session that is now `Closed`. Closing a `Closed` session
    /// does nothing and succeeds.
    ///
    /// If a `close` future is dropped part-way, the session stays in its previous state and a later `close` releases
    /// whatever is left. The output stream is not flushed a second time.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            trace!("session already closed");
            return Ok(());
        }

        let mut failures = Vec::new();

        if let Some(mut channel) = self.channel.take() {
            if let Err(err) = channel.flush().await {
                warn!("failed to flush output stream: {}", err);
                failures.push(Error::wrap(ErrorKind::FlushFailed, err, String::new()));
            }
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = self.transport.release(handle).await {
                warn!("failed to close socket: {}", err);
                failures.push(Error::wrap(ErrorKind::ReleaseFailed, err, String::new()));
            }
        }

        let previous = std::mem::replace(&mut self.state, SessionState::Closed);
        match &self.peer {
            Some(peer) if previous != SessionState::Idle => info!("serial session to {} closed", peer),
            _ => debug!("idle session closed"),
        }

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some(mut err) => {
                failures.for_each(|other| err.suppress(other));
                Err(err)
            }
        }
    }

    async fn abort(&mut self, mut err: Error) -> Error {
        self.state = SessionState::Closed;
        self.channel = None;

        if let Some(handle) = self.handle.take() {
            if let Err(release_err) = self.transport.release(handle).await {
                warn!("failed to close socket after failed open: {}", release_err);
                err.suppress(Error::wrap(ErrorKind::ReleaseFailed, release_err, String::new()));
            }
        }

        warn!("open failed: {}", err);
        err
    }
}

impl<T: Transport> Drop for SerialSession<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("serial session dropped while {}; socket was not closed cleanly", self.state);
        }
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for SerialSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("transport", &self.transport)
            .field("state", &self.state)
            .field("peer", &self.peer)
            .finish()
    }
}
