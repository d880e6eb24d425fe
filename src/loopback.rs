//! An in-process [`Transport`] whose peer is a byte stream in the same program.
//!
//! [`LoopbackTransport::new`] returns the transport together with the [`LoopbackPeer`] that receives everything a
//! session sends through it. Individual transport steps can be made to fail with
//! [`LoopbackTransport::inject_failure`], and [`LoopbackTransport::calls`] counts how often each step was invoked.

use std::collections::{HashMap, HashSet};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, DuplexStream, ReadBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::transport::{OutputChannel, StreamChannel, Transport};
use crate::{Error, PeerAddress, Result};

const BUFFER_CAPACITY: usize = 4096;

/// A step of the [`Transport`] contract, used to inject failures and count calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoopbackStep {
    /// [`Transport::acquire_handle`]
    Acquire,
    /// [`Transport::connect`]
    Connect,
    /// [`Transport::output_channel`]
    Channel,
    /// [`OutputChannel::write`]
    Write,
    /// [`OutputChannel::flush`]
    Flush,
    /// [`Transport::release`]
    Release,
}

#[derive(Debug, Default)]
struct Shared {
    stream: Option<DuplexStream>,
    failures: HashSet<LoopbackStep>,
    calls: HashMap<LoopbackStep, usize>,
}

/// A [`Transport`] connected to an in-memory [`LoopbackPeer`].
///
/// Clones share the same peer, failure set and call counters.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    shared: Arc<Mutex<Shared>>,
}

/// The remote end of a [`LoopbackTransport`]. Reads yield the bytes sent by the session.
///
/// Reads return end-of-stream once the session's socket has been released.
#[derive(Debug)]
pub struct LoopbackPeer {
    stream: DuplexStream,
}

/// Socket handle of a [`LoopbackTransport`]
#[derive(Debug)]
pub struct LoopbackHandle {
    peer: PeerAddress,
    stream: Option<DuplexStream>,
    connected: bool,
}

/// Output stream of a [`LoopbackTransport`]
#[derive(Debug)]
pub struct LoopbackChannel {
    inner: StreamChannel<DuplexStream>,
    shared: Arc<Mutex<Shared>>,
}

impl LoopbackTransport {
    /// Creates a transport and the peer it delivers to.
    pub fn new() -> (Self, LoopbackPeer) {
        let (local, remote) = tokio::io::duplex(BUFFER_CAPACITY);
        let shared = Shared {
            stream: Some(local),
            ..Default::default()
        };
        let transport = LoopbackTransport {
            shared: Arc::new(Mutex::new(shared)),
        };
        (transport, LoopbackPeer { stream: remote })
    }

    /// Makes every subsequent call of `step` fail until [`clear_failure`][Self::clear_failure] is called.
    pub fn inject_failure(&self, step: LoopbackStep) {
        lock(&self.shared).failures.insert(step);
    }

    /// Stops failing `step`.
    pub fn clear_failure(&self, step: LoopbackStep) {
        lock(&self.shared).failures.remove(&step);
    }

    /// How many times `step` has been invoked, including failed invocations.
    pub fn calls(&self, step: LoopbackStep) -> usize {
        lock(&self.shared).calls.get(&step).copied().unwrap_or(0)
    }

    /// Total number of transport calls of any kind.
    pub fn total_calls(&self) -> usize {
        lock(&self.shared).calls.values().sum()
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records a call of `step` and returns an injected error if `step` is set to fail.
fn enter(shared: &Mutex<Shared>, step: LoopbackStep) -> Result<()> {
    let mut shared = lock(shared);
    *shared.calls.entry(step).or_default() += 1;
    if shared.failures.contains(&step) {
        Err(injected(step))
    } else {
        Ok(())
    }
}

fn injected(step: LoopbackStep) -> Error {
    let kind = match step {
        LoopbackStep::Acquire => io::ErrorKind::AddrNotAvailable,
        LoopbackStep::Connect => io::ErrorKind::HostUnreachable,
        LoopbackStep::Channel => io::ErrorKind::NotConnected,
        LoopbackStep::Write | LoopbackStep::Flush => io::ErrorKind::BrokenPipe,
        LoopbackStep::Release => io::ErrorKind::Other,
    };
    io::Error::new(kind, format!("injected {step:?} failure")).into()
}

#[async_trait]
impl Transport for LoopbackTransport {
    type Handle = LoopbackHandle;
    type Channel = LoopbackChannel;

    async fn acquire_handle(&self, peer: &PeerAddress, service: Uuid) -> Result<LoopbackHandle> {
        enter(&self.shared, LoopbackStep::Acquire)?;
        let stream = lock(&self.shared).stream.take().ok_or_else(|| {
            Error::new(
                ErrorKind::NotSupported,
                None,
                "a loopback transport can only be connected once",
            )
        })?;
        debug!("loopback socket for {} ({})", peer, service);
        Ok(LoopbackHandle {
            peer: peer.clone(),
            stream: Some(stream),
            connected: false,
        })
    }

    async fn connect(&self, handle: &mut LoopbackHandle) -> Result<()> {
        enter(&self.shared, LoopbackStep::Connect)?;
        handle.connected = true;
        debug!("loopback connected to {}", handle.peer);
        Ok(())
    }

    async fn output_channel(&self, handle: &mut LoopbackHandle) -> Result<LoopbackChannel> {
        enter(&self.shared, LoopbackStep::Channel)?;
        if !handle.connected {
            return Err(ErrorKind::NotConnected.into());
        }
        let stream = handle
            .stream
            .take()
            .ok_or_else(|| Error::new(ErrorKind::NotConnected, None, "output stream already taken"))?;
        Ok(LoopbackChannel {
            inner: StreamChannel::new(stream),
            shared: self.shared.clone(),
        })
    }

    async fn release(&self, handle: LoopbackHandle) -> Result<()> {
        enter(&self.shared, LoopbackStep::Release)?;
        debug!("loopback socket for {} released", handle.peer);
        Ok(())
    }
}

#[async_trait]
impl OutputChannel for LoopbackChannel {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Err(err) = enter(&self.shared, LoopbackStep::Write) {
            // Deliver a prefix before failing, as a real socket breaking mid-write would.
            let (head, _) = bytes.split_at(bytes.len() / 2);
            self.inner.write(head).await?;
            return Err(err);
        }
        self.inner.write(bytes).await
    }

    async fn flush(&mut self) -> Result<()> {
        enter(&self.shared, LoopbackStep::Flush)?;
        self.inner.flush().await
    }
}

impl AsyncRead for LoopbackPeer {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}
