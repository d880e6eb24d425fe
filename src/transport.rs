//! The platform socket abstraction a [`SerialSession`][crate::SerialSession] drives.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::{PeerAddress, Result};

/// A provider of reliable, connection-oriented byte-stream sockets, such as the platform's RFCOMM sockets.
///
/// A [`SerialSession`][crate::SerialSession] calls these methods in a fixed order: [`acquire_handle`][Self::acquire_handle],
/// [`connect`][Self::connect], [`output_channel`][Self::output_channel] and finally [`release`][Self::release]. Every
/// handle that was successfully acquired is passed to `release` exactly once, unless the session is dropped before it
/// is closed, in which case the handle is simply dropped.
#[async_trait]
pub trait Transport: Send + Sync {
    /// An unconnected or connected socket bound to one peer and service.
    type Handle: Send;

    /// The writable stream of a connected socket.
    type Channel: OutputChannel;

    /// Allocates a socket bound to `peer` and `service`. Does not start connecting.
    async fn acquire_handle(&self, peer: &PeerAddress, service: Uuid) -> Result<Self::Handle>;

    /// Performs the connect handshake. May wait indefinitely for an unreachable peer.
    async fn connect(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Returns the writable stream of a connected socket.
    async fn output_channel(&self, handle: &mut Self::Handle) -> Result<Self::Channel>;

    /// Closes the socket.
    async fn release(&self, handle: Self::Handle) -> Result<()>;
}

/// The writable half of a connected socket
#[async_trait]
pub trait OutputChannel: Send {
    /// Writes all of `bytes`.
    ///
    /// On error, some prefix of `bytes` may already have been transmitted.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Waits until all buffered bytes have been handed to the transport.
    async fn flush(&mut self) -> Result<()>;
}

/// An [`OutputChannel`] over any tokio [`AsyncWrite`] stream.
#[derive(Debug)]
pub struct StreamChannel<W> {
    writer: W,
}

impl<W> StreamChannel<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        StreamChannel { writer }
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the channel, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> OutputChannel for StreamChannel<W> {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn stream_channel_writes_everything() {
        let (local, mut remote) = tokio::io::duplex(4);
        let mut channel = StreamChannel::new(local);

        let reader = tokio::spawn(async move {
            let mut received = Vec::new();
            remote.read_to_end(&mut received).await.map(|_| received)
        });

        channel.write(b"longer than the duplex buffer").await.unwrap();
        channel.flush().await.unwrap();
        drop(channel);

        assert_eq!(reader.await.unwrap().unwrap(), b"longer than the duplex buffer");
    }
}
