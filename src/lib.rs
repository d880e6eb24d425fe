#![warn(missing_docs)]

//! A small library for Bluetooth [Serial Port Profile] (SPP) sessions in [Rust]: open an RFCOMM connection to one
//! known peer, write bytes to it, close it.
//!
//! The crate does not discover devices, manage pairing or frame messages. It owns exactly one thing, the lifecycle of
//! a single outbound connection, and makes that lifecycle explicit: a [`SerialSession`] is opened once, can be written
//! to while connected, and is closed exactly once. Everything platform-specific sits behind the [`Transport`] trait.
//!
//! [Rust]: https://www.rust-lang.org/
//! [Serial Port Profile]: https://www.bluetooth.com/specifications/specs/serial-port-profile-1-2/
//!
//! # Usage
//!
//! ```rust
//!# use spp_session::loopback::LoopbackTransport;
//!# use spp_session::{btuuid, PeerAddress, SerialSession};
//!# use tokio::io::AsyncReadExt;
//!# #[tokio::main]
//!# async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!let (transport, mut peer) = LoopbackTransport::new();
//!let mut session = SerialSession::new(transport);
//!
//!let addr: PeerAddress = "AA:BB:CC:DD:EE:FF".parse()?;
//!session.open(&addr, btuuid::services::SERIAL_PORT).await?;
//!session.send(b"Hello, Jason the \n").await?;
//!session.send(b"great!!!\n").await?;
//!session.close().await?;
//!
//!let mut received = String::new();
//!peer.read_to_string(&mut received).await?;
//!assert_eq!(received, "Hello, Jason the \ngreat!!!\n");
//!#
//!#    Ok(())
//!# }
//! ```
//!
//! # Overview
//!
//! - [`SerialSession`] drives a connection through `Idle` → `Connecting` → `Connected` → `Closed`:
//!   - [Opening][SerialSession::open] acquires a socket, connects it and takes its output stream
//!   - [Sending][SerialSession::send] writes raw bytes
//!   - [Closing][SerialSession::close] flushes and releases, always ending `Closed`
//! - [`Transport`] and [`OutputChannel`] are the seam to the platform socket API
//! - [`loopback::LoopbackTransport`] is an in-memory transport for tests and demos
//! - `BluezTransport` (Linux only) opens real RFCOMM sockets through BlueZ
//!
//! # Errors
//!
//! Every failure carries an [`ErrorKind`][error::ErrorKind] naming the step that failed, with the platform's own
//! error available as its [`source`][std::error::Error::source]. Failures that happen while cleaning up after another
//! failure are not dropped: they are logged and attached to the primary error as
//! [`suppressed`][Error::suppressed] errors.
//!
//! # Timeouts
//!
//! No operation times out on its own. Connecting to a peer that is out of range may wait for as long as the platform
//! stack does. Wrap calls in `tokio::time::timeout` (or your runtime's equivalent) to bound them, then
//! [`close`][SerialSession::close] the session.
//!
//! # Logging
//!
//! The crate logs through [`tracing`](https://docs.rs/tracing). State transitions are logged at `debug`/`info`,
//! failures that are recorded but not returned at `warn`.
//!
//! # Feature flags
//!
//! The `serde` feature is available to enable serializing/deserializing peer addresses and session states.
//!
//! # Examples
//!
//! Examples demonstrating basic usage are available in the `demos` folder.

pub mod btuuid;
pub mod error;
pub mod loopback;
pub mod transport;

mod address;
mod session;

#[cfg(target_os = "linux")]
mod bluer;

pub use address::PeerAddress;
pub use btuuid::BluetoothUuidExt;
pub use error::Error;
pub use session::{SerialSession, SessionState};
pub use transport::{OutputChannel, StreamChannel, Transport};
pub use uuid::Uuid;

#[cfg(target_os = "linux")]
pub use crate::bluer::rfcomm::{BluezHandle, BluezOptions, BluezTransport};

/// Convenience alias for a result with [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;
