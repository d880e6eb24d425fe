//! Runs a serial session against the in-memory loopback transport and prints what the peer received.

use std::error::Error;

use spp_session::loopback::{LoopbackStep, LoopbackTransport};
use spp_session::{btuuid, PeerAddress, SerialSession};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing::metadata::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        )
        .init();

    let (transport, mut peer) = LoopbackTransport::new();
    let reader = tokio::spawn(async move {
        let mut received = String::new();
        peer.read_to_string(&mut received).await.map(|_| received)
    });

    let mut session = SerialSession::new(transport.clone());
    let addr: PeerAddress = "20:17:01:04:22:27".parse()?;
    session.open(&addr, btuuid::services::SERIAL_PORT).await?;
    session.send(b"Hello, Jason the \n").await?;
    session.send(b"great!!!\n").await?;
    session.close().await?;

    info!(
        "transport calls: flush={} release={}",
        transport.calls(LoopbackStep::Flush),
        transport.calls(LoopbackStep::Release)
    );
    info!("peer received {:?}", reader.await??);

    Ok(())
}
