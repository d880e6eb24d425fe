//! Connects to a Serial Port Profile server, sends two lines and disconnects.
//!
//! Usage: `cargo run --example spp_hello -- 20:17:01:04:22:27`
//!
//! Set `SPP_CONNECT_TIMEOUT_SECS` to give up on an unreachable peer instead of waiting indefinitely.

use std::error::Error;

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    use std::time::Duration;

    use spp_session::{btuuid, BluezOptions, BluezTransport, PeerAddress, SerialSession};
    use tracing::metadata::LevelFilter;
    use tracing::{error, info};

    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let peer: PeerAddress = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("00:00:00:00:00:00")
        .parse()?;
    if peer.is_unset() {
        error!("no server address given; pass the address of your SPP server as the first argument");
        return Err("peer address is 00:00:00:00:00:00".into());
    }

    let timeout = std::env::var("SPP_CONNECT_TIMEOUT_SECS")
        .ok()
        .map(|secs| secs.parse().map(Duration::from_secs))
        .transpose()?;

    let transport = BluezTransport::new(BluezOptions::default()).await?;
    info!("using adapter {}", transport.adapter_name());

    let mut session = SerialSession::new(transport);

    info!("attempting client connect to {}", peer);
    let open = session.open(&peer, btuuid::services::SERIAL_PORT);
    let opened = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, open)
            .await
            .unwrap_or_else(|_| Err(spp_session::error::ErrorKind::Timeout.into())),
        None => open.await,
    };
    if let Err(err) = opened {
        error!("connect failed: {}", err);
        error!(
            "check that the SPP UUID {} exists on the server",
            btuuid::services::SERIAL_PORT
        );
        session.close().await?;
        return Err(err.into());
    }
    info!("connection established and data link opened");

    let mut result = session.send(b"Hello, Jason the \n").await;
    if result.is_ok() {
        tokio::time::sleep(Duration::from_millis(500)).await;
        result = session.send(b"great!!!\n").await;
    }
    if let Err(err) = &result {
        error!("write failed: {}", err);
    }

    session.close().await?;
    info!("disconnected");

    Ok(result?)
}

#[cfg(not(target_os = "linux"))]
fn main() -> Result<(), Box<dyn Error>> {
    Err("this example requires BlueZ (Linux)".into())
}
