#![allow(clippy::let_unit_value)]

use spp_session::loopback::{LoopbackChannel, LoopbackHandle, LoopbackTransport};
use spp_session::*;

fn assert_send<T: Send>(t: T) -> T {
    t
}

#[cfg(feature = "serde")]
#[allow(unused)]
fn check_serde_apis() {
    fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}

    assert_serde::<PeerAddress>();
    assert_serde::<SessionState>();
}

async fn check_session_apis<T: Transport>(mut session: SerialSession<T>, peer: PeerAddress) -> Result<()> {
    let _state: SessionState = session.state();
    let _connected: bool = session.is_connected();
    let _peer: Option<&PeerAddress> = session.peer();
    let _transport: &T = session.transport();

    let _res: Result<()> = assert_send(session.open(&peer, btuuid::services::SERIAL_PORT)).await;
    let _res: Result<()> = assert_send(session.send(b"payload")).await;
    let _res: Result<()> = assert_send(session.close()).await;

    Ok(())
}

async fn check_transport_apis<T: Transport>(transport: T, peer: PeerAddress) -> Result<()> {
    let handle: Result<T::Handle> = assert_send(transport.acquire_handle(&peer, btuuid::services::SERIAL_PORT)).await;
    let mut handle = handle?;
    let _res: Result<()> = assert_send(transport.connect(&mut handle)).await;
    let channel: Result<T::Channel> = assert_send(transport.output_channel(&mut handle)).await;
    let mut channel = channel?;
    let _res: Result<()> = assert_send(channel.write(b"payload")).await;
    let _res: Result<()> = assert_send(channel.flush()).await;
    let _res: Result<()> = assert_send(transport.release(handle)).await;

    Ok(())
}

async fn check_loopback_apis() -> Result<()> {
    let (transport, _peer) = LoopbackTransport::new();
    transport.inject_failure(loopback::LoopbackStep::Write);
    transport.clear_failure(loopback::LoopbackStep::Write);
    let _calls: usize = transport.calls(loopback::LoopbackStep::Acquire);
    let _total: usize = transport.total_calls();

    let _handle: Option<LoopbackHandle> = None;
    let _channel: Option<LoopbackChannel> = None;

    check_session_apis(SerialSession::new(transport), "AA:BB:CC:DD:EE:FF".parse()?).await
}

#[cfg(target_os = "linux")]
async fn check_bluez_apis() -> Result<()> {
    let options = BluezOptions {
        require_authentication: true,
        channel: Some(1),
    };
    let transport: Result<BluezTransport> = assert_send(BluezTransport::new(options)).await;
    let transport = transport?;
    let _name: &str = transport.adapter_name();
    let _options: BluezOptions = transport.options();

    let transport2: Result<BluezTransport> = assert_send(BluezTransport::with_adapter("hci0", options)).await;
    let _handle: Option<BluezHandle> = None;
    check_transport_apis(transport2?, PeerAddress::new("20:17:01:04:22:27")).await?;

    check_session_apis(SerialSession::new(transport), PeerAddress::new("20:17:01:04:22:27")).await
}

#[allow(unused)]
async fn check_apis() -> Result<()> {
    check_loopback_apis().await?;
    #[cfg(target_os = "linux")]
    check_bluez_apis().await?;

    Ok(())
}

fn main() {}
