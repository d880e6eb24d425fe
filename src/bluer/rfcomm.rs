use async_trait::async_trait;
use bluer::rfcomm::stream::{OwnedReadHalf, OwnedWriteHalf};
use bluer::rfcomm::{ConnectRequest, Profile, ProfileHandle, Role, SocketAddr, Stream};
use futures_lite::{future, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::btuuid::service_label;
use crate::error::ErrorKind;
use crate::transport::{StreamChannel, Transport};
use crate::{Error, PeerAddress, Result};

/// Connection options for [`BluezTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BluezOptions {
    /// Require an authenticated (paired) link, like Android's secure RFCOMM sockets. Defaults to `false`.
    pub require_authentication: bool,
    /// Connect to this RFCOMM channel directly instead of looking the service up in the peer's SDP records.
    pub channel: Option<u8>,
}

/// A [`Transport`] that opens RFCOMM sockets through BlueZ.
///
/// By default the peer's SDP records are searched for the requested service: a client profile for the service UUID
/// is registered with `bluetoothd`, which then performs the lookup and hands over the connected socket. With
/// [`BluezOptions::channel`] set the socket connects straight to that channel and the service UUID is only used for
/// logging.
#[derive(Clone)]
pub struct BluezTransport {
    session: bluer::Session,
    adapter: bluer::Adapter,
    options: BluezOptions,
}

/// Socket handle of a [`BluezTransport`]
pub struct BluezHandle {
    device: bluer::Device,
    service: Uuid,
    profile: Option<ProfileHandle>,
    stream: Option<Stream>,
    reader: Option<OwnedReadHalf>,
}

impl BluezTransport {
    /// Creates a transport using the system's default Bluetooth adapter.
    pub async fn new(options: BluezOptions) -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        Ok(BluezTransport {
            session,
            adapter,
            options,
        })
    }

    /// Creates a transport using the named Bluetooth adapter (e.g. `hci1`).
    pub async fn with_adapter(adapter_name: &str, options: BluezOptions) -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.adapter(adapter_name)?;
        Ok(BluezTransport {
            session,
            adapter,
            options,
        })
    }

    /// The name of the adapter connections are made from
    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// The options connections are made with
    pub fn options(&self) -> BluezOptions {
        self.options
    }
}

impl std::fmt::Debug for BluezTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BluezTransport")
            .field("adapter", &self.adapter.name())
            .field("options", &self.options)
            .finish()
    }
}

impl std::fmt::Debug for BluezHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BluezHandle")
            .field("device", &self.device.address())
            .field("service", &self.service)
            .field("connected", &(self.stream.is_some() || self.reader.is_some()))
            .finish()
    }
}

enum ProfileEvent {
    Connected(bluer::Result<()>),
    Request(Option<ConnectRequest>),
}

async fn connect_profile(device: &bluer::Device, service: Uuid, profile: &mut ProfileHandle) -> Result<Stream> {
    let event = future::or(
        async { ProfileEvent::Connected(device.connect_profile(&service).await) },
        async { ProfileEvent::Request(profile.next().await) },
    )
    .await;

    let request = match event {
        ProfileEvent::Request(request) => request,
        ProfileEvent::Connected(Ok(())) => profile.next().await,
        ProfileEvent::Connected(Err(err)) => return Err(err.into()),
    };

    let request = request.ok_or_else(|| {
        Error::new(
            ErrorKind::ConnectionFailed,
            None,
            "profile was unregistered before the connection arrived",
        )
    })?;
    request.accept().map_err(|err| {
        Error::new(
            ErrorKind::ConnectionFailed,
            Some(Box::new(err)),
            "accepting the profile connection",
        )
    })
}

#[async_trait]
impl Transport for BluezTransport {
    type Handle = BluezHandle;
    type Channel = StreamChannel<OwnedWriteHalf>;

    async fn acquire_handle(&self, peer: &PeerAddress, service: Uuid) -> Result<BluezHandle> {
        let address = peer.to_bytes().map(bluer::Address::new).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidParameter,
                None,
                format!("{peer} is not a Bluetooth address"),
            )
        })?;

        if !self.adapter.is_powered().await? {
            return Err(Error::new(
                ErrorKind::AdapterUnavailable,
                None,
                format!("adapter {} is powered off", self.adapter.name()),
            ));
        }

        let device = self.adapter.device(address)?;

        let profile = match self.options.channel {
            Some(_) => None,
            None => {
                let profile = Profile {
                    uuid: service,
                    role: Some(Role::Client),
                    require_authentication: Some(self.options.require_authentication),
                    require_authorization: Some(false),
                    auto_connect: Some(false),
                    ..Default::default()
                };
                Some(self.session.register_profile(profile).await?)
            }
        };

        trace!(
            "socket for service {} on {} via {}",
            service_label(&service),
            address,
            self.adapter.name()
        );

        Ok(BluezHandle {
            device,
            service,
            profile,
            stream: None,
            reader: None,
        })
    }

    async fn connect(&self, handle: &mut BluezHandle) -> Result<()> {
        let stream = match (self.options.channel, handle.profile.as_mut()) {
            (Some(channel), _) => Stream::connect(SocketAddr::new(handle.device.address(), channel)).await?,
            (None, Some(profile)) => connect_profile(&handle.device, handle.service, profile).await?,
            (None, None) => return Err(Error::new(ErrorKind::Internal, None, "no profile registered")),
        };

        debug!("rfcomm stream connected to {}", handle.device.address());
        handle.stream = Some(stream);
        Ok(())
    }

    async fn output_channel(&self, handle: &mut BluezHandle) -> Result<StreamChannel<OwnedWriteHalf>> {
        let stream = handle
            .stream
            .take()
            .ok_or_else(|| Error::new(ErrorKind::NotConnected, None, "rfcomm stream is not connected"))?;
        let (reader, writer) = stream.into_split();
        handle.reader = Some(reader);
        Ok(StreamChannel::new(writer))
    }

    async fn release(&self, mut handle: BluezHandle) -> Result<()> {
        if let Some(mut stream) = handle.stream.take() {
            stream.shutdown().await?;
        }
        handle.reader = None;
        handle.profile = None;
        debug!("rfcomm socket to {} closed", handle.device.address());
        Ok(())
    }
}
