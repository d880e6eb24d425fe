//! Serial session errors

/// The error type for serial session and transport operations
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    message: String,
    suppressed: Vec<Error>,
}

impl Error {
    /// Creates a new error of the given kind.
    ///
    /// Transport implementations use this to report platform failures, attaching the platform error as `source`.
    pub fn new(
        kind: ErrorKind,
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
        message: impl Into<String>,
    ) -> Self {
        Error {
            kind,
            source,
            message: message.into(),
            suppressed: Vec::new(),
        }
    }

    pub(crate) fn wrap(kind: ErrorKind, source: Error, message: impl Into<String>) -> Self {
        Error::new(kind, Some(Box::new(source)), message)
    }

    pub(crate) fn invalid_state(operation: &str, state: crate::SessionState) -> Self {
        Error::new(
            ErrorKind::InvalidState,
            None,
            format!("cannot {operation} a session that is {state}"),
        )
    }

    /// Returns the corresponding [ErrorKind] for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message for this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Secondary failures that happened while handling this one.
    ///
    /// For example, when a connect attempt fails and releasing the socket afterwards fails too, the release failure
    /// is reported here rather than replacing the connect failure.
    pub fn suppressed(&self) -> &[Error] {
        &self.suppressed
    }

    pub(crate) fn suppress(&mut self, err: Error) {
        self.suppressed.push(err);
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.message.is_empty(), &self.source) {
            (true, None) => write!(f, "{}", &self.kind)?,
            (false, None) => write!(f, "{}: {}", &self.kind, &self.message)?,
            (true, Some(err)) => write!(f, "{}: {}", &self.kind, err)?,
            (false, Some(err)) => write!(f, "{}: {} ({})", &self.kind, &self.message, err)?,
        }
        for err in &self.suppressed {
            write!(f, "; also {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|x| {
            let x: &(dyn std::error::Error + 'static) = &**x;
            x
        })
    }
}

/// A list of general categories of serial session error.
///
/// The first group describes which step of a session failed. The second group is used by transports to classify the
/// underlying platform failure, which is then available as the [`source`][std::error::Error::source] of the session
/// error.
#[non_exhaustive]
#[derive(Debug, displaydoc::Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// could not create a socket for the peer
    HandleCreationFailed,
    /// connecting to the peer failed
    ConnectFailed,
    /// the connected socket has no output stream
    ChannelUnavailable,
    /// writing to the peer failed
    WriteFailed,
    /// flushing the output stream failed
    FlushFailed,
    /// releasing the socket failed
    ReleaseFailed,
    /// operation not valid in the current session state
    InvalidState,
    /// the Bluetooth adapter is not available
    AdapterUnavailable,
    /// connection failed
    ConnectionFailed,
    /// the socket isn't connected
    NotConnected,
    /// the operation is unsupported
    NotSupported,
    /// permission denied
    NotAuthorized,
    /// not found
    NotFound,
    /// invalid parameter
    InvalidParameter,
    /// timed out
    Timeout,
    /// an internal error has occured
    Internal,
    /// error
    Other,
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind, None, String::new())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(kind_from_io(&err.kind()), Some(Box::new(err)), String::new())
    }
}

fn kind_from_io(err: &std::io::ErrorKind) -> ErrorKind {
    use std::io::ErrorKind as StdErrorKind;

    match err {
        StdErrorKind::NotFound => ErrorKind::NotFound,
        StdErrorKind::PermissionDenied => ErrorKind::NotAuthorized,
        StdErrorKind::ConnectionRefused
        | StdErrorKind::ConnectionReset
        | StdErrorKind::HostUnreachable
        | StdErrorKind::NetworkUnreachable
        | StdErrorKind::ConnectionAborted
        | StdErrorKind::BrokenPipe => ErrorKind::ConnectionFailed,
        StdErrorKind::NotConnected => ErrorKind::NotConnected,
        StdErrorKind::AddrNotAvailable | StdErrorKind::NetworkDown | StdErrorKind::ResourceBusy => {
            ErrorKind::AdapterUnavailable
        }
        StdErrorKind::InvalidInput => ErrorKind::InvalidParameter,
        StdErrorKind::TimedOut => ErrorKind::Timeout,
        StdErrorKind::Unsupported => ErrorKind::NotSupported,
        StdErrorKind::Other => ErrorKind::Other,
        // None of the other errors have semantic meaning for us
        _ => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;
    use std::io;

    use super::*;

    #[test]
    fn display_includes_message_and_source() {
        let err = Error::from(io::Error::new(io::ErrorKind::HostUnreachable, "no route to peer"));
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);

        let err = Error::wrap(ErrorKind::ConnectFailed, err, "connecting to AA:BB:CC:DD:EE:FF");
        assert_eq!(
            err.to_string(),
            "connecting to the peer failed: connecting to AA:BB:CC:DD:EE:FF (connection failed: no route to peer)"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn display_lists_suppressed_errors() {
        let mut err = Error::from(ErrorKind::FlushFailed);
        err.suppress(Error::new(ErrorKind::ReleaseFailed, None, "socket already gone"));

        assert_eq!(err.suppressed().len(), 1);
        assert_eq!(
            err.to_string(),
            "flushing the output stream failed; also releasing the socket failed: socket already gone"
        );
    }

    #[test]
    fn io_errors_map_to_kinds() {
        let kind = |k| Error::from(io::Error::from(k)).kind();
        assert_eq!(kind(io::ErrorKind::ConnectionRefused), ErrorKind::ConnectionFailed);
        assert_eq!(kind(io::ErrorKind::NotConnected), ErrorKind::NotConnected);
        assert_eq!(kind(io::ErrorKind::TimedOut), ErrorKind::Timeout);
        assert_eq!(kind(io::ErrorKind::PermissionDenied), ErrorKind::NotAuthorized);
        assert_eq!(kind(io::ErrorKind::WouldBlock), ErrorKind::Internal);
    }
}
