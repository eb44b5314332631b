//! The socket/wire-codec boundary: everything this crate needs from a
//! transport, without committing to one. A concrete implementation
//! (Unix domain socket + SASL handshake + D-Bus binary marshalling, say)
//! lives outside this crate and is handed in as a [`Socket`] plus a way to
//! open one.

use crate::error::ClientError;
use crate::message::{ReceivedMessage, Serial};
use crate::strings::{BusName, InterfaceName, MemberName, ObjectPath};
use crate::value::Variant;

/// The transports a connection attempt may use, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// A Unix domain socket.
    Unix,
    /// A TCP socket (used mostly for testing; the reference daemon
    /// disables it by default).
    Tcp,
}

/// The SASL mechanisms a connection attempt may use, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authenticator {
    /// `EXTERNAL`, authenticating via the peer's Unix credentials.
    External,
    /// `DBUS_COOKIE_SHA1`.
    CookieSha1,
    /// `ANONYMOUS`.
    Anonymous,
}

/// Options governing how a socket is opened.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Transports to try, in order.
    pub transports: Vec<Transport>,
    /// Authenticators to try, in order.
    pub authenticators: Vec<Authenticator>,
}

impl Default for SocketOptions {
    fn default() -> Self {
        SocketOptions {
            transports: vec![Transport::Unix],
            authenticators: vec![Authenticator::External],
        }
    }
}

/// A message not yet assigned a serial, ready to hand to [`Socket::send`].
#[derive(Debug, Clone)]
pub enum OutgoingMessage {
    /// See [`crate::message::MethodCall`].
    MethodCall {
        /// Target object.
        path: ObjectPath,
        /// Target method.
        member: MemberName,
        /// Target interface, if any.
        interface: Option<InterfaceName>,
        /// Target bus name, if any.
        destination: Option<BusName>,
        /// If true, the daemon and callee should send no reply.
        no_reply_expected: bool,
        /// Call arguments.
        body: Vec<Variant>,
    },
    /// See [`crate::message::MethodReturn`].
    MethodReturn {
        /// Serial of the call being answered.
        reply_serial: Serial,
        /// Destination bus name, if any.
        destination: Option<BusName>,
        /// Return values.
        body: Vec<Variant>,
    },
    /// See [`crate::message::ErrorReply`].
    Error {
        /// Serial of the call being answered.
        reply_serial: Serial,
        /// Destination bus name, if any.
        destination: Option<BusName>,
        /// The error being reported.
        error: crate::error::MethodError,
    },
    /// See [`crate::message::Signal`].
    Signal {
        /// Emitting object.
        path: ObjectPath,
        /// Emitting interface.
        interface: InterfaceName,
        /// Signal name.
        member: MemberName,
        /// Destination bus name, for a directed signal.
        destination: Option<BusName>,
        /// Signal arguments.
        body: Vec<Variant>,
    },
}

/// An open connection to the bus, underneath the dispatcher.
///
/// Implementations own the transport and the wire codec; this crate only
/// ever sees [`OutgoingMessage`]/[`ReceivedMessage`] records.
pub trait Socket: Send + Sync {
    /// Send `message`, invoking `serial_consumer` synchronously with the
    /// assigned serial before returning. The dispatcher relies on this
    /// synchronous callback to register the serial in its pending-calls
    /// table before any reply with that serial can possibly be dispatched.
    fn send(
        &self,
        message: OutgoingMessage,
        serial_consumer: &mut dyn FnMut(Serial),
    ) -> Result<Serial, ClientError>;

    /// Block until the next message arrives, or report a decode failure.
    fn receive(&self) -> Result<ReceivedMessage, ClientError>;

    /// Close the underlying transport. Idempotent.
    fn close(&self);
}

/// A way to open a [`Socket`] given an address and [`SocketOptions`].
///
/// Kept as a trait (rather than a free function) so tests can substitute an
/// in-memory socket factory.
pub trait SocketOpener: Send + Sync {
    /// Attempt to establish a connection to `address`.
    fn open_with(&self, options: &SocketOptions, address: &str) -> Result<Box<dyn Socket>, ClientError>;
}
