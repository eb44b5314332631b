//! Message records: the shapes the socket/wire-codec collaborator hands to
//! and takes from the dispatcher. Marshalling these to and from the D-Bus
//! binary frame format is the wire codec's job, not this crate's.

use crate::error::MethodError;
use crate::strings::{BusName, InterfaceName, MemberName, ObjectPath};
use crate::value::Variant;

/// A per-connection correlation key. Wraps on overflow; 32 bits matches the
/// wire format's serial field width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Serial(pub u32);

impl Serial {
    /// The next serial after this one, wrapping at `u32::MAX`.
    pub fn next(self) -> Serial {
        Serial(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outgoing or incoming method call.
#[derive(Debug, Clone)]
pub struct MethodCall {
    /// This message's own serial.
    pub serial: Serial,
    /// The object being called.
    pub path: ObjectPath,
    /// The method name.
    pub member: MemberName,
    /// The interface the method belongs to, if specified.
    pub interface: Option<InterfaceName>,
    /// The caller's bus name, filled in by the daemon for incoming calls.
    pub sender: Option<BusName>,
    /// The callee's bus name.
    pub destination: Option<BusName>,
    /// If true, no reply (return or error) should be sent for this call.
    pub no_reply_expected: bool,
    /// The call arguments.
    pub body: Vec<Variant>,
}

/// A successful method reply.
#[derive(Debug, Clone)]
pub struct MethodReturn {
    /// This message's own serial.
    pub serial: Serial,
    /// The serial of the `MethodCall` this replies to.
    pub reply_serial: Serial,
    /// The replying peer's bus name.
    pub sender: Option<BusName>,
    /// The original caller's bus name.
    pub destination: Option<BusName>,
    /// The return values.
    pub body: Vec<Variant>,
}

/// A method call that failed; carries the same [`MethodError`] shape the
/// dispatcher hands back to `call`'s caller.
#[derive(Debug, Clone)]
pub struct ErrorReply {
    /// This message's own serial.
    pub serial: Serial,
    /// The serial of the `MethodCall` this replies to.
    pub reply_serial: Serial,
    /// The replying peer's bus name.
    pub sender: Option<BusName>,
    /// The original caller's bus name.
    pub destination: Option<BusName>,
    /// The error name and payload.
    pub error: MethodError,
}

/// A broadcast signal.
#[derive(Debug, Clone)]
pub struct Signal {
    /// This message's own serial.
    pub serial: Serial,
    /// The object that emitted the signal.
    pub path: ObjectPath,
    /// The interface the signal belongs to.
    pub interface: InterfaceName,
    /// The signal name.
    pub member: MemberName,
    /// The emitter's bus name.
    pub sender: Option<BusName>,
    /// The destination, if this is a directed (unicast) signal.
    pub destination: Option<BusName>,
    /// The signal arguments.
    pub body: Vec<Variant>,
}

/// Any message the socket collaborator might hand back from `receive`.
#[derive(Debug, Clone)]
pub enum ReceivedMessage {
    /// See [`MethodCall`].
    MethodCall(MethodCall),
    /// See [`MethodReturn`].
    MethodReturn(MethodReturn),
    /// See [`ErrorReply`].
    Error(ErrorReply),
    /// See [`Signal`].
    Signal(Signal),
}

impl ReceivedMessage {
    /// This message's own serial, regardless of kind.
    pub fn serial(&self) -> Serial {
        match self {
            ReceivedMessage::MethodCall(m) => m.serial,
            ReceivedMessage::MethodReturn(m) => m.serial,
            ReceivedMessage::Error(m) => m.serial,
            ReceivedMessage::Signal(m) => m.serial,
        }
    }

    /// The serial this message replies to, if it is a return or an error.
    pub fn reply_serial(&self) -> Option<Serial> {
        match self {
            ReceivedMessage::MethodReturn(m) => Some(m.reply_serial),
            ReceivedMessage::Error(m) => Some(m.reply_serial),
            _ => None,
        }
    }

    /// The sender's bus name, if present.
    pub fn sender(&self) -> Option<&BusName> {
        match self {
            ReceivedMessage::MethodCall(m) => m.sender.as_ref(),
            ReceivedMessage::MethodReturn(m) => m.sender.as_ref(),
            ReceivedMessage::Error(m) => m.sender.as_ref(),
            ReceivedMessage::Signal(m) => m.sender.as_ref(),
        }
    }
}
