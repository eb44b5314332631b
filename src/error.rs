//! The crate's error hierarchy.
//!
//! Each narrower error type (`SignatureFormatError`, `NameFormatError`,
//! `ClientError`, `MethodError`) is usable on its own where a precise type is
//! wanted, and converts into the top-level [`Error`] via `?` at API
//! boundaries.

use std::fmt;
use crate::strings::ErrorName;
use crate::value::Variant;

/// A D-Bus signature failed to parse, or a `Signature` could not be built
/// from the given types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureFormatError {
    /// The byte sequence does not belong to the signature grammar.
    #[error("invalid signature syntax at byte offset {0}")]
    InvalidSyntax(usize),
    /// The formatted signature would exceed the 255-byte limit.
    #[error("signature exceeds the 255-byte limit ({0} bytes)")]
    TooLong(usize),
    /// A dictionary key type was not atomic.
    #[error("dictionary key type is not atomic")]
    NonAtomicKey,
    /// A structure with no fields was requested; D-Bus has no empty struct.
    #[error("structures must have at least one field")]
    EmptyStructure,
}

/// A name (object path, interface, member, error or bus name) failed to
/// validate against its grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} name: {text:?}")]
pub struct NameFormatError {
    /// Which grammar was being checked.
    pub kind: &'static str,
    /// The text that failed to validate.
    pub text: String,
}

/// Connection-level failure: transport, send/receive, or lifecycle errors
/// that are not a D-Bus-level method error reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The socket collaborator failed to open a connection.
    #[error("failed to open connection: {0}")]
    ConnectFailed(String),
    /// Sending a message on the socket failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),
    /// Decoding an incoming frame failed; the connection is torn down.
    #[error("failed to receive message: {0}")]
    ReceiveFailed(String),
    /// A pending call was abandoned because the connection was closed.
    #[error("connection closed during call (serial {serial})")]
    ClosedDuringCall {
        /// The serial of the abandoned call.
        serial: u32,
    },
    /// An operation was attempted on a client that has already disconnected.
    #[error("client is disconnected")]
    Disconnected,
}

/// A D-Bus-level method failure: an error name plus a variant payload.
///
/// This is both the shape of an incoming error reply, and the way a
/// method handler signals a failure back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodError {
    name: ErrorName,
    body: Vec<Variant>,
}

impl MethodError {
    /// Build a method error from a name and a payload of variants.
    pub fn new(name: ErrorName, body: Vec<Variant>) -> Self {
        MethodError { name, body }
    }

    /// A method error carrying a single string argument, the common case.
    pub fn failed(message: impl Into<String>) -> Self {
        MethodError {
            name: ErrorName::from_static("org.freedesktop.DBus.Error.Failed"),
            body: vec![Variant::from(message.into())],
        }
    }

    /// `org.freedesktop.DBus.Error.UnknownMethod`.
    pub fn unknown_method(member: &str) -> Self {
        MethodError {
            name: ErrorName::from_static("org.freedesktop.DBus.Error.UnknownMethod"),
            body: vec![Variant::from(format!("Unknown method: {}", member))],
        }
    }

    /// The error name of this reply.
    pub fn name(&self) -> &ErrorName {
        &self.name
    }

    /// The variant payload of this reply.
    pub fn body(&self) -> &[Variant] {
        &self.body
    }

    /// The first string argument, if any; this is the conventional
    /// human-readable message D-Bus errors carry.
    pub fn message(&self) -> Option<String> {
        self.body.iter().find_map(|v| v.get::<String>())
    }
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(m) => write!(f, "{}: {}", self.name.as_str(), m),
            None => write!(f, "{}", self.name.as_str()),
        }
    }
}

impl std::error::Error for MethodError {}

/// The crate-wide error type. Every narrower error converts into this one.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// See [`SignatureFormatError`].
    #[error(transparent)]
    Signature(#[from] SignatureFormatError),
    /// See [`NameFormatError`].
    #[error(transparent)]
    Name(#[from] NameFormatError),
    /// See [`ClientError`].
    #[error(transparent)]
    Client(#[from] ClientError),
    /// See [`MethodError`].
    #[error("{0}")]
    Method(MethodError),
}

impl From<MethodError> for Error {
    fn from(e: MethodError) -> Self {
        Error::Method(e)
    }
}
