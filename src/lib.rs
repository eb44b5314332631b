//! Core D-Bus client plumbing: the type system, the signature codec, and a
//! connection dispatcher that multiplexes method calls, signals and exported
//! objects over a single transport.
//!
//! [D-Bus](http://dbus.freedesktop.org/) is a message bus, and is mainly used
//! on Linux for communication between processes. This crate implements the
//! parts of a D-Bus client that do not depend on any particular transport or
//! wire encoding: those are pluggable collaborators (see [`socket`] and
//! [`introspection`]) so this crate stays usable in contexts where the
//! marshalling or the transport differ from the reference D-Bus daemon.

#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod strings;
pub mod value;
pub mod message;
pub mod matchrule;
pub mod socket;
pub mod introspection;
pub mod objects;
pub mod client;

pub use crate::error::Error;
pub use crate::types::{Type, Signature};
pub use crate::strings::{ObjectPath, InterfaceName, MemberName, ErrorName, BusName};
pub use crate::value::{Atom, Value, Variant};
pub use crate::message::{Serial, MethodCall, MethodReturn, ErrorReply, Signal, ReceivedMessage};
pub use crate::matchrule::MatchRule;
pub use crate::client::{Client, ClientOptions, ClientBuilder};
