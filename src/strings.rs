//! Nominal wrapper types for the text-shaped parts of D-Bus: object paths,
//! interface/member/error/bus names. Each wrapper only ever holds text that
//! has passed its grammar's validation.

use std::fmt;
use std::ops::Deref;
use crate::error::NameFormatError;

fn is_az_(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_')
}

fn is_az09_(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_')
}

fn is_az09_hyphen(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-')
}

fn is_az_hyphen(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'-')
}

fn is_valid_object_path(s: &str) -> bool {
    let b = s.as_bytes();
    if b.is_empty() || b[0] != b'/' {
        return false;
    }
    if b.len() == 1 {
        return true;
    }
    if b[b.len() - 1] == b'/' {
        return false;
    }
    for element in s[1..].split('/') {
        if element.is_empty() || !element.bytes().all(|c| is_az09_(c)) {
            return false;
        }
    }
    true
}

fn is_valid_member_name(s: &str) -> bool {
    let b = s.as_bytes();
    if b.is_empty() || b.len() > 255 {
        return false;
    }
    is_az_(b[0]) && b[1..].iter().all(|&c| is_az09_(c))
}

/// `InterfaceName`/`ErrorName` grammar: two or more dot-separated elements,
/// each starting with a letter or underscore.
fn is_valid_interface_name(s: &str) -> bool {
    if s.len() > 255 {
        return false;
    }
    let elements: Vec<&str> = s.split('.').collect();
    if elements.len() < 2 {
        return false;
    }
    elements.iter().all(|e| {
        let b = e.as_bytes();
        !b.is_empty() && is_az_(b[0]) && b[1..].iter().all(|&c| is_az09_(c))
    })
}

fn is_valid_bus_name(s: &str) -> bool {
    if s.len() > 255 || s.is_empty() {
        return false;
    }
    if let Some(rest) = s.strip_prefix(':') {
        let elements: Vec<&str> = rest.split('.').collect();
        if elements.len() < 2 {
            return false;
        }
        return elements.iter().all(|e| !e.is_empty() && e.bytes().all(is_az09_hyphen));
    }
    let elements: Vec<&str> = s.split('.').collect();
    if elements.len() < 2 {
        return false;
    }
    elements.iter().all(|e| {
        let b = e.as_bytes();
        !b.is_empty() && is_az_hyphen(b[0]) && b[1..].iter().all(|&c| is_az09_hyphen(c))
    })
}

macro_rules! dname_wrapper {
    ($(#[$meta:meta])* $t:ident, $kind:literal, $validate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $t(String);

        impl $t {
            /// Validate `text` and wrap it, or report why it was rejected.
            ///
            /// Note: if the `no-string-validation` feature is enabled, `text`
            /// is wrapped unconditionally without being checked against the
            /// grammar.
            #[cfg(not(feature = "no-string-validation"))]
            pub fn new(text: impl Into<String>) -> Result<Self, NameFormatError> {
                let text = text.into();
                if $validate(&text) {
                    Ok($t(text))
                } else {
                    Err(NameFormatError { kind: $kind, text })
                }
            }

            /// Wrap `text` unconditionally; the `no-string-validation`
            /// feature is enabled, so no grammar check is performed.
            #[cfg(feature = "no-string-validation")]
            pub fn new(text: impl Into<String>) -> Result<Self, NameFormatError> {
                Ok($t(text.into()))
            }

            /// Wrap a string literal known to be valid at authoring time.
            ///
            /// # Panics
            /// Panics if `text` does not satisfy the grammar.
            pub fn from_static(text: &'static str) -> Self {
                $t::new(text).unwrap_or_else(|e| panic!("{}", e))
            }

            /// The underlying text.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $t {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl std::convert::TryFrom<&str> for $t {
            type Error = NameFormatError;
            fn try_from(s: &str) -> Result<Self, NameFormatError> {
                $t::new(s)
            }
        }

        impl std::convert::TryFrom<String> for $t {
            type Error = NameFormatError;
            fn try_from(s: String) -> Result<Self, NameFormatError> {
                $t::new(s)
            }
        }
    };
}

dname_wrapper!(
    /// A `/`-separated hierarchical object identifier, e.g. `/org/example/Thing`.
    ObjectPath, "object path", is_valid_object_path
);
dname_wrapper!(
    /// A dot-separated interface identifier, e.g. `org.freedesktop.DBus`.
    InterfaceName, "interface", is_valid_interface_name
);
dname_wrapper!(
    /// A method, signal or property name, e.g. `GetMachineId`.
    MemberName, "member", is_valid_member_name
);
dname_wrapper!(
    /// Shares the interface-name grammar, e.g. `org.freedesktop.DBus.Error.Failed`.
    ErrorName, "error name", is_valid_interface_name
);
dname_wrapper!(
    /// Either well-known (`org.example.Thing`) or unique (`:1.42`).
    BusName, "bus name", is_valid_bus_name
);
