//! Signal filters and their `AddMatch` string encoding.

use crate::message::Signal;
use crate::strings::{BusName, InterfaceName, MemberName, ObjectPath};

/// A conjunction of optional equality predicates over a signal's header
/// fields. A field left `None` places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRule {
    /// Restrict to signals from this sender.
    pub sender: Option<BusName>,
    /// Restrict to signals addressed to this destination.
    pub destination: Option<BusName>,
    /// Restrict to signals from this object path.
    pub path: Option<ObjectPath>,
    /// Restrict to signals on this interface.
    pub interface: Option<InterfaceName>,
    /// Restrict to signals with this member name.
    pub member: Option<MemberName>,
}

impl MatchRule {
    /// A rule with every field unset; matches every signal.
    pub fn new() -> Self {
        MatchRule::default()
    }

    /// Format as the `key='value',...` string the daemon's `AddMatch`
    /// expects. Fields are emitted in a fixed order; unset fields are
    /// omitted.
    pub fn match_str(&self) -> String {
        let mut parts = Vec::new();
        if let Some(s) = &self.sender {
            parts.push(format!("sender='{}'", s));
        }
        if let Some(d) = &self.destination {
            parts.push(format!("destination='{}'", d));
        }
        if let Some(p) = &self.path {
            parts.push(format!("path='{}'", p));
        }
        if let Some(i) = &self.interface {
            parts.push(format!("interface='{}'", i));
        }
        if let Some(m) = &self.member {
            parts.push(format!("member='{}'", m));
        }
        parts.join(",")
    }

    /// Does `signal` satisfy every set field of this rule?
    pub fn matches(&self, signal: &Signal) -> bool {
        if let Some(s) = &self.sender {
            if signal.sender.as_ref() != Some(s) {
                return false;
            }
        }
        if let Some(d) = &self.destination {
            if signal.destination.as_ref() != Some(d) {
                return false;
            }
        }
        if let Some(p) = &self.path {
            if &signal.path != p {
                return false;
            }
        }
        if let Some(i) = &self.interface {
            if &signal.interface != i {
                return false;
            }
        }
        if let Some(m) = &self.member {
            if &signal.member != m {
                return false;
            }
        }
        true
    }
}
