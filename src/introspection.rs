//! The introspection boundary: turning an exported object's shape into the
//! XML the `org.freedesktop.DBus.Introspectable.Introspect` method reports.

use crate::strings::{InterfaceName, MemberName, ObjectPath};
use crate::types::Signature;

/// One method's input/output shape, as reported to introspection.
#[derive(Debug, Clone)]
pub struct MethodDescription {
    /// The method name.
    pub name: MemberName,
    /// Argument signature.
    pub input: Signature,
    /// Return-value signature.
    pub output: Signature,
}

/// One signal's shape, as reported to introspection.
#[derive(Debug, Clone)]
pub struct SignalDescription {
    /// The signal name.
    pub name: MemberName,
    /// Argument signature.
    pub signature: Signature,
}

/// One interface's methods and signals.
#[derive(Debug, Clone)]
pub struct InterfaceDescription {
    /// The interface name.
    pub name: InterfaceName,
    /// Exported methods.
    pub methods: Vec<MethodDescription>,
    /// Declared signals.
    pub signals: Vec<SignalDescription>,
}

/// A snapshot of one exported object, as needed to render introspection XML.
#[derive(Debug, Clone)]
pub struct ObjectDescription {
    /// The object path being described.
    pub path: ObjectPath,
    /// Interfaces implemented at this path.
    pub interfaces: Vec<InterfaceDescription>,
    /// Immediate child path elements (not full paths), for the root-level
    /// listing of registered objects.
    pub children: Vec<String>,
}

const DOCTYPE: &str = "<!DOCTYPE node PUBLIC \"-//freedesktop//DTD D-BUS Object Introspection 1.1//EN\"\n\"http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd\">\n";

/// Render `object`'s shape into an introspection XML document.
///
/// Returns `None` only if `object` has nothing to say (no interfaces and no
/// children) — callers should not invoke this for an unregistered path in
/// the first place, but the return type stays an `Option` because not every
/// object is introspectable.
pub fn to_xml(object: &ObjectDescription) -> Option<String> {
    if object.interfaces.is_empty() && object.children.is_empty() {
        return None;
    }
    let mut xml = String::new();
    xml.push_str(DOCTYPE);
    xml.push_str(&format!("<node name=\"{}\">\n", object.path.as_str()));

    for iface in &object.interfaces {
        xml.push_str(&format!("  <interface name=\"{}\">\n", iface.name.as_str()));
        for m in &iface.methods {
            xml.push_str(&format!("    <method name=\"{}\">\n", m.name.as_str()));
            write_args(&mut xml, &m.input, "in");
            write_args(&mut xml, &m.output, "out");
            xml.push_str("    </method>\n");
        }
        for s in &iface.signals {
            xml.push_str(&format!("    <signal name=\"{}\">\n", s.name.as_str()));
            write_args(&mut xml, &s.signature, "out");
            xml.push_str("    </signal>\n");
        }
        xml.push_str("  </interface>\n");
    }

    let mut children = object.children.clone();
    children.sort();
    for child in children {
        xml.push_str(&format!("  <node name=\"{}\"/>\n", child));
    }

    xml.push_str("</node>\n");
    Some(xml)
}

fn write_args(xml: &mut String, sig: &Signature, direction: &str) {
    for t in sig.types() {
        let single = Signature::single(t.clone()).expect("single type always fits");
        xml.push_str(&format!(
            "      <arg type=\"{}\" direction=\"{}\"/>\n",
            single, direction
        ));
    }
}
