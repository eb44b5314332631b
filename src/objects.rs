//! The exported-object registry: `path -> interface -> member`, plus the
//! built-in introspection object every client carries at `/`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MethodError;
use crate::introspection::{self, InterfaceDescription, MethodDescription, ObjectDescription, SignalDescription};
use crate::strings::{InterfaceName, MemberName, ObjectPath};
use crate::types::Signature;
use crate::value::Variant;

/// A method handler: given the call body, produce a reply body or a method
/// error. Runs on its own spawned task (see the client dispatcher), so it
/// may block or take time without starving other dispatch.
pub type MethodHandler = Arc<dyn Fn(&[Variant]) -> Result<Vec<Variant>, MethodError> + Send + Sync>;

/// One exported member: a callable method or a declared (but not locally
/// invocable) signal shape, used only for introspection.
#[derive(Clone)]
pub enum Member {
    /// A method with input/output shape and a handler.
    Method {
        /// Argument signature.
        input: Signature,
        /// Return-value signature.
        output: Signature,
        /// The handler invoked on dispatch.
        handler: MethodHandler,
    },
    /// A signal declaration (shape only — emitting goes through
    /// [`crate::client::Client::emit`]).
    Signal {
        /// Argument signature.
        signature: Signature,
    },
}

#[derive(Clone, Default)]
struct Interface {
    members: HashMap<MemberName, Member>,
}

/// `path -> interface -> member` registry backing object export and
/// dispatch.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    objects: HashMap<ObjectPath, HashMap<InterfaceName, Interface>>,
}

impl ObjectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        ObjectRegistry::default()
    }

    /// Register `members` under `path`/`interface`. Repeated registration
    /// for the same interface merges at the member level; a later
    /// registration of the same member name replaces the earlier one.
    pub fn export(
        &mut self,
        path: ObjectPath,
        interface: InterfaceName,
        members: impl IntoIterator<Item = (MemberName, Member)>,
    ) {
        let iface = self
            .objects
            .entry(path)
            .or_default()
            .entry(interface)
            .or_default();
        for (name, member) in members {
            iface.members.insert(name, member);
        }
    }

    /// Look up a method handler by path/interface/member.
    pub fn find_method(
        &self,
        path: &ObjectPath,
        interface: Option<&InterfaceName>,
        member: &MemberName,
    ) -> Option<MethodHandler> {
        let ifaces = self.objects.get(path)?;
        let candidates: Vec<&Interface> = match interface {
            Some(i) => ifaces.get(i).into_iter().collect(),
            None => ifaces.values().collect(),
        };
        for iface in candidates {
            if let Some(Member::Method { handler, .. }) = iface.members.get(member) {
                return Some(handler.clone());
            }
        }
        None
    }

    /// Is anything registered at `path`?
    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path)
    }

    /// All registered object paths.
    pub fn paths(&self) -> impl Iterator<Item = &ObjectPath> {
        self.objects.keys()
    }

    /// The immediate child path element of `path` under `root`, if any.
    /// E.g. with `root = "/"` and `path = "/foo/bar"`, yields `"foo"`.
    fn child_element<'a>(root: &ObjectPath, path: &'a ObjectPath) -> Option<&'a str> {
        let prefix = if root.as_str() == "/" { "/" } else { root.as_str() };
        let rest = path.as_str().strip_prefix(prefix)?;
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            return None;
        }
        Some(rest.split('/').next().unwrap())
    }

    /// Build the introspection description for `path`, or `None` if
    /// nothing is registered there and it has no children either — the
    /// root path in particular must degrade gracefully here rather than
    /// panicking when nothing has been exported yet.
    pub fn describe(&self, path: &ObjectPath) -> Option<ObjectDescription> {
        let mut children: Vec<String> = self
            .objects
            .keys()
            .filter_map(|p| Self::child_element(path, p))
            .map(|s| s.to_string())
            .collect();
        children.sort();
        children.dedup();

        let interfaces = match self.objects.get(path) {
            Some(ifaces) => ifaces
                .iter()
                .map(|(name, iface)| describe_interface(name, iface))
                .collect(),
            None => Vec::new(),
        };

        if interfaces.is_empty() && children.is_empty() {
            return None;
        }

        Some(ObjectDescription {
            path: path.clone(),
            interfaces,
            children,
        })
    }

    /// Render introspection XML for `path` via the introspection
    /// collaborator.
    pub fn introspect_xml(&self, path: &ObjectPath) -> Option<String> {
        self.describe(path).and_then(|d| introspection::to_xml(&d))
    }
}

fn describe_interface(name: &InterfaceName, iface: &Interface) -> InterfaceDescription {
    let mut methods = Vec::new();
    let mut signals = Vec::new();
    for (member, m) in &iface.members {
        match m {
            Member::Method { input, output, .. } => methods.push(MethodDescription {
                name: member.clone(),
                input: input.clone(),
                output: output.clone(),
            }),
            Member::Signal { signature } => signals.push(SignalDescription {
                name: member.clone(),
                signature: signature.clone(),
            }),
        }
    }
    methods.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    signals.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
    InterfaceDescription {
        name: name.clone(),
        methods,
        signals,
    }
}
