//! The tagged-variant value model: [`Atom`], [`Value`] and [`Variant`], plus
//! the conversion contract between host types and D-Bus values.

use std::collections::BTreeMap;
use crate::types::{Type, Signature};
use crate::strings::ObjectPath;

/// A scalar or string value; the set of types eligible to be a dictionary
/// key. Carries a total order so it can be used as a map key even though
/// `f64` alone does not.
#[derive(Debug, Clone)]
pub enum Atom {
    /// `b`
    Bool(bool),
    /// `y`
    Word8(u8),
    /// `q`
    Word16(u16),
    /// `u`
    Word32(u32),
    /// `t`
    Word64(u64),
    /// `n`
    Int16(i16),
    /// `i`
    Int32(i32),
    /// `x`
    Int64(i64),
    /// `d`
    Double(f64),
    /// `s`
    Text(String),
    /// `g`
    Signature(Signature),
    /// `o`
    ObjectPath(ObjectPath),
}

impl Atom {
    /// The `Type` this atom corresponds to.
    pub fn type_of(&self) -> Type {
        match self {
            Atom::Bool(_) => Type::Boolean,
            Atom::Word8(_) => Type::Word8,
            Atom::Word16(_) => Type::Word16,
            Atom::Word32(_) => Type::Word32,
            Atom::Word64(_) => Type::Word64,
            Atom::Int16(_) => Type::Int16,
            Atom::Int32(_) => Type::Int32,
            Atom::Int64(_) => Type::Int64,
            Atom::Double(_) => Type::Double,
            Atom::Text(_) => Type::String,
            Atom::Signature(_) => Type::Signature,
            Atom::ObjectPath(_) => Type::ObjectPath,
        }
    }

    fn sort_key(&self) -> (u8, Vec<u8>) {
        // A discriminant tag followed by a byte-comparable rendering; this
        // is only used for ordering Atom as a map key, not for D-Bus wire
        // ordering.
        match self {
            Atom::Bool(b) => (0, vec![*b as u8]),
            Atom::Word8(v) => (1, v.to_be_bytes().to_vec()),
            Atom::Word16(v) => (2, v.to_be_bytes().to_vec()),
            Atom::Word32(v) => (3, v.to_be_bytes().to_vec()),
            Atom::Word64(v) => (4, v.to_be_bytes().to_vec()),
            Atom::Int16(v) => (5, v.to_be_bytes().to_vec()),
            Atom::Int32(v) => (6, v.to_be_bytes().to_vec()),
            Atom::Int64(v) => (7, v.to_be_bytes().to_vec()),
            Atom::Double(v) => (8, v.to_bits().to_be_bytes().to_vec()),
            Atom::Text(v) => (9, v.as_bytes().to_vec()),
            Atom::Signature(v) => (10, v.to_bytes()),
            Atom::ObjectPath(v) => (11, v.as_str().as_bytes().to_vec()),
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for Atom {}
impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Atom {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
impl std::hash::Hash for Atom {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state);
    }
}

/// A value in the D-Bus data model.
#[derive(Debug, Clone)]
pub enum Value {
    /// A scalar or string.
    Atom(Atom),
    /// A self-describing value plus its type.
    Variant(Box<Variant>),
    /// A byte array; equal to `Vector(Word8, ...)` with the same elements.
    Bytes(Vec<u8>),
    /// A homogeneous sequence.
    Vector(Type, Vec<Value>),
    /// An atom-keyed mapping.
    Map(Type, Type, BTreeMap<Atom, Value>),
    /// A fixed-arity heterogeneous tuple.
    Structure(Vec<Value>),
}

impl Value {
    /// The `Type` this value corresponds to.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Atom(a) => a.type_of(),
            Value::Variant(_) => Type::Variant,
            Value::Bytes(_) => Type::array(Type::Word8),
            Value::Vector(t, _) => Type::array(t.clone()),
            Value::Map(k, v, _) => Type::Dictionary(Box::new(k.clone()), Box::new(v.clone())),
            Value::Structure(vs) => Type::Structure(vs.iter().map(Value::type_of).collect()),
        }
    }

}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Atom(a), Atom(b)) => a == b,
            (Variant(a), Variant(b)) => a == b,
            (Bytes(_), Bytes(_)) | (Bytes(_), Vector(..)) | (Vector(..), Bytes(_)) => {
                byte_view(self) == byte_view(other)
            }
            (Vector(t1, v1), Vector(t2, v2)) => t1 == t2 && v1 == v2,
            (Map(k1, v1, m1), Map(k2, v2, m2)) => k1 == k2 && v1 == v2 && m1 == m2,
            (Structure(a), Structure(b)) => a == b,
            _ => false,
        }
    }
}

fn byte_view(v: &Value) -> Option<Vec<u8>> {
    match v {
        Value::Bytes(b) => Some(b.clone()),
        Value::Vector(Type::Word8, elems) => {
            let mut out = Vec::with_capacity(elems.len());
            for e in elems {
                match e {
                    Value::Atom(Atom::Word8(b)) => out.push(*b),
                    _ => return None,
                }
            }
            Some(out)
        }
        _ => None,
    }
}

/// A self-describing value: a payload plus its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    ty: Type,
    value: Value,
}

impl Variant {
    /// Wrap a value, recording its type.
    pub fn new(value: Value) -> Self {
        let ty = value.type_of();
        Variant { ty, value }
    }

    /// The runtime type of the wrapped value.
    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    /// The wrapped value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the variant, returning the wrapped value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Convert to a host type, returning `None` if the dynamic type does
    /// not match.
    pub fn get<T: Arg>(&self) -> Option<T> {
        T::from_value(&self.value)
    }
}

/// The conversion contract between a host type and a D-Bus [`Value`].
///
/// This plays the role the `Arg`/`Get`/`Append` family plays in a full
/// marshalling implementation, but only as far as the abstract value model:
/// turning wire bytes into `Value`s is the wire codec collaborator's job.
pub trait Arg: Sized {
    /// The D-Bus type this host type marshals as.
    fn dbus_type() -> Type;
    /// Convert to the value representation. Total.
    fn to_value(&self) -> Value;
    /// Convert from the value representation. `None` iff the dynamic type
    /// of `value` does not match.
    fn from_value(value: &Value) -> Option<Self>;

    /// Wrap as a self-describing variant.
    fn to_variant(&self) -> Variant {
        Variant::new(self.to_value())
    }
}

macro_rules! atom_arg {
    ($host:ty, $atom:ident, $ty:expr) => {
        impl Arg for $host {
            fn dbus_type() -> Type {
                $ty
            }
            fn to_value(&self) -> Value {
                Value::Atom(Atom::$atom(self.clone()))
            }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Atom(Atom::$atom(v)) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

atom_arg!(bool, Bool, Type::Boolean);
atom_arg!(u8, Word8, Type::Word8);
atom_arg!(u16, Word16, Type::Word16);
atom_arg!(u32, Word32, Type::Word32);
atom_arg!(u64, Word64, Type::Word64);
atom_arg!(i16, Int16, Type::Int16);
atom_arg!(i32, Int32, Type::Int32);
atom_arg!(i64, Int64, Type::Int64);
atom_arg!(f64, Double, Type::Double);
atom_arg!(String, Text, Type::String);
atom_arg!(Signature, Signature, Type::Signature);
atom_arg!(ObjectPath, ObjectPath, Type::ObjectPath);

impl From<String> for Variant {
    fn from(s: String) -> Self {
        Variant::new(Value::Atom(Atom::Text(s)))
    }
}

impl<T: Arg> Arg for Vec<T> {
    fn dbus_type() -> Type {
        Type::array(T::dbus_type())
    }
    fn to_value(&self) -> Value {
        if T::dbus_type() == Type::Word8 {
            let bytes: Option<Vec<u8>> = self
                .iter()
                .map(|v| {
                    if let Value::Atom(Atom::Word8(b)) = v.to_value() {
                        Some(b)
                    } else {
                        None
                    }
                })
                .collect();
            if let Some(b) = bytes {
                return Value::Bytes(b);
            }
        }
        Value::Vector(T::dbus_type(), self.iter().map(Arg::to_value).collect())
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vector(_, elems) => elems.iter().map(T::from_value).collect(),
            Value::Bytes(b) if T::dbus_type() == Type::Word8 => {
                b.iter().map(|byte| T::from_value(&Value::Atom(Atom::Word8(*byte)))).collect()
            }
            _ => None,
        }
    }
}

impl Arg for Variant {
    fn dbus_type() -> Type {
        Type::Variant
    }
    fn to_value(&self) -> Value {
        Value::Variant(Box::new(self.clone()))
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Variant(v) => Some((**v).clone()),
            _ => None,
        }
    }
}

impl<K, V> Arg for BTreeMap<K, V>
where
    K: Arg + Ord + Clone,
    V: Arg,
{
    fn dbus_type() -> Type {
        Type::dictionary(K::dbus_type(), V::dbus_type()).expect("map key type must be atomic")
    }
    fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        for (k, v) in self {
            if let Value::Atom(a) = k.to_value() {
                map.insert(a, v.to_value());
            }
        }
        Value::Map(K::dbus_type(), V::dbus_type(), map)
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(_, _, map) => {
                let mut out = BTreeMap::new();
                for (atom, v) in map {
                    let key = K::from_value(&Value::Atom(atom.clone()))?;
                    let val = V::from_value(v)?;
                    out.insert(key, val);
                }
                Some(out)
            }
            _ => None,
        }
    }
}

macro_rules! tuple_arg {
    ($($idx:tt => $name:ident),+) => {
        impl<$($name: Arg),+> Arg for ($($name,)+) {
            fn dbus_type() -> Type {
                Type::structure(vec![$($name::dbus_type()),+]).expect("non-empty tuple")
            }
            fn to_value(&self) -> Value {
                Value::Structure(vec![$(self.$idx.to_value()),+])
            }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Structure(fields) => {
                        let mut it = fields.iter();
                        $(let $name = $name::from_value(it.next()?)?;)+
                        if it.next().is_some() { return None; }
                        Some(($($name,)+))
                    }
                    _ => None,
                }
            }
        }
    };
}

tuple_arg!(0 => A);
tuple_arg!(0 => A, 1 => B);
tuple_arg!(0 => A, 1 => B, 2 => C);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K, 11 => L);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K, 11 => L, 12 => M);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K, 11 => L, 12 => M, 13 => N);
tuple_arg!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H, 8 => I, 9 => J, 10 => K, 11 => L, 12 => M, 13 => N, 14 => O);
