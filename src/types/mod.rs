//! The D-Bus type algebra: [`Type`], the atomic-type predicate, and the
//! [`Signature`] codec built on top of it.

mod signature;

pub use signature::Signature;

use std::fmt;

/// A D-Bus type. Mirrors the grammar of the D-Bus signature language.
///
/// File descriptors (`h`) are not representable; they are explicitly out of
/// scope for this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `b`
    Boolean,
    /// `y`
    Word8,
    /// `q`
    Word16,
    /// `u`
    Word32,
    /// `t`
    Word64,
    /// `n`
    Int16,
    /// `i`
    Int32,
    /// `x`
    Int64,
    /// `d`
    Double,
    /// `s`
    String,
    /// `g`
    Signature,
    /// `o`
    ObjectPath,
    /// `v`
    Variant,
    /// `a` followed by an element type.
    Array(Box<Type>),
    /// `a{kv}`; the key type must be atomic (see [`Type::is_atomic`]).
    Dictionary(Box<Type>, Box<Type>),
    /// `(...)`; must have at least one field.
    Structure(Vec<Type>),
}

impl Type {
    /// True for the twelve scalar/string cases that may be used as a
    /// dictionary key.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Type::Boolean
                | Type::Word8
                | Type::Word16
                | Type::Word32
                | Type::Word64
                | Type::Int16
                | Type::Int32
                | Type::Int64
                | Type::Double
                | Type::String
                | Type::Signature
                | Type::ObjectPath
        )
    }

    /// Build a validated dictionary type, rejecting non-atomic keys.
    pub fn dictionary(key: Type, value: Type) -> Result<Type, crate::error::SignatureFormatError> {
        if !key.is_atomic() {
            return Err(crate::error::SignatureFormatError::NonAtomicKey);
        }
        Ok(Type::Dictionary(Box::new(key), Box::new(value)))
    }

    /// Build a validated structure type, rejecting the empty field list.
    pub fn structure(fields: Vec<Type>) -> Result<Type, crate::error::SignatureFormatError> {
        if fields.is_empty() {
            return Err(crate::error::SignatureFormatError::EmptyStructure);
        }
        Ok(Type::Structure(fields))
    }

    /// Build an array type.
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    /// Number of bytes this type occupies in its signature encoding.
    pub fn encoded_len(&self) -> usize {
        match self {
            Type::Array(t) => 1 + t.encoded_len(),
            Type::Dictionary(k, v) => 3 + k.encoded_len() + v.encoded_len(),
            Type::Structure(ts) => 2 + ts.iter().map(Type::encoded_len).sum::<usize>(),
            _ => 1,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "Bool"),
            Type::Word8 => write!(f, "Word8"),
            Type::Word16 => write!(f, "Word16"),
            Type::Word32 => write!(f, "Word32"),
            Type::Word64 => write!(f, "Word64"),
            Type::Int16 => write!(f, "Int16"),
            Type::Int32 => write!(f, "Int32"),
            Type::Int64 => write!(f, "Int64"),
            Type::Double => write!(f, "Double"),
            Type::String => write!(f, "String"),
            Type::Signature => write!(f, "Signature"),
            Type::ObjectPath => write!(f, "ObjectPath"),
            Type::Variant => write!(f, "Variant"),
            Type::Array(t) => write!(f, "[{}]", t),
            Type::Dictionary(k, v) => write!(f, "Map {} {}", paren(k), paren(v)),
            Type::Structure(ts) => {
                write!(f, "(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn paren(t: &Type) -> String {
    match t {
        Type::Dictionary(..) => format!("({})", t),
        _ => format!("{}", t),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn show_atoms() {
        assert_eq!(Type::Boolean.to_string(), "Bool");
        assert_eq!(Type::Word8.to_string(), "Word8");
        assert_eq!(Type::Double.to_string(), "Double");
        assert_eq!(Type::String.to_string(), "String");
        assert_eq!(Type::Signature.to_string(), "Signature");
        assert_eq!(Type::ObjectPath.to_string(), "ObjectPath");
        assert_eq!(Type::Variant.to_string(), "Variant");
    }

    #[test]
    fn show_array() {
        assert_eq!(Type::array(Type::Word8).to_string(), "[Word8]");
    }

    #[test]
    fn show_nested_dict() {
        let inner = Type::dictionary(Type::Word8, Type::Word8).unwrap();
        let outer = Type::dictionary(Type::Word8, inner).unwrap();
        assert_eq!(outer.to_string(), "Map Word8 (Map Word8 Word8)");
    }

    #[test]
    fn show_structure() {
        let s = Type::structure(vec![Type::Word8, Type::Word16]).unwrap();
        assert_eq!(s.to_string(), "(Word8, Word16)");
    }

    #[test]
    fn dictionary_rejects_non_atomic_key() {
        let err = Type::dictionary(Type::array(Type::Word8), Type::Word8).unwrap_err();
        assert_eq!(err, crate::error::SignatureFormatError::NonAtomicKey);
    }

    #[test]
    fn structure_rejects_empty() {
        let err = Type::structure(vec![]).unwrap_err();
        assert_eq!(err, crate::error::SignatureFormatError::EmptyStructure);
    }
}
