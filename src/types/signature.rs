//! The compact byte-encoded signature language and its recursive-descent
//! parser.

use std::fmt;
use super::Type;
use crate::error::SignatureFormatError;

/// Maximum number of bytes a formatted signature may occupy.
pub const MAX_SIGNATURE_LEN: usize = 255;

/// Maximum nesting depth for arrays and for structures, matching the limits
/// the reference D-Bus implementation enforces.
const MAX_ARRAY_DEPTH: u32 = 32;
const MAX_STRUCT_DEPTH: u32 = 32;

/// A validated sequence of top-level [`Type`]s whose signature encoding is
/// at most 255 bytes long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    types: Vec<Type>,
}

impl Signature {
    /// An empty signature (no arguments).
    pub fn empty() -> Self {
        Signature { types: Vec::new() }
    }

    /// Build a signature from a list of types, rejecting one whose encoded
    /// length would exceed [`MAX_SIGNATURE_LEN`], or whose array/structure
    /// nesting is deeper than the parser would accept back.
    pub fn new(types: Vec<Type>) -> Result<Self, SignatureFormatError> {
        let len: usize = types.iter().map(Type::encoded_len).sum();
        if len > MAX_SIGNATURE_LEN {
            return Err(SignatureFormatError::TooLong(len));
        }
        for t in &types {
            check_depth(t, 0, 0)?;
        }
        Ok(Signature { types })
    }

    /// A signature of a single type.
    pub fn single(t: Type) -> Result<Self, SignatureFormatError> {
        Signature::new(vec![t])
    }

    /// The top-level types this signature describes.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Parse a signature from its byte-encoded form.
    pub fn parse(bytes: &[u8]) -> Result<Self, SignatureFormatError> {
        if bytes.len() > MAX_SIGNATURE_LEN {
            return Err(SignatureFormatError::TooLong(bytes.len()));
        }
        let mut pos = 0;
        let mut types = Vec::new();
        while pos < bytes.len() {
            let (t, next) = parse_single(bytes, pos, 0, 0)?;
            types.push(t);
            pos = next;
        }
        Ok(Signature { types })
    }

    /// Format this signature back into its byte-encoded form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for t in &self.types {
            write_type(t, &mut out);
        }
        out
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        // The signature alphabet is pure ASCII by construction.
        write!(f, "{}", std::str::from_utf8(&bytes).unwrap())
    }
}

fn write_type(t: &Type, out: &mut Vec<u8>) {
    match t {
        Type::Boolean => out.push(b'b'),
        Type::Word8 => out.push(b'y'),
        Type::Word16 => out.push(b'q'),
        Type::Word32 => out.push(b'u'),
        Type::Word64 => out.push(b't'),
        Type::Int16 => out.push(b'n'),
        Type::Int32 => out.push(b'i'),
        Type::Int64 => out.push(b'x'),
        Type::Double => out.push(b'd'),
        Type::String => out.push(b's'),
        Type::Signature => out.push(b'g'),
        Type::ObjectPath => out.push(b'o'),
        Type::Variant => out.push(b'v'),
        Type::Array(inner) => {
            out.push(b'a');
            write_type(inner, out);
        }
        Type::Dictionary(k, v) => {
            out.push(b'a');
            out.push(b'{');
            write_type(k, out);
            write_type(v, out);
            out.push(b'}');
        }
        Type::Structure(fields) => {
            out.push(b'(');
            for f in fields {
                write_type(f, out);
            }
            out.push(b')');
        }
    }
}

/// Reject a `Type` whose array/structure nesting is deeper than
/// [`MAX_ARRAY_DEPTH`]/[`MAX_STRUCT_DEPTH`] — the same bound `parse_single`
/// enforces, so a `Signature` can never be built in a shape its own parser
/// would refuse to read back.
fn check_depth(t: &Type, array_depth: u32, struct_depth: u32) -> Result<(), SignatureFormatError> {
    match t {
        Type::Array(inner) => {
            if array_depth >= MAX_ARRAY_DEPTH {
                return Err(SignatureFormatError::InvalidSyntax(0));
            }
            check_depth(inner, array_depth + 1, struct_depth)
        }
        Type::Dictionary(k, v) => {
            if array_depth >= MAX_ARRAY_DEPTH {
                return Err(SignatureFormatError::InvalidSyntax(0));
            }
            check_depth(k, array_depth + 1, struct_depth)?;
            check_depth(v, array_depth + 1, struct_depth)
        }
        Type::Structure(fields) => {
            if struct_depth >= MAX_STRUCT_DEPTH {
                return Err(SignatureFormatError::InvalidSyntax(0));
            }
            for f in fields {
                check_depth(f, array_depth, struct_depth + 1)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Parse one type starting at `pos`. Returns the type and the position just
/// past it. `array_depth`/`struct_depth` bound recursion to guard against
/// pathological input.
fn parse_single(
    bytes: &[u8],
    pos: usize,
    array_depth: u32,
    struct_depth: u32,
) -> Result<(Type, usize), SignatureFormatError> {
    let b = *bytes
        .get(pos)
        .ok_or(SignatureFormatError::InvalidSyntax(pos))?;
    match b {
        b'b' => Ok((Type::Boolean, pos + 1)),
        b'y' => Ok((Type::Word8, pos + 1)),
        b'q' => Ok((Type::Word16, pos + 1)),
        b'u' => Ok((Type::Word32, pos + 1)),
        b't' => Ok((Type::Word64, pos + 1)),
        b'n' => Ok((Type::Int16, pos + 1)),
        b'i' => Ok((Type::Int32, pos + 1)),
        b'x' => Ok((Type::Int64, pos + 1)),
        b'd' => Ok((Type::Double, pos + 1)),
        b's' => Ok((Type::String, pos + 1)),
        b'g' => Ok((Type::Signature, pos + 1)),
        b'o' => Ok((Type::ObjectPath, pos + 1)),
        b'v' => Ok((Type::Variant, pos + 1)),
        b'a' => {
            if array_depth >= MAX_ARRAY_DEPTH {
                return Err(SignatureFormatError::InvalidSyntax(pos));
            }
            parse_array_tail(bytes, pos + 1, array_depth + 1, struct_depth)
        }
        b'(' => {
            if struct_depth >= MAX_STRUCT_DEPTH {
                return Err(SignatureFormatError::InvalidSyntax(pos));
            }
            parse_structure_body(bytes, pos + 1, array_depth, struct_depth + 1)
        }
        _ => Err(SignatureFormatError::InvalidSyntax(pos)),
    }
}

/// After an `a`: either a dict `{...}`, or any other single type.
fn parse_array_tail(
    bytes: &[u8],
    pos: usize,
    array_depth: u32,
    struct_depth: u32,
) -> Result<(Type, usize), SignatureFormatError> {
    if bytes.get(pos) == Some(&b'{') {
        let (key, next) = parse_single(bytes, pos + 1, array_depth, struct_depth)?;
        if !key.is_atomic() {
            return Err(SignatureFormatError::NonAtomicKey);
        }
        let (value, next) = parse_single(bytes, next, array_depth, struct_depth)?;
        if bytes.get(next) != Some(&b'}') {
            return Err(SignatureFormatError::InvalidSyntax(next));
        }
        Ok((Type::Dictionary(Box::new(key), Box::new(value)), next + 1))
    } else {
        parse_single(bytes, pos, array_depth, struct_depth)
    }
}

/// After a `(`: one or more types, terminated by `)`.
fn parse_structure_body(
    bytes: &[u8],
    pos: usize,
    array_depth: u32,
    struct_depth: u32,
) -> Result<(Type, usize), SignatureFormatError> {
    let mut fields = Vec::new();
    let mut cur = pos;
    loop {
        if bytes.get(cur) == Some(&b')') {
            if fields.is_empty() {
                return Err(SignatureFormatError::EmptyStructure);
            }
            return Ok((Type::Structure(fields), cur + 1));
        }
        let (t, next) = parse_single(bytes, cur, array_depth, struct_depth)?;
        fields.push(t);
        cur = next;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn roundtrip(t: Type) {
        let sig = Signature::single(t.clone()).unwrap();
        let bytes = sig.to_bytes();
        let parsed = Signature::parse(&bytes).unwrap();
        assert_eq!(parsed.types(), &[t]);
    }

    #[test]
    fn atoms_roundtrip() {
        roundtrip(Type::Boolean);
        roundtrip(Type::Word8);
        roundtrip(Type::Word16);
        roundtrip(Type::Word32);
        roundtrip(Type::Word64);
        roundtrip(Type::Int16);
        roundtrip(Type::Int32);
        roundtrip(Type::Int64);
        roundtrip(Type::Double);
        roundtrip(Type::String);
        roundtrip(Type::Signature);
        roundtrip(Type::ObjectPath);
        roundtrip(Type::Variant);
    }

    #[test]
    fn container_roundtrip() {
        roundtrip(Type::array(Type::Word8));
        roundtrip(Type::dictionary(Type::String, Type::Variant).unwrap());
        roundtrip(Type::structure(vec![Type::Word8, Type::String]).unwrap());
        roundtrip(Type::array(Type::structure(vec![Type::Int32, Type::array(Type::String)]).unwrap()));
    }

    #[test]
    fn empty_signature() {
        let sig = Signature::parse(b"").unwrap();
        assert!(sig.types().is_empty());
    }

    #[test]
    fn rejects_bare_r_and_e() {
        assert!(Signature::parse(b"r").is_err());
        assert!(Signature::parse(b"e").is_err());
    }

    #[test]
    fn rejects_empty_struct() {
        assert!(Signature::parse(b"()").is_err());
    }

    #[test]
    fn rejects_non_atomic_dict_key() {
        assert!(Signature::parse(b"a{vy}").is_err());
    }

    #[test]
    fn rejects_file_descriptor_code() {
        assert!(Signature::parse(b"h").is_err());
    }

    #[test]
    fn rejects_over_255_bytes() {
        let long = vec![b'y'; 256];
        assert!(Signature::parse(&long).is_err());
    }

    #[test]
    fn accepts_254_and_255_bytes() {
        assert!(Signature::parse(&vec![b'y'; 254]).is_ok());
        assert!(Signature::parse(&vec![b'y'; 255]).is_ok());
    }

    #[test]
    fn signature_from_255_word8s() {
        let types = vec![Type::Word8; 255];
        assert!(Signature::new(types).is_ok());
    }

    #[test]
    fn signature_from_256_word8s_fails() {
        let types = vec![Type::Word8; 256];
        assert!(Signature::new(types).is_err());
    }

    #[test]
    fn new_rejects_array_nesting_the_parser_would_reject() {
        let mut t = Type::Word8;
        for _ in 0..33 {
            t = Type::array(t);
        }
        // Well within the 255-byte limit, but deeper than parse_single allows.
        assert!(Signature::single(t).is_err());
    }

    #[test]
    fn new_accepts_array_nesting_at_the_parser_limit() {
        let mut t = Type::Word8;
        for _ in 0..32 {
            t = Type::array(t);
        }
        let sig = Signature::single(t).unwrap();
        assert_eq!(Signature::parse(&sig.to_bytes()).unwrap(), sig);
    }

    #[test]
    fn new_rejects_struct_nesting_the_parser_would_reject() {
        let mut t = Type::Word8;
        for _ in 0..33 {
            t = Type::structure(vec![t]).unwrap();
        }
        assert!(Signature::single(t).is_err());
    }

    #[test]
    fn display_matches_to_bytes() {
        let sig = Signature::new(vec![Type::array(Type::Word8), Type::String]).unwrap();
        assert_eq!(sig.to_string(), "ays");
    }
}

#[cfg(test)]
mod quickcheck_test {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    #[derive(Clone, Debug)]
    struct SmallType(Type);

    impl Arbitrary for SmallType {
        fn arbitrary(g: &mut Gen) -> Self {
            fn gen_type(g: &mut Gen, depth: u32) -> Type {
                let atoms: &[fn() -> Type] = &[
                    || Type::Boolean,
                    || Type::Word8,
                    || Type::Word32,
                    || Type::Int32,
                    || Type::Double,
                    || Type::String,
                    || Type::ObjectPath,
                    || Type::Signature,
                    || Type::Variant,
                ];
                if depth >= 3 {
                    return (atoms[usize::arbitrary(g) % atoms.len()])();
                }
                match u8::arbitrary(g) % 3 {
                    0 => (atoms[usize::arbitrary(g) % atoms.len()])(),
                    1 => Type::array(gen_type(g, depth + 1)),
                    _ => Type::structure(vec![gen_type(g, depth + 1), gen_type(g, depth + 1)]).unwrap(),
                }
            }
            SmallType(gen_type(g, 0))
        }
    }

    quickcheck! {
        fn parse_format_roundtrip(t: SmallType) -> bool {
            let sig = match Signature::single(t.0.clone()) {
                Ok(s) => s,
                Err(_) => return true,
            };
            let bytes = sig.to_bytes();
            Signature::parse(&bytes).map(|s| s.types().to_vec()) == Ok(vec![t.0])
        }
    }
}
