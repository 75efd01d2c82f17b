//! Declarative helpers for the binding conventions.
//!
//! The original surface repeats the same four shapes hundreds of times:
//! integer-valued wire enums with name tables, exact-length byte
//! identifiers, string-typed ids, and per-method dispatch closures. Each
//! shape is defined once here and instantiated per type, so the invariants
//! (exact integer values, length checks, tuple decoding) live in one place.

/// Defines an integer-valued wire enum.
///
/// Generates `code()`, `from_code()`, `name()`, `Display`, and serde
/// implementations that encode the exact wire integer. Decoding an integer
/// with no entry fails, with the raw decimal value in the error.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $code:literal => $tag:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            /// Wire integer value.
            #[must_use]
            pub const fn code(self) -> i32 {
                self as i32
            }

            /// Looks up a value by its wire integer.
            #[must_use]
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Protocol-level name of the value.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_i32(self.code())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let code = i32::deserialize(d)?;
                Self::from_code(code).ok_or_else(|| {
                    ::serde::de::Error::custom(format!(
                        concat!("unknown ", stringify!($name), " value {}"),
                        code
                    ))
                })
            }
        }
    };
}

/// Defines an exact-length byte identifier (key, nonce, signature, op id).
///
/// Encodes as msgpack bin; decoding checks the length and reports expected
/// and actual sizes on mismatch. No validation logic beyond the length.
macro_rules! fixed_bytes {
    (
        $(#[$meta:meta])*
        $name:ident, $len:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Exact byte length of this identifier.
            pub const LEN: usize = $len;

            /// Builds from a slice, returning `None` on a length mismatch.
            #[must_use]
            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                <[u8; $len]>::try_from(bytes).ok().map(Self)
            }

            /// Raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!(stringify!($name), "("))?;
                for b in &self.0 {
                    write!(f, "{b:02x}")?;
                }
                f.write_str(")")
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bytes(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                struct BytesVisitor;

                impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                    type Value = $name;

                    fn expecting(
                        &self,
                        f: &mut ::std::fmt::Formatter<'_>,
                    ) -> ::std::fmt::Result {
                        write!(f, concat!(stringify!($len), "-byte ", stringify!($name)))
                    }

                    fn visit_bytes<E: ::serde::de::Error>(
                        self,
                        v: &[u8],
                    ) -> Result<Self::Value, E> {
                        $name::from_slice(v).ok_or_else(|| {
                            E::custom(format!(
                                concat!(stringify!($name), ": expected {} bytes, got {}"),
                                $len,
                                v.len()
                            ))
                        })
                    }

                    fn visit_seq<A: ::serde::de::SeqAccess<'de>>(
                        self,
                        mut seq: A,
                    ) -> Result<Self::Value, A::Error> {
                        let mut bytes = Vec::with_capacity($len);
                        while let Some(b) = seq.next_element::<u8>()? {
                            bytes.push(b);
                        }
                        self.visit_bytes(&bytes)
                    }
                }

                d.deserialize_bytes(BytesVisitor)
            }
        }
    };
}

/// Defines a tagged union as a native sum type carrying the legacy wire
/// shape and accessor surface.
///
/// Encodes as a map holding the discriminant under its tag plus the one
/// populated case field under its tag; absent cases are omitted entirely.
/// Decoding rejects a discriminant whose payload field is missing (naming
/// the case) and an unknown discriminant integer (carrying the raw decimal
/// value). Per-case accessors panic when invoked against the wrong case;
/// the discriminant getter cannot fail since the type upholds the
/// discriminant/payload agreement.
macro_rules! wire_union {
    (
        $(#[$meta:meta])*
        $name:ident [$disc:ident @ $disc_tag:literal, $disc_fn:ident] {
            $(
                $(#[$vmeta:meta])*
                $variant:ident ($payload:ty) @ $tag:literal, $accessor:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $($(#[$vmeta])* $variant($payload),)+
        }

        impl $name {
            /// Discriminant of the populated case.
            #[must_use]
            pub fn $disc_fn(&self) -> $disc {
                match self {
                    $(Self::$variant(_) => $disc::$variant,)+
                }
            }

            $(
                /// Case payload; panics when a different case is populated.
                #[must_use]
                pub fn $accessor(&self) -> &$payload {
                    match self {
                        Self::$variant(v) => v,
                        _ => panic!("wrong case accessed"),
                    }
                }
            )+
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                use ::serde::ser::SerializeMap;
                let mut map = s.serialize_map(Some(2))?;
                map.serialize_entry($disc_tag, &self.$disc_fn())?;
                match self {
                    $(Self::$variant(v) => map.serialize_entry($tag, v)?,)+
                }
                map.end()
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                struct UnionVisitor;

                impl<'de> ::serde::de::Visitor<'de> for UnionVisitor {
                    type Value = $name;

                    fn expecting(
                        &self,
                        f: &mut ::std::fmt::Formatter<'_>,
                    ) -> ::std::fmt::Result {
                        f.write_str(concat!(
                            stringify!($name),
                            " map tagged by ",
                            $disc_tag
                        ))
                    }

                    fn visit_map<A: ::serde::de::MapAccess<'de>>(
                        self,
                        mut map: A,
                    ) -> Result<Self::Value, A::Error> {
                        // Tag order on the wire is not fixed; buffer case
                        // payloads until the discriminant is known.
                        let mut disc: Option<$disc> = None;
                        let mut cases: Vec<(String, ::rmpv::Value)> = Vec::new();
                        while let Some(key) = map.next_key::<String>()? {
                            if key == $disc_tag {
                                disc = Some(map.next_value()?);
                            } else {
                                cases.push((key, map.next_value()?));
                            }
                        }
                        let disc = disc.ok_or_else(|| {
                            ::serde::de::Error::custom(concat!(
                                stringify!($name),
                                ": missing discriminant ",
                                $disc_tag
                            ))
                        })?;
                        match disc {
                            $($disc::$variant => {
                                let payload = cases
                                    .into_iter()
                                    .find(|(key, _)| key == $tag)
                                    .map(|(_, value)| value)
                                    .ok_or_else(|| {
                                        $crate::common::missing_case::<A::Error>(
                                            stringify!($name),
                                            $tag,
                                        )
                                    })?;
                                ::rmpv::ext::from_value::<$payload>(payload)
                                    .map($name::$variant)
                                    .map_err(::serde::de::Error::custom)
                            })+
                        }
                    }
                }

                d.deserialize_map(UnionVisitor)
            }
        }
    };
}

/// Defines a string-typed identifier newtype with transparent encoding.
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// Builds a dispatch-table handler that forwards to an interface method.
///
/// `dispatch!(i, method: ArgType)` decodes the tuple-wrapped `ArgType` and
/// passes it through; `dispatch!(i, method(): ArgType)` decodes and
/// discards an empty argument record for zero-argument methods.
macro_rules! dispatch {
    ($i:ident, $method:ident (): $arg:ty) => {{
        let i = ::std::sync::Arc::clone(&$i);
        ::kbrpc::protocol::handler(move |_arg: $arg| {
            let i = ::std::sync::Arc::clone(&i);
            async move { i.$method().await }
        })
    }};
    ($i:ident, $method:ident: $arg:ty) => {{
        let i = ::std::sync::Arc::clone(&$i);
        ::kbrpc::protocol::handler(move |arg: $arg| {
            let i = ::std::sync::Arc::clone(&i);
            async move { i.$method(arg).await }
        })
    }};
}
