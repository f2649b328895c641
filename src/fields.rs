//! Field kinds and the values they decode to.
//!
//! Every register is a big-endian 16-bit word. Multi-register numbers
//! (serial numbers, versions) are stored low word first.

use crate::error::{DecodeError, DeclarationError};
use serde::{Serialize, Serializer};
use std::{any::TypeId, fmt};

pub type Page = u8;
pub type Address = u16;

pub const MAX_DECIMAL_SCALE: u8 = 4;
pub const SERIAL_NUMBER_REGISTERS: u8 = 4;

const POW10: [u16; MAX_DECIMAL_SCALE as usize + 1] = [1, 10, 100, 1000, 10000];

/// A closed set of protocol symbols backed by fixed register values.
///
/// Implemented by [`protocol_enum!`](crate::protocol_enum) for every enumerated
/// field a device exposes.
pub trait SymbolSet: Sized + Copy + 'static {
    const NAME: &'static str;
    const VARIANTS: &'static [Self];

    fn raw(self) -> u16;
    fn symbol(self) -> &'static str;

    fn from_raw(raw: u16) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.raw() == raw)
    }
}

/// Declares an enumerated register value with explicit protocol discriminants.
///
/// ```
/// bluetti_core::protocol_enum! {
///     pub enum Fan: "fan" {
///         Off = 0 => "OFF",
///         On = 1 => "ON",
///     }
/// }
///
/// assert_eq!(Fan::try_from(1u16), Ok(Fan::On));
/// assert!(Fan::try_from(7u16).is_err());
/// ```
#[macro_export]
macro_rules! protocol_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $set:literal {
            $($variant:ident = $raw:literal => $symbol:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
        $vis enum $name {
            $($variant = $raw),+
        }

        impl $crate::fields::SymbolSet for $name {
            const NAME: &'static str = $set;
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];

            fn raw(self) -> u16 {
                self as u16
            }

            fn symbol(self) -> &'static str {
                match self {
                    $($name::$variant => $symbol),+
                }
            }
        }

        impl TryFrom<u16> for $name {
            type Error = u16;

            fn try_from(value: u16) -> Result<Self, <Self as TryFrom<u16>>::Error> {
                match value {
                    $($raw => Ok($name::$variant),)+
                    other => Err(other),
                }
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S: $crate::__serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::fields::SymbolSet::symbol(*self))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::fields::SymbolSet::symbol(*self))
            }
        }
    };
}

/// Type-erased handle on a [`SymbolSet`], stored inside a field declaration.
#[derive(Clone, Copy)]
pub struct EnumKind {
    id: TypeId,
    name: &'static str,
    symbols: usize,
    lookup: fn(u16) -> Option<&'static str>,
}

impl EnumKind {
    pub fn of<E: SymbolSet>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::NAME,
            symbols: E::VARIANTS.len(),
            lookup: |raw| E::from_raw(raw).map(E::symbol),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumKind")
            .field("name", &self.name)
            .field("symbols", &self.symbols)
            .finish()
    }
}

impl PartialEq for EnumKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnumKind {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String { registers: u16 },
    SerialNumber { registers: u8 },
    Version,
    UnsignedInt,
    Bool,
    Decimal { scale: u8 },
    Enum(EnumKind),
}

/// How a field's registers are interpreted.
///
/// Only the checked constructors build one, so every `FieldKind` in
/// existence decodes without panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKind(Kind);

impl FieldKind {
    pub const VERSION: Self = FieldKind(Kind::Version);
    pub const UNSIGNED_INT: Self = FieldKind(Kind::UnsignedInt);
    pub const BOOL: Self = FieldKind(Kind::Bool);

    pub fn string(registers: u16) -> Result<Self, DeclarationError> {
        if registers == 0 {
            return Err(DeclarationError::EmptyString);
        }

        Ok(FieldKind(Kind::String { registers }))
    }

    pub fn serial_number() -> Self {
        FieldKind(Kind::SerialNumber {
            registers: SERIAL_NUMBER_REGISTERS,
        })
    }

    /// Serial number over a shorter span than the default four registers.
    pub fn serial_number_of(registers: u8) -> Result<Self, DeclarationError> {
        if !(1..=SERIAL_NUMBER_REGISTERS).contains(&registers) {
            return Err(DeclarationError::SerialNumberSpan(registers));
        }

        Ok(FieldKind(Kind::SerialNumber { registers }))
    }

    pub fn decimal(scale: u8) -> Result<Self, DeclarationError> {
        if scale > MAX_DECIMAL_SCALE {
            return Err(DeclarationError::DecimalScale(scale));
        }

        Ok(FieldKind(Kind::Decimal { scale }))
    }

    pub fn enumeration<E: SymbolSet>() -> Result<Self, DeclarationError> {
        if E::VARIANTS.is_empty() {
            return Err(DeclarationError::EmptySymbolSet(E::NAME));
        }

        Ok(FieldKind(Kind::Enum(EnumKind::of::<E>())))
    }

    /// Number of registers the field occupies.
    pub fn registers(&self) -> u16 {
        match self.0 {
            Kind::String { registers } => registers,
            Kind::SerialNumber { registers } => registers as u16,
            Kind::Version => 2,
            Kind::UnsignedInt | Kind::Bool | Kind::Decimal { .. } | Kind::Enum(_) => 1,
        }
    }

    /// Decodes the field from `bytes`, which start at the field's first register.
    ///
    /// Extra trailing bytes are ignored; a short buffer is reported as truncated.
    pub fn decode(&self, field: &str, bytes: &[u8]) -> Result<FieldValue, DecodeError> {
        let needed = self.registers() as usize * 2;

        if bytes.len() < needed {
            return Err(DecodeError::TruncatedField {
                field: field.to_owned(),
                needed,
                available: bytes.len(),
            });
        }

        let bytes = &bytes[..needed];

        Ok(match self.0 {
            Kind::String { .. } => {
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                FieldValue::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
            },
            Kind::SerialNumber { .. } => FieldValue::SerialNumber(low_word_first(bytes)),
            Kind::Version => FieldValue::Version(Version::from_raw(low_word_first(bytes) as u32)),
            Kind::UnsignedInt => FieldValue::UnsignedInt(word(bytes)),
            Kind::Bool => FieldValue::Bool(word(bytes) != 0),
            Kind::Decimal { scale } => FieldValue::Decimal(Decimal { mantissa: word(bytes), scale }),
            Kind::Enum(kind) => {
                let raw = word(bytes);

                match (kind.lookup)(raw) {
                    Some(symbol) => FieldValue::Enum(Symbol {
                        set: kind.name,
                        name: symbol,
                        raw,
                        id: kind.id,
                    }),
                    None => {
                        return Err(DecodeError::UnknownEnumValue {
                            field: field.to_owned(),
                            raw,
                        })
                    },
                }
            },
        })
    }
}

fn word(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn low_word_first(bytes: &[u8]) -> u64 {
    bytes
        .chunks_exact(2)
        .enumerate()
        .fold(0, |acc, (i, w)| acc | (u16::from_be_bytes([w[0], w[1]]) as u64) << (16 * i))
}

/// Firmware version stored as hundredths (`10603` is `106.03`).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct Version {
    raw: u32,
}

impl Version {
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    pub const fn raw(&self) -> u32 {
        self.raw
    }

    pub const fn major(&self) -> u32 {
        self.raw / 100
    }

    pub const fn minor(&self) -> u32 {
        self.raw % 100
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major(), self.minor())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Fixed-point number: `mantissa / 10^scale`.
///
/// Equality is structural, `Decimal::new(2300, 1) != Decimal::new(23000, 2)`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Decimal {
    mantissa: u16,
    scale: u8,
}

impl Decimal {
    /// # Panics
    ///
    /// If `scale` exceeds [`MAX_DECIMAL_SCALE`].
    pub fn new(mantissa: u16, scale: u8) -> Self {
        assert!(scale <= MAX_DECIMAL_SCALE, "decimal scale {scale} out of range");
        Self { mantissa, scale }
    }

    pub fn mantissa(&self) -> u16 {
        self.mantissa
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / POW10[self.scale as usize] as f64
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }

        let div = POW10[self.scale as usize];
        write!(
            f,
            "{}.{:0width$}",
            self.mantissa / div,
            self.mantissa % div,
            width = self.scale as usize
        )
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

/// A decoded enumerated value, still carrying the raw register value.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Symbol {
    pub set: &'static str,
    pub name: &'static str,
    pub raw: u16,
    id: TypeId,
}

impl Symbol {
    /// Converts back to the typed enum, if this symbol belongs to `E`.
    pub fn to_enum<E: SymbolSet>(&self) -> Option<E> {
        if self.id == TypeId::of::<E>() {
            E::from_raw(self.raw)
        } else {
            None
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

#[derive(Serialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    SerialNumber(u64),
    Version(Version),
    UnsignedInt(u16),
    Bool(bool),
    Decimal(Decimal),
    Enum(Symbol),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match *self {
            FieldValue::UnsignedInt(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            FieldValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Decimal(d) => Some(d.to_f64()),
            FieldValue::UnsignedInt(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_enum<E: SymbolSet>(&self) -> Option<E> {
        match self {
            FieldValue::Enum(symbol) => symbol.to_enum(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::SerialNumber(n) => write!(f, "{n}"),
            FieldValue::Version(v) => write!(f, "{v}"),
            FieldValue::UnsignedInt(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Decimal(d) => write!(f, "{d}"),
            FieldValue::Enum(s) => f.write_str(s.name),
        }
    }
}
