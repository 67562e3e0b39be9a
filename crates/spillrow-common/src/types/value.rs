//! Cell values and cell type tags.
//!
//! [`Cell`] is the dynamic type that can hold any column value, including a
//! distinguished missing marker. [`CellType`] identifies the concrete type
//! of a non-missing cell and is what the codec layer uses to pick a
//! serialization strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically-typed cell value.
///
/// Rows hold an ordered sequence of these. A cell is either a typed value
/// or [`Cell::Missing`]; cells are immutable once constructed.
///
/// # Examples
///
/// ```
/// use spillrow_common::Cell;
///
/// let age = Cell::from(30i64);
/// let name = Cell::from("Alice");
///
/// assert_eq!(age.as_int(), Some(30));
/// assert!(name.as_str().is_some());
/// assert!(!age.is_missing());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// The distinguished missing-value marker.
    Missing,

    /// Boolean value.
    Bool(bool),

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit floating point.
    Double(f64),

    /// UTF-8 string.
    Str(String),

    /// Opaque byte blob.
    Blob(Vec<u8>),

    /// Nested list of cells.
    List(Vec<Cell>),
}

impl Cell {
    /// Returns true if this is the missing-value marker.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the type tag of a non-missing cell, or `None` for
    /// [`Cell::Missing`].
    #[must_use]
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            Self::Missing => None,
            Self::Bool(_) => Some(CellType::Bool),
            Self::Int(_) => Some(CellType::Int),
            Self::Double(_) => Some(CellType::Double),
            Self::Str(_) => Some(CellType::Str),
            Self::Blob(_) => Some(CellType::Blob),
            Self::List(_) => Some(CellType::List),
        }
    }

    /// Returns the boolean value if this is a [`Cell::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value if this is a [`Cell::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float value if this is a [`Cell::Double`].
    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a [`Cell::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the blob bytes if this is a [`Cell::Blob`].
    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Cell {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

/// Type tag for a non-missing cell value.
///
/// The discriminant is part of the spill-file format: the codec writes it
/// as a single byte ahead of cells that use the custom serialization path,
/// so the values here must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellType {
    /// Boolean cell.
    Bool = 0,
    /// 64-bit integer cell.
    Int = 1,
    /// 64-bit float cell.
    Double = 2,
    /// String cell.
    Str = 3,
    /// Byte blob cell.
    Blob = 4,
    /// Nested list cell.
    List = 5,
}

impl CellType {
    /// Decodes a type tag from its wire discriminant.
    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Bool),
            1 => Some(Self::Int),
            2 => Some(Self::Double),
            3 => Some(Self::Str),
            4 => Some(Self::Blob),
            5 => Some(Self::List),
            _ => None,
        }
    }

    /// Returns a human-readable name for the type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Double => "Double",
            Self::Str => "Str",
            Self::Blob => "Blob",
            Self::List => "List",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_type_tags() {
        assert_eq!(Cell::Missing.cell_type(), None);
        assert_eq!(Cell::from(1i64).cell_type(), Some(CellType::Int));
        assert_eq!(Cell::from("x").cell_type(), Some(CellType::Str));
        assert_eq!(
            Cell::List(vec![Cell::Missing]).cell_type(),
            Some(CellType::List)
        );
    }

    #[test]
    fn test_cell_accessors() {
        assert_eq!(Cell::from(42i64).as_int(), Some(42));
        assert_eq!(Cell::from(42i64).as_str(), None);
        assert_eq!(Cell::from(true).as_bool(), Some(true));
        assert_eq!(Cell::from(1.5f64).as_double(), Some(1.5));
        assert_eq!(Cell::from(vec![1u8, 2]).as_blob(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_cell_type_round_trip() {
        for ty in [
            CellType::Bool,
            CellType::Int,
            CellType::Double,
            CellType::Str,
            CellType::Blob,
            CellType::List,
        ] {
            assert_eq!(CellType::from_u8(ty as u8), Some(ty));
        }
        assert_eq!(CellType::from_u8(200), None);
    }
}
