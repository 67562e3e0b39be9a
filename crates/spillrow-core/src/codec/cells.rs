//! Built-in custom cell serializers.
//!
//! These are the fast path of the record codec: fixed-width primitive
//! encodings, little-endian, one frame per cell. `Blob` and `List` have no
//! entry here and fall back to the generic bincode path.

use std::io;

use spillrow_common::{Cell, CellType};

use super::record::{CellRead, CellSerializer, CellWrite};

/// Boolean cells: one byte, zero or one.
pub struct BoolSerializer;

/// Integer cells: one little-endian i64.
pub struct IntSerializer;

/// Float cells: one little-endian f64.
pub struct DoubleSerializer;

/// String cells: u32 length plus UTF-8 bytes.
pub struct StrSerializer;

fn type_mismatch(expected: &str, cell: &Cell) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("expected a {expected} cell, got {cell:?}"),
    )
}

impl CellSerializer for BoolSerializer {
    fn write_cell(&self, cell: &Cell, out: &mut dyn CellWrite) -> io::Result<()> {
        match cell {
            Cell::Bool(b) => out.put_u8(u8::from(*b)),
            other => Err(type_mismatch("boolean", other)),
        }
    }

    fn read_cell(&self, input: &mut dyn CellRead) -> io::Result<Cell> {
        Ok(Cell::Bool(input.get_u8()? != 0))
    }
}

impl CellSerializer for IntSerializer {
    fn write_cell(&self, cell: &Cell, out: &mut dyn CellWrite) -> io::Result<()> {
        match cell {
            Cell::Int(v) => out.put_i64(*v),
            other => Err(type_mismatch("integer", other)),
        }
    }

    fn read_cell(&self, input: &mut dyn CellRead) -> io::Result<Cell> {
        Ok(Cell::Int(input.get_i64()?))
    }
}

impl CellSerializer for DoubleSerializer {
    fn write_cell(&self, cell: &Cell, out: &mut dyn CellWrite) -> io::Result<()> {
        match cell {
            Cell::Double(v) => out.put_f64(*v),
            other => Err(type_mismatch("double", other)),
        }
    }

    fn read_cell(&self, input: &mut dyn CellRead) -> io::Result<Cell> {
        Ok(Cell::Double(input.get_f64()?))
    }
}

impl CellSerializer for StrSerializer {
    fn write_cell(&self, cell: &Cell, out: &mut dyn CellWrite) -> io::Result<()> {
        match cell {
            Cell::Str(s) => out.put_str(s),
            other => Err(type_mismatch("string", other)),
        }
    }

    fn read_cell(&self, input: &mut dyn CellRead) -> io::Result<Cell> {
        Ok(Cell::Str(input.get_str()?))
    }
}

/// Returns the dedicated serializer for a cell type, or `None` for types
/// that use the generic path.
#[must_use]
pub fn custom_serializer(ty: CellType) -> Option<&'static dyn CellSerializer> {
    match ty {
        CellType::Bool => Some(&BoolSerializer),
        CellType::Int => Some(&IntSerializer),
        CellType::Double => Some(&DoubleSerializer),
        CellType::Str => Some(&StrSerializer),
        CellType::Blob | CellType::List => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ser: &dyn CellSerializer, cell: &Cell) -> Cell {
        let mut buf = Vec::new();
        ser.write_cell(cell, &mut buf).unwrap();
        ser.read_cell(&mut &buf[..]).unwrap()
    }

    #[test]
    fn test_primitive_round_trips() {
        assert_eq!(round_trip(&BoolSerializer, &Cell::from(true)), Cell::Bool(true));
        assert_eq!(
            round_trip(&IntSerializer, &Cell::from(i64::MIN)),
            Cell::Int(i64::MIN)
        );
        assert_eq!(
            round_trip(&DoubleSerializer, &Cell::from(-0.5f64)),
            Cell::Double(-0.5)
        );
        assert_eq!(
            round_trip(&StrSerializer, &Cell::from("héllo")),
            Cell::Str("héllo".to_string())
        );
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let mut buf = Vec::new();
        let err = IntSerializer
            .write_cell(&Cell::from("not an int"), &mut buf)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_fast_path_coverage() {
        assert!(custom_serializer(CellType::Int).is_some());
        assert!(custom_serializer(CellType::Str).is_some());
        assert!(custom_serializer(CellType::Blob).is_none());
        assert!(custom_serializer(CellType::List).is_none());
    }
}
