//! Coercion of interpreter values into typed kernel arguments.

use rhai::{Array, Dynamic};

use crate::lifecycle::FieldHandle;
use crate::prelude::{EditError, EditResult};

fn invalid(what: &str, expected: &str, value: &Dynamic) -> EditError {
    EditError::InvalidParameter(format!(
        "{} must be {}, got {}",
        what,
        expected,
        value.type_name()
    ))
}

/// A field is named by a string or by a handle a kernel returned.
pub(crate) fn field_handle(what: &str, value: &Dynamic) -> EditResult<FieldHandle> {
    if value.is::<FieldHandle>() {
        return Ok(value.clone_cast::<FieldHandle>());
    }
    match value.clone().into_string() {
        Ok(name) => Ok(FieldHandle::Committed(name)),
        Err(_) => Err(invalid(what, "a field name or handle", value)),
    }
}

pub(crate) fn number(what: &str, value: &Dynamic) -> EditResult<f64> {
    if let Ok(float) = value.as_float() {
        return Ok(float);
    }
    value
        .as_int()
        .map(|int| int as f64)
        .map_err(|_| invalid(what, "a number", value))
}

pub(crate) fn real(what: &str, value: &Dynamic) -> EditResult<f32> {
    number(what, value).map(|v| v as f32)
}

/// Non-negative whole number, such as a gate index or window length.
pub(crate) fn count(what: &str, value: &Dynamic) -> EditResult<usize> {
    let n = number(what, value)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(EditError::InvalidParameter(format!(
            "{} must be a non-negative whole number, got {}",
            what, n
        )));
    }
    Ok(n as usize)
}

pub(crate) fn integer(what: &str, value: &Dynamic) -> EditResult<i32> {
    let n = number(what, value)?;
    if n.fract() != 0.0 {
        return Err(EditError::InvalidParameter(format!(
            "{} must be a whole number, got {}",
            what, n
        )));
    }
    Ok(n as i32)
}

/// `()` selects the field's own missing sentinel.
pub(crate) fn missing_or(value: &Dynamic) -> EditResult<Option<f32>> {
    if value.is_unit() {
        Ok(None)
    } else {
        real("bad data value", value).map(Some)
    }
}

/// Gate array left in the namespace by a script.
pub(crate) enum GateArray {
    Values(Vec<f32>),
    Flags(Vec<bool>),
}

pub(crate) fn gate_array(name: &str, array: Array) -> EditResult<GateArray> {
    if !array.is_empty() && array.iter().all(|item| item.is_bool()) {
        return Ok(GateArray::Flags(
            array.iter().map(|item| item.as_bool().unwrap_or(false)).collect(),
        ));
    }
    array
        .iter()
        .map(|item| real(name, item))
        .collect::<EditResult<Vec<f32>>>()
        .map(GateArray::Values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_and_handles_name_fields() {
        assert_eq!(
            field_handle("field", &Dynamic::from("VEL".to_string())).unwrap(),
            FieldHandle::committed("VEL")
        );
        let handle = FieldHandle::committed("DBZ");
        assert_eq!(
            field_handle("field", &Dynamic::from(handle.clone())).unwrap(),
            handle
        );
        assert!(field_handle("field", &Dynamic::from(3_i64)).is_err());
    }

    #[test]
    fn numbers_accept_ints_and_floats() {
        assert_eq!(number("x", &Dynamic::from(2_i64)).unwrap(), 2.0);
        assert_eq!(number("x", &Dynamic::from(2.5_f64)).unwrap(), 2.5);
        assert!(count("clip gate", &Dynamic::from(-1_i64)).is_err());
        assert!(count("clip gate", &Dynamic::from(1.5_f64)).is_err());
        assert_eq!(integer("folds", &Dynamic::from(-2_i64)).unwrap(), -2);
        assert_eq!(missing_or(&Dynamic::UNIT).unwrap(), None);
        assert_eq!(missing_or(&Dynamic::from(-32768_i64)).unwrap(), Some(-32768.0));
    }

    #[test]
    fn bool_arrays_become_flags() {
        let flags: Array = vec![Dynamic::from(true), Dynamic::from(false)];
        assert!(matches!(gate_array("m", flags).unwrap(), GateArray::Flags(f) if f == vec![true, false]));
        let values: Array = vec![Dynamic::from(1_i64), Dynamic::from(2.5_f64)];
        assert!(matches!(gate_array("v", values).unwrap(), GateArray::Values(v) if v == vec![1.0, 2.5]));
        let mixed: Array = vec![Dynamic::from(true), Dynamic::from(2.5_f64)];
        assert!(gate_array("x", mixed).is_err());
    }
}
