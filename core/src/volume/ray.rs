use crate::prelude::{ensure_gates, EditError, EditResult};
use crate::volume::pose::{RangeGeometry, SensorPose};
use serde::{Deserialize, Serialize};

/// Gate payload of a field: measurements, or one bad flag per gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldData {
    Values(Vec<f32>),
    Flags(Vec<bool>),
}

impl FieldData {
    pub fn len(&self) -> usize {
        match self {
            FieldData::Values(values) => values.len(),
            FieldData::Flags(flags) => flags.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub units: String,
    pub missing: f32,
    pub data: FieldData,
}

impl Field {
    pub fn values(name: &str, units: &str, missing: f32, values: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            missing,
            data: FieldData::Values(values),
        }
    }

    pub fn flags(name: &str, flags: Vec<bool>) -> Self {
        Self {
            name: name.to_string(),
            units: String::new(),
            missing: crate::prelude::MISSING_FL32,
            data: FieldData::Flags(flags),
        }
    }

    pub fn n_gates(&self) -> usize {
        self.data.len()
    }

    pub fn as_values(&self) -> EditResult<&[f32]> {
        match &self.data {
            FieldData::Values(values) => Ok(values),
            FieldData::Flags(_) => Err(EditError::InvalidParameter(format!(
                "field {} holds bad flags, not values",
                self.name
            ))),
        }
    }

    pub fn as_flags(&self) -> EditResult<&[bool]> {
        match &self.data {
            FieldData::Flags(flags) => Ok(flags),
            FieldData::Values(_) => Err(EditError::InvalidParameter(format!(
                "field {} holds values, not bad flags",
                self.name
            ))),
        }
    }
}

/// One beam's worth of gates plus its pointing and range geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ray {
    pub index: usize,
    pub sweep_index: usize,
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub nyquist_mps: Option<f32>,
    pub range: RangeGeometry,
    pub n_gates: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub georeference: Option<SensorPose>,
    pub fields: Vec<Field>,
}

impl Ray {
    pub fn new(index: usize, sweep_index: usize, n_gates: usize, range: RangeGeometry) -> Self {
        Self {
            index,
            sweep_index,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            nyquist_mps: None,
            range,
            n_gates,
            georeference: None,
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> EditResult<&Field> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| EditError::FieldNotFound(format!("{} on ray {}", name, self.index)))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    /// Adds `field`, replacing any field of the same name.
    pub fn put_field(&mut self, field: Field) -> EditResult<()> {
        ensure_gates(&field.name, self.n_gates, field.n_gates())?;
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_field_replaces_same_name_and_rejects_wrong_length() {
        let mut ray = Ray::new(0, 0, 3, RangeGeometry::default());
        ray.put_field(Field::values("VEL", "m/s", -9999.0, vec![1.0, 2.0, 3.0]))
            .unwrap();
        ray.put_field(Field::values("VEL", "m/s", -9999.0, vec![4.0, 5.0, 6.0]))
            .unwrap();
        assert_eq!(ray.fields.len(), 1);
        assert_eq!(ray.field("VEL").unwrap().as_values().unwrap()[0], 4.0);

        let err = ray
            .put_field(Field::values("DBZ", "dBZ", -9999.0, vec![1.0]))
            .unwrap_err();
        assert_eq!(err, EditError::mismatch("DBZ", 3, 1));
    }

    #[test]
    fn payload_accessors_reject_the_other_kind() {
        let flags = Field::flags("BAD_FLAGS", vec![true, false]);
        assert!(flags.as_values().is_err());
        assert_eq!(flags.as_flags().unwrap(), &[true, false]);
        assert!(matches!(
            Ray::new(7, 0, 2, RangeGeometry::default()).field("VEL"),
            Err(EditError::FieldNotFound(_))
        ));
    }
}
