//! Measurement records as they appear in the dictionary document

use errors::{malformed_error, PubsResult};
use serde_json::{Map, Value};

pub const MEASUREMENT_TYPE_KEY: &str = "measurementType";
pub const PHASES_KEY: &str = "phases";
pub const CONDUCTING_EQUIPMENT_TYPE_KEY: &str = "ConductingEquipment_type";
pub const CONDUCTING_EQUIPMENT_NAME_KEY: &str = "ConductingEquipment_name";
pub const CONNECTIVITY_NODE_KEY: &str = "ConnectivityNode";

/// Key the equipment type is classified from.
///
/// Dictionaries written by the CIM importer prefix the measurement `name`
/// with the equipment class (`LinearShuntCompensator_cap1_...`), and that is
/// the value matched by the classifier, not `ConductingEquipment_type`.
pub const EQUIPMENT_TYPE_KEY: &str = "name";

/// Keys every measurement object must carry
pub const REQUIRED_KEYS: [&str; 5] = [
    MEASUREMENT_TYPE_KEY,
    PHASES_KEY,
    CONDUCTING_EQUIPMENT_TYPE_KEY,
    CONDUCTING_EQUIPMENT_NAME_KEY,
    CONNECTIVITY_NODE_KEY,
];

/// One measurement of a feeder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRecord {
    /// CIM measurement code: `VA`, `Pos`, `PNV`, ...
    pub measurement_type: String,
    /// Phase letters, e.g. `A` or `ABC`
    pub phases: String,
    pub conducting_equipment_type: String,
    pub conducting_equipment_name: String,
    pub connectivity_node: String,
}

impl MeasurementRecord {
    /// Read a record from a measurement object of the dictionary
    pub fn from_json(value: &Value) -> PubsResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| malformed_error!("measurement must be a JSON object, got {}", value))?;

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(malformed_error!(
                "measurement is missing required keys [{}]; every measurement must have {}",
                missing.join(", "),
                REQUIRED_KEYS.join(", ")
            ));
        }

        Ok(Self {
            measurement_type: string_field(object, MEASUREMENT_TYPE_KEY)?,
            phases: string_field(object, PHASES_KEY)?,
            conducting_equipment_type: string_field(object, EQUIPMENT_TYPE_KEY)?,
            conducting_equipment_name: string_field(object, CONDUCTING_EQUIPMENT_NAME_KEY)?,
            connectivity_node: string_field(object, CONNECTIVITY_NODE_KEY)?,
        })
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> PubsResult<String> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(malformed_error!(
            "measurement key '{}' must be a string, got {}",
            key,
            other
        )),
        None => Err(malformed_error!("measurement is missing key '{}'", key)),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use errors::PubsError;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "name": "LinearShuntCompensator_cap1_A",
            "mRID": "_0B3A1B4A-0E3B-4E8B-9E9D-2D1A5A3B6C7D",
            "measurementType": "VA",
            "phases": "A",
            "ConductingEquipment_type": "LinearShuntCompensator",
            "ConductingEquipment_name": "cap1",
            "ConnectivityNode": "n611"
        })
    }

    #[test]
    fn test_from_json_reads_fields() {
        let record = MeasurementRecord::from_json(&sample()).unwrap();
        assert_eq!(record.measurement_type, "VA");
        assert_eq!(record.phases, "A");
        assert_eq!(
            record.conducting_equipment_type,
            "LinearShuntCompensator_cap1_A"
        );
        assert_eq!(record.conducting_equipment_name, "cap1");
        assert_eq!(record.connectivity_node, "n611");
    }

    #[test]
    fn test_equipment_type_comes_from_name_key() {
        let mut value = sample();
        value["ConductingEquipment_type"] = json!("PowerTransformer");
        let record = MeasurementRecord::from_json(&value).unwrap();
        assert!(record
            .conducting_equipment_type
            .starts_with("LinearShuntCompensator"));
    }

    #[test]
    fn test_missing_required_key() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("phases");
        let err = MeasurementRecord::from_json(&value).unwrap_err();
        assert!(matches!(err, PubsError::MalformedRecord(_)));
        assert!(err.to_string().contains("phases"));
    }

    #[test]
    fn test_missing_name_key() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("name");
        let err = MeasurementRecord::from_json(&value).unwrap_err();
        assert!(matches!(err, PubsError::MalformedRecord(_)));
    }

    #[test]
    fn test_non_string_value() {
        let mut value = sample();
        value["phases"] = json!(3);
        assert!(MeasurementRecord::from_json(&value)
            .unwrap_err()
            .is_record_error());
    }

    #[test]
    fn test_non_object_measurement() {
        assert!(MeasurementRecord::from_json(&json!(["VA"])).is_err());
    }
}
