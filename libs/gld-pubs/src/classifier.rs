//! Measurement classification
//!
//! Maps one measurement record to the GridLAB-D object and property that
//! publishes it. Equipment families are matched by substring, in table order:
//!
//! | Equipment type contains  | VA                   | Pos            | PNV                     | other      |
//! |--------------------------|----------------------|----------------|-------------------------|------------|
//! | `LinearShuntCompensator` | `cap_` `shunt_`      | `cap_` `switch`| `cap_` `voltage_`       | error      |
//! | `PowerTransformer`       | `tx_` `power_out_`   | `tx_` `tap_`   | error                   | error      |
//! | `ACLineSegment`          | `line_` `power_out_` | suppressed     | connectivity node, `voltage_` | suppressed |
//! | anything else            | suppressed           | suppressed     | suppressed              | suppressed |

use errors::{PubsError, PubsResult};

use crate::record::MeasurementRecord;

/// Equipment families the simulator publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentFamily {
    LinearShuntCompensator,
    PowerTransformer,
    AcLineSegment,
}

impl EquipmentFamily {
    /// Match order matters when a type string contains several markers
    const MATCH_ORDER: [EquipmentFamily; 3] = [
        EquipmentFamily::LinearShuntCompensator,
        EquipmentFamily::PowerTransformer,
        EquipmentFamily::AcLineSegment,
    ];

    /// CIM class name searched for in the equipment type
    pub fn marker(self) -> &'static str {
        match self {
            Self::LinearShuntCompensator => "LinearShuntCompensator",
            Self::PowerTransformer => "PowerTransformer",
            Self::AcLineSegment => "ACLineSegment",
        }
    }

    /// First family whose marker occurs in `equipment_type`
    pub fn detect(equipment_type: &str) -> Option<Self> {
        Self::MATCH_ORDER
            .into_iter()
            .find(|family| equipment_type.contains(family.marker()))
    }

    fn valid_measurement_types(self) -> &'static str {
        match self {
            Self::LinearShuntCompensator => "VA, Pos, PNV",
            Self::PowerTransformer => "VA, Pos",
            Self::AcLineSegment => "VA, PNV",
        }
    }
}

/// CIM measurement codes with a publication rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    /// Apparent power
    Va,
    /// Switch or tap position
    Pos,
    /// Phase-to-neutral voltage
    Pnv,
}

impl MeasurementKind {
    /// Exact, case-sensitive match of a measurement code
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "VA" => Some(Self::Va),
            "Pos" => Some(Self::Pos),
            "PNV" => Some(Self::Pnv),
            _ => None,
        }
    }
}

/// Object/property pair a measurement publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub object_name: String,
    pub property_name: String,
}

/// Outcome of classifying one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Publish(Publication),
    /// No publication for this equipment/measurement combination
    Suppressed,
}

impl Classification {
    fn publish(object_name: String, property_name: String) -> Self {
        Self::Publish(Publication {
            object_name,
            property_name,
        })
    }

    pub fn publication(&self) -> Option<&Publication> {
        match self {
            Self::Publish(publication) => Some(publication),
            Self::Suppressed => None,
        }
    }
}

/// Classify one measurement record
///
/// Shunt compensators and transformers reject unknown measurement codes;
/// line segments and unrecognised equipment suppress them.
pub fn classify(record: &MeasurementRecord) -> PubsResult<Classification> {
    let Some(family) = EquipmentFamily::detect(&record.conducting_equipment_type) else {
        return Ok(Classification::Suppressed);
    };

    let name = &record.conducting_equipment_name;
    let phases = &record.phases;
    let kind = MeasurementKind::parse(&record.measurement_type);

    let classification = match (family, kind) {
        (EquipmentFamily::LinearShuntCompensator, Some(MeasurementKind::Va)) => {
            Classification::publish(format!("cap_{}", name), format!("shunt_{}", phases))
        },
        (EquipmentFamily::LinearShuntCompensator, Some(MeasurementKind::Pos)) => {
            Classification::publish(format!("cap_{}", name), format!("switch{}", phases))
        },
        (EquipmentFamily::LinearShuntCompensator, Some(MeasurementKind::Pnv)) => {
            Classification::publish(format!("cap_{}", name), format!("voltage_{}", phases))
        },
        (EquipmentFamily::PowerTransformer, Some(MeasurementKind::Va)) => {
            Classification::publish(format!("tx_{}", name), format!("power_out_{}", phases))
        },
        (EquipmentFamily::PowerTransformer, Some(MeasurementKind::Pos)) => {
            Classification::publish(format!("tx_{}", name), format!("tap_{}", phases))
        },
        (EquipmentFamily::AcLineSegment, Some(MeasurementKind::Va)) => {
            Classification::publish(format!("line_{}", name), format!("power_out_{}", phases))
        },
        (EquipmentFamily::AcLineSegment, Some(MeasurementKind::Pnv)) => Classification::publish(
            record.connectivity_node.clone(),
            format!("voltage_{}", phases),
        ),
        (EquipmentFamily::AcLineSegment, _) => Classification::Suppressed,
        (EquipmentFamily::LinearShuntCompensator | EquipmentFamily::PowerTransformer, _) => {
            return Err(PubsError::InvalidMeasurementType {
                equipment: family.marker().to_string(),
                measurement_type: record.measurement_type.clone(),
                valid: family.valid_measurement_types().to_string(),
            });
        },
    };

    Ok(classification)
}
