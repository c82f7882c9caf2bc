//! Publication aggregation
//!
//! Folds the classified measurements of every feeder into one mapping of
//! object name -> distinct property names. Each feeder is collected into its
//! own mapping first; merging a feeder replaces any object an earlier feeder
//! already published (the property lists are not unioned).

use errors::{malformed_error, PubsError, PubsResult};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classifier::{classify, Classification, Publication};
use crate::record::MeasurementRecord;

pub const FEEDERS_KEY: &str = "feeders";
pub const MEASUREMENTS_KEY: &str = "measurements";
const FEEDER_NAME_KEY: &str = "name";

/// Object name -> ordered property names, in first-insertion order
///
/// Serializes as the output configuration document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublicationMap {
    objects: IndexMap<String, Vec<String>>,
}

impl PublicationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property to an object; returns false if the object already had it
    pub fn insert(&mut self, publication: Publication) -> bool {
        if publication.object_name.is_empty() {
            return false;
        }

        let properties = self.objects.entry(publication.object_name).or_default();
        if properties.contains(&publication.property_name) {
            return false;
        }
        properties.push(publication.property_name);
        true
    }

    /// Move every object of `other` in, replacing objects already present.
    /// A replaced object keeps its position. Returns the replaced names.
    pub fn merge_replacing(&mut self, other: PublicationMap) -> Vec<String> {
        let mut replaced = Vec::new();
        for (object, properties) in other.objects {
            if self.objects.contains_key(&object) {
                replaced.push(object.clone());
            }
            self.objects.insert(object, properties);
        }
        replaced
    }

    /// Properties published by `object`, in insertion order
    pub fn properties(&self, object: &str) -> Option<Vec<&str>> {
        self.objects
            .get(object)
            .map(|properties| properties.iter().map(String::as_str).collect())
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Pretty-printed output configuration document
    pub fn to_document(&self) -> PubsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PubsError::Serialization(e.to_string()))
    }
}

/// Counts gathered while aggregating, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    pub feeders: usize,
    pub records: usize,
    pub suppressed: usize,
    /// Objects a later feeder replaced
    pub replaced: usize,
}

/// Result of aggregating a dictionary document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub publications: PublicationMap,
    pub summary: AggregationSummary,
}

/// Aggregate all feeders of a dictionary document
pub fn aggregate_document(document: &Value) -> PubsResult<Aggregation> {
    let feeders = document
        .get(FEEDERS_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            malformed_error!(
                "dictionary document must contain a '{}' array",
                FEEDERS_KEY
            )
        })?;

    aggregate_feeders(feeders)
}

/// Aggregate feeders in order; the first invalid record aborts the whole run
pub fn aggregate_feeders(feeders: &[Value]) -> PubsResult<Aggregation> {
    let mut aggregation = Aggregation::default();

    for (index, feeder) in feeders.iter().enumerate() {
        let feeder_name = feeder
            .get(FEEDER_NAME_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", index));

        let measurements = feeder
            .get(MEASUREMENTS_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                malformed_error!(
                    "feeder {} must contain a '{}' array",
                    feeder_name,
                    MEASUREMENTS_KEY
                )
            })?;

        let mut feeder_publications = PublicationMap::new();
        for measurement in measurements {
            let record = MeasurementRecord::from_json(measurement)?;
            aggregation.summary.records += 1;

            match classify(&record)? {
                Classification::Publish(publication) => {
                    feeder_publications.insert(publication);
                },
                Classification::Suppressed => {
                    aggregation.summary.suppressed += 1;
                    debug!(
                        "Suppressed {} measurement on {}",
                        record.measurement_type, record.conducting_equipment_type
                    );
                },
            }
        }

        debug!(
            "Feeder {}: {} measurements, {} objects",
            feeder_name,
            measurements.len(),
            feeder_publications.len()
        );

        let replaced = aggregation.publications.merge_replacing(feeder_publications);
        for object in &replaced {
            warn!("Feeder {} replaced publications of {}", feeder_name, object);
        }
        aggregation.summary.replaced += replaced.len();
        aggregation.summary.feeders += 1;
    }

    Ok(aggregation)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde_json::json;

    fn measurement(equipment: &str, measurement_type: &str, phases: &str, name: &str) -> Value {
        json!({
            "name": format!("{}_{}", equipment, name),
            "measurementType": measurement_type,
            "phases": phases,
            "ConductingEquipment_type": equipment,
            "ConductingEquipment_name": name,
            "ConnectivityNode": format!("node_{}", name)
        })
    }

    fn publication(object: &str, property: &str) -> Publication {
        Publication {
            object_name: object.to_string(),
            property_name: property.to_string(),
        }
    }

    #[test]
    fn test_insert_deduplicates_in_order() {
        let mut map = PublicationMap::new();
        assert!(map.insert(publication("cap_1", "shunt_A")));
        assert!(map.insert(publication("cap_1", "switchA")));
        assert!(!map.insert(publication("cap_1", "shunt_A")));
        assert_eq!(map.properties("cap_1").unwrap(), vec!["shunt_A", "switchA"]);
    }

    #[test]
    fn test_insert_ignores_empty_object_name() {
        let mut map = PublicationMap::new();
        assert!(!map.insert(publication("", "")));
        assert!(map.is_empty());
    }

    #[test]
    fn test_merge_replaces_whole_entry() {
        let mut global = PublicationMap::new();
        global.insert(publication("cap_1", "shunt_A"));
        global.insert(publication("tx_1", "tap_A"));

        let mut feeder = PublicationMap::new();
        feeder.insert(publication("cap_1", "switchA"));

        let replaced = global.merge_replacing(feeder);
        assert_eq!(replaced, vec!["cap_1".to_string()]);
        assert_eq!(global.properties("cap_1").unwrap(), vec!["switchA"]);
        assert_eq!(global.properties("tx_1").unwrap(), vec!["tap_A"]);
        // Replaced keys keep their original position
        assert_eq!(
            global.object_names().collect::<Vec<_>>(),
            vec!["cap_1", "tx_1"]
        );
    }

    #[test]
    fn test_duplicate_properties_within_feeder() {
        let document = json!({
            "feeders": [{
                "name": "ieee13",
                "measurements": [
                    measurement("LinearShuntCompensator", "VA", "A", "1"),
                    measurement("LinearShuntCompensator", "Pos", "A", "1"),
                    measurement("LinearShuntCompensator", "VA", "A", "1")
                ]
            }]
        });

        let aggregation = aggregate_document(&document).unwrap();
        assert_eq!(
            aggregation.publications.properties("cap_1").unwrap(),
            vec!["shunt_A", "switchA"]
        );
        assert_eq!(aggregation.summary.records, 3);
    }

    #[test]
    fn test_later_feeder_wins() {
        let document = json!({
            "feeders": [
                { "measurements": [measurement("LinearShuntCompensator", "VA", "A", "1")] },
                { "measurements": [measurement("LinearShuntCompensator", "Pos", "A", "1")] }
            ]
        });

        let aggregation = aggregate_document(&document).unwrap();
        assert_eq!(
            aggregation.publications.properties("cap_1").unwrap(),
            vec!["switchA"]
        );
        assert_eq!(aggregation.summary.feeders, 2);
        assert_eq!(aggregation.summary.replaced, 1);
    }

    #[test]
    fn test_suppressed_records_never_reach_output() {
        let document = json!({
            "feeders": [{
                "measurements": [
                    measurement("EnergyConsumer", "VA", "A", "load1"),
                    measurement("ACLineSegment", "Pos", "A", "l1"),
                    measurement("ACLineSegment", "PNV", "B", "l1")
                ]
            }]
        });

        let aggregation = aggregate_document(&document).unwrap();
        assert_eq!(aggregation.summary.suppressed, 2);
        assert_eq!(
            serde_json::to_value(&aggregation.publications).unwrap(),
            json!({ "node_l1": ["voltage_B"] })
        );
    }

    #[test]
    fn test_invalid_record_aborts_aggregation() {
        let mut broken = measurement("PowerTransformer", "VA", "A", "t1");
        broken.as_object_mut().unwrap().remove("ConnectivityNode");
        let document = json!({
            "feeders": [
                { "measurements": [measurement("PowerTransformer", "VA", "A", "t0")] },
                { "measurements": [broken] }
            ]
        });

        let err = aggregate_document(&document).unwrap_err();
        assert!(matches!(err, PubsError::MalformedRecord(_)));
    }

    #[test]
    fn test_missing_feeders_array() {
        let err = aggregate_document(&json!({ "models": [] })).unwrap_err();
        assert!(err.is_record_error());

        let err = aggregate_document(&json!({ "feeders": [{ "name": "f1" }] })).unwrap_err();
        assert!(err.to_string().contains("f1"));
    }

    #[test]
    fn test_empty_dictionary() {
        let aggregation = aggregate_document(&json!({ "feeders": [] })).unwrap();
        assert!(aggregation.publications.is_empty());
        assert_eq!(aggregation.publications.to_document().unwrap(), "{}");
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let mut map = PublicationMap::new();
        map.insert(publication("cap_C1", "shunt_ABC"));
        assert_eq!(
            map.to_document().unwrap(),
            "{\n  \"cap_C1\": [\n    \"shunt_ABC\"\n  ]\n}"
        );
    }
}
