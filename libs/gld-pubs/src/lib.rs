//! GridLAB-D publication configuration from CIM measurement dictionaries
//!
//! Turns the measurement dictionary of one or more feeders into the
//! simulator's publication configuration: which properties each simulated
//! object has to report.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Resolver   │────▶│  Classifier  │────▶│  Aggregator  │
//! │ (file / gen) │     │ (per record) │     │ (per feeder) │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        │                                         │
//!        ▼                                         ▼
//! ┌──────────────┐                         ┌──────────────┐
//! │  Generator   │                         │   Handler    │
//! │  (importer)  │                         │  (document)  │
//! └──────────────┘                         └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use gld_pubs::aggregate_document;
//! use serde_json::json;
//!
//! let dictionary = json!({
//!     "feeders": [{
//!         "measurements": [{
//!             "name": "LinearShuntCompensator_C1",
//!             "measurementType": "VA",
//!             "phases": "ABC",
//!             "ConductingEquipment_type": "LinearShuntCompensator",
//!             "ConductingEquipment_name": "C1",
//!             "ConnectivityNode": "N1"
//!         }]
//!     }]
//! });
//!
//! let aggregation = aggregate_document(&dictionary).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&aggregation.publications).unwrap(),
//!     json!({ "cap_C1": ["shunt_ABC"] })
//! );
//! ```

pub mod aggregator;
pub mod classifier;
pub mod generator;
pub mod handler;
pub mod record;
pub mod resolver;

// Re-export public API
pub use aggregator::{
    aggregate_document, aggregate_feeders, Aggregation, AggregationSummary, PublicationMap,
};
pub use classifier::{classify, Classification, EquipmentFamily, MeasurementKind, Publication};
pub use errors::{PubsError, PubsResult};
pub use generator::{DictionaryGenerator, FeederQuery, HttpDictionaryGenerator};
pub use handler::{
    ConfigurationHandler, HandlerRegistry, Parameters, SimulationOutputHandler, DICTIONARY_FILE,
    MODEL_ID, TYPENAME,
};
pub use record::MeasurementRecord;
pub use resolver::{Dictionary, DictionaryOrigin, DictionaryResolver};
