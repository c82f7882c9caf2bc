//! Configuration handler for GridLAB-D simulation output
//!
//! Runs one request end to end: resolve the dictionary, aggregate its
//! publications, write the document. Every collaborator is passed in at
//! construction, and every failure is logged with the request's process id
//! and username before it is returned. Nothing is written to the output
//! unless the whole request succeeds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use common::{ConfigurationSource, LogSink};
use errors::{config_error, PubsError, PubsResult};

use crate::aggregator::aggregate_document;
use crate::generator::DictionaryGenerator;
use crate::resolver::DictionaryResolver;

pub const TYPENAME: &str = "GridLAB-D Simulation Output";
pub const MODEL_ID: &str = "model_id";
pub const DICTIONARY_FILE: &str = "dictionary_file";

/// Named string parameters of a configuration request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Something that turns request parameters into a configuration document
pub trait ConfigurationHandler: Send + Sync {
    fn generate_config(
        &self,
        parameters: &Parameters,
        out: &mut dyn Write,
        process_id: &str,
        username: &str,
    ) -> PubsResult<()>;
}

/// Builds the GridLAB-D publication configuration from a measurement dictionary
pub struct SimulationOutputHandler {
    config: Arc<dyn ConfigurationSource>,
    generator: Arc<dyn DictionaryGenerator>,
    log: Arc<dyn LogSink>,
}

impl SimulationOutputHandler {
    pub fn new(
        config: Arc<dyn ConfigurationSource>,
        generator: Arc<dyn DictionaryGenerator>,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            config,
            generator,
            log,
        }
    }

    /// Register under [`TYPENAME`]
    pub fn register(self: Arc<Self>, registry: &mut HandlerRegistry) {
        registry.register(TYPENAME, self);
    }

    /// Log `err` at its category's level and hand it back
    fn fail(&self, err: PubsError, process_id: &str, username: &str) -> PubsError {
        self.log.log(
            err.log_level(),
            &format!("Error while generating simulation output: {}", err),
            process_id,
            username,
        );
        err
    }

    fn build_document(
        &self,
        parameters: &Parameters,
        process_id: &str,
        username: &str,
    ) -> PubsResult<String> {
        let resolver = DictionaryResolver::new(self.config.as_ref(), self.generator.as_ref());
        let dictionary = resolver.resolve(
            parameters.get(MODEL_ID),
            parameters.get(DICTIONARY_FILE).map(Path::new),
        )?;

        self.log.running(
            &format!("Reading measurement dictionary from {}", dictionary.origin()),
            process_id,
            username,
        );

        let document = dictionary.parse()?;
        let aggregation = aggregate_document(&document)?;
        let summary = aggregation.summary;
        self.log.running(
            &format!(
                "Processed {} feeders, {} measurements ({} suppressed), {} objects",
                summary.feeders,
                summary.records,
                summary.suppressed,
                aggregation.publications.len()
            ),
            process_id,
            username,
        );

        aggregation.publications.to_document()
    }
}

impl ConfigurationHandler for SimulationOutputHandler {
    fn generate_config(
        &self,
        parameters: &Parameters,
        out: &mut dyn Write,
        process_id: &str,
        username: &str,
    ) -> PubsResult<()> {
        self.log.running(
            &format!(
                "Generating simulation output configuration file using parameters: {}",
                parameters
            ),
            process_id,
            username,
        );

        let document = self
            .build_document(parameters, process_id, username)
            .map_err(|e| self.fail(e, process_id, username))?;

        out.write_all(document.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| self.fail(e.into(), process_id, username))?;

        self.log.running(
            "Finished generating simulation output configuration file.",
            process_id,
            username,
        );
        Ok(())
    }
}

/// Configuration handlers by type name
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ConfigurationHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning the one it replaced
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        handler: Arc<dyn ConfigurationHandler>,
    ) -> Option<Arc<dyn ConfigurationHandler>> {
        self.handlers.insert(type_name.into(), handler)
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ConfigurationHandler>> {
        self.handlers.get(type_name).cloned()
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatch a request to the handler registered for `type_name`
    pub fn generate_config(
        &self,
        type_name: &str,
        parameters: &Parameters,
        out: &mut dyn Write,
        process_id: &str,
        username: &str,
    ) -> PubsResult<()> {
        let handler = self
            .get(type_name)
            .ok_or_else(|| config_error!("No configuration handler registered for {}", type_name))?;
        handler.generate_config(parameters, out, process_id, username)
    }
}
