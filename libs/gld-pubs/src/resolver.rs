//! Dictionary source resolution
//!
//! A caller-supplied dictionary file wins when it exists; otherwise the
//! dictionary is generated for the model from the configured triple store.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use common::{
    property_or_default, ConfigurationSource, BLAZEGRAPH_HOST_PATH, DEFAULT_BLAZEGRAPH_ENDPOINT,
};
use errors::{malformed_error, PubsError, PubsResult};
use serde_json::Value;
use tracing::{info, warn};

use crate::generator::{DictionaryGenerator, FeederQuery};
use crate::handler::MODEL_ID;

/// Where a dictionary document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionaryOrigin {
    File(PathBuf),
    Generated { endpoint: String, model_id: String },
}

impl fmt::Display for DictionaryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Generated { endpoint, model_id } => {
                write!(f, "model {} via {}", model_id, endpoint)
            },
        }
    }
}

/// A readable, not yet parsed, dictionary document
pub struct Dictionary {
    origin: DictionaryOrigin,
    reader: Box<dyn Read>,
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl Dictionary {
    pub fn new(origin: DictionaryOrigin, reader: Box<dyn Read>) -> Self {
        Self { origin, reader }
    }

    pub fn origin(&self) -> &DictionaryOrigin {
        &self.origin
    }

    /// Parse the document. Read failures are acquisition errors, bad JSON is
    /// a malformed dictionary.
    pub fn parse(self) -> PubsResult<Value> {
        let origin = self.origin;
        serde_json::from_reader(self.reader).map_err(|e| {
            if e.is_io() {
                PubsError::acquisition(origin.to_string(), e)
            } else {
                malformed_error!("dictionary from {} is not valid JSON: {}", origin, e)
            }
        })
    }
}

/// Chooses between a supplied dictionary file and generation
pub struct DictionaryResolver<'a> {
    config: &'a dyn ConfigurationSource,
    generator: &'a dyn DictionaryGenerator,
}

impl<'a> DictionaryResolver<'a> {
    pub fn new(config: &'a dyn ConfigurationSource, generator: &'a dyn DictionaryGenerator) -> Self {
        Self { config, generator }
    }

    /// Resolve the dictionary for `model_id`
    ///
    /// The model id is checked before any file or network access.
    pub fn resolve(
        &self,
        model_id: Option<&str>,
        dictionary_file: Option<&Path>,
    ) -> PubsResult<Dictionary> {
        let model_id = model_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PubsError::missing_parameter(MODEL_ID))?;

        if let Some(path) = dictionary_file {
            if path.exists() {
                return open_file(path);
            }
            warn!(
                "Dictionary file {} does not exist, generating dictionary instead",
                path.display()
            );
        }

        self.generate(model_id)
    }

    fn generate(&self, model_id: &str) -> PubsResult<Dictionary> {
        let endpoint =
            property_or_default(self.config, BLAZEGRAPH_HOST_PATH, DEFAULT_BLAZEGRAPH_ENDPOINT);

        let mut query = FeederQuery::new(endpoint.clone());
        query.add_feeder_selection(model_id);

        let mut output = Vec::new();
        self.generator.generate_dictionary(&query, &mut output)?;
        info!("Generated dictionary for {} ({} bytes)", model_id, output.len());

        Ok(Dictionary::new(
            DictionaryOrigin::Generated {
                endpoint,
                model_id: model_id.to_string(),
            },
            Box::new(Cursor::new(output)),
        ))
    }
}

fn open_file(path: &Path) -> PubsResult<Dictionary> {
    let file = File::open(path).map_err(|e| PubsError::acquisition(path.display().to_string(), e))?;
    info!("Using dictionary file {}", path.display());
    Ok(Dictionary::new(
        DictionaryOrigin::File(path.to_path_buf()),
        Box::new(BufReader::new(file)),
    ))
}
