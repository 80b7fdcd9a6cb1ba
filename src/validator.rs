//! Record validation driver
//!
//! Runs one validating parse over an input stream with a
//! [`RecordAccumulator`] listening, and turns a parser abort into an error
//! that names the record being read when it happened.

use std::io::{Read, Write};
use std::path::Path;

use log::{debug, error};

use crate::accumulator::{RecordAccumulator, Tally};
use crate::config::SchemaConfig;
use crate::error::{Result, ValidationError};
use crate::libxml2::{CharEncoding, LibXml2Wrapper, StreamOutcome, XmlSchemaPtr};

/// The MARC 21 slim schema, bundled into the binary
pub const MARC21_SLIM_XSD: &[u8] = include_bytes!("../schemas/MARC21slim.xsd");

/// Validates record streams against one parsed schema.
///
/// The schema is parsed once at construction; each call to
/// [`validate`](RecordValidator::validate) is an independent run with its own
/// accumulator and parser state.
pub struct RecordValidator {
    wrapper: LibXml2Wrapper,
    schema: XmlSchemaPtr,
    encoding: CharEncoding,
}

impl RecordValidator {
    /// Validator for the bundled MARC 21 slim schema
    pub fn with_bundled_schema() -> Result<Self> {
        let validator = Self::from_schema_bytes(MARC21_SLIM_XSD).map_err(|err| match err {
            ValidationError::SchemaParsing { details, .. } => ValidationError::SchemaParsing {
                schema: "MARC21slim.xsd (bundled)".to_string(),
                details,
            },
            other => other,
        })?;
        debug!("Using bundled MARC 21 slim schema");
        Ok(validator)
    }

    pub fn from_schema_bytes(schema_data: &[u8]) -> Result<Self> {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(schema_data)?;
        Ok(Self::new(wrapper, schema))
    }

    pub fn from_schema_path(path: &Path) -> Result<Self> {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper
            .parse_schema_from_path(path)
            .map_err(|err| ValidationError::SchemaParsing {
                schema: path.display().to_string(),
                details: err.to_string(),
            })?;
        debug!("Using schema {}", path.display());
        Ok(Self::new(wrapper, schema))
    }

    /// Validator for the configured schema, or the bundled one when none is set
    pub fn from_config(config: &SchemaConfig) -> Result<Self> {
        match &config.path {
            Some(path) => Self::from_schema_path(path),
            None => Self::with_bundled_schema(),
        }
    }

    fn new(wrapper: LibXml2Wrapper, schema: XmlSchemaPtr) -> Self {
        Self {
            wrapper,
            schema,
            encoding: CharEncoding::Detect,
        }
    }

    /// Encoding handed to the parser for every run
    pub fn with_encoding(mut self, encoding: CharEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Validate every record in `input`, writing the report to `out`.
    ///
    /// Invalid records are reported as they are finalized, so on an abort the
    /// report holds every record completed before it.
    pub fn validate<R: Read, W: Write>(&self, mut input: R, out: W) -> Result<Tally> {
        let mut accumulator = RecordAccumulator::new(out);

        let outcome = self.wrapper.validate_stream(
            &self.schema,
            &mut input,
            self.encoding,
            &mut accumulator,
        )?;

        match outcome {
            StreamOutcome::Completed => Ok(accumulator.finish()?),
            StreamOutcome::Aborted { message } => {
                let record_id = accumulator.record_id().to_string();
                error!(
                    "Parsing stopped near record {:?} after {}",
                    record_id,
                    accumulator.tally()
                );
                Err(ValidationError::Aborted {
                    record_id,
                    details: message,
                })
            }
        }
    }
}
