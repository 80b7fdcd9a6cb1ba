//! # marc-validate Library
//!
//! Streaming validation of MARCXML record collections against the MARC 21
//! slim schema. Each record is classified as good or bad, and every bad
//! record is reported with the location of each complaint inside it.
//!
//! ```no_run
//! use marc_validate::RecordValidator;
//!
//! let validator = RecordValidator::with_bundled_schema()?;
//! let input = std::fs::File::open("records.xml")?;
//! let tally = validator.validate(input, std::io::stdout().lock())?;
//! println!("{} records checked", tally.total());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod libxml2;
pub mod validator;

pub use accumulator::{Label, RecordAccumulator, Tally};
pub use cli::{Cli, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use error::{LibXml2Error, ValidationError};
pub use events::{Attribute, Attributes, RecordEvents, Severity};
pub use input::{InputOptions, InputSource, ReplaceMalformed, open_input};
pub use libxml2::{CharEncoding, LibXml2Wrapper, StreamOutcome, XmlSchemaPtr};
pub use validator::{MARC21_SLIM_XSD, RecordValidator};
