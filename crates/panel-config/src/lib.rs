//! Provisioning configuration for Panel Provisioner
//!
//! Parses a directory of versioned YAML files into validated
//! [`SourceConfig`] entries, one per provisioned root directory.

pub mod error;
pub mod reader;
pub mod schema;
pub mod source;

pub use error::{Error, Result};
pub use reader::{ConfigReader, OrgLookup};
pub use source::{DEFAULT_UPDATE_INTERVAL, SourceConfig};
