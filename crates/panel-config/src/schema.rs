//! Raw YAML schema for provisioning configuration files
//!
//! These types mirror the on-disk document exactly; every field is optional
//! at this stage. Defaults and validation live in [`crate::source`], which
//! turns a raw provider entry into a [`crate::SourceConfig`].

use std::collections::BTreeMap;

use serde::Deserialize;

/// Minimal probe used to decide how to read the rest of the document.
///
/// Version 0 (no `apiVersion` key) is the legacy format, which this reader
/// does not support; such files yield no sources. A document that fails to
/// parse even as a probe is treated as version 0 rather than an error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionProbe {
    #[serde(default)]
    pub api_version: i64,
}

/// A whole `apiVersion >= 1` configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub providers: Vec<RawSource>,
}

/// One entry of the `providers` list, as written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSource {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub org_id: Option<i64>,
    pub folder: Option<String>,
    pub folder_uid: Option<String>,
    pub editable: Option<bool>,
    pub options: Option<RawOptions>,
    pub disable_deletion: Option<bool>,
    pub update_interval_seconds: Option<i64>,
    pub allow_ui_updates: Option<bool>,
}

/// The `options` map of a provider entry.
///
/// Only the keys below are meaningful; anything else is carried along and
/// ignored so that configs with extra keys keep loading.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptions {
    pub path: Option<String>,
    /// Deprecated alias for `path`.
    pub folder: Option<String>,
    pub folders_from_files_structure: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}
