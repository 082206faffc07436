//! Layered configuration.
//!
//! Settings come from an optional file (any format the `config` crate
//! understands) overlaid by `MEDIN__`-prefixed environment variables, e.g.
//! `MEDIN__MERGE__COMPONENT_LIMIT=64`. Every key has a default.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

/// Collection ids handed to the vocabulary resolver.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VocabularySettings {
    pub resource_types: String,
    pub topic_categories: String,
    pub access_types: String,
    pub data_formats: String,
    pub inspire_themes: String,
}

impl Default for VocabularySettings {
    fn default() -> Self {
        Self {
            resource_types: "resource-types".into(),
            topic_categories: "P051".into(),
            access_types: "access-types".into(),
            data_formats: "M010".into(),
            inspire_themes: "P220".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MergeSettings {
    /// Most contacts a single attribute inference may visit.
    pub component_limit: usize,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self { component_limit: 256 }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverSettings {
    /// SQLite database backing the vocabulary, area and reference system lookups.
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub vocabulary: VocabularySettings,
    pub merge: MergeSettings,
    pub resolvers: ResolverSettings,
}

impl Settings {
    /// Loads settings from `path` (which then must exist) or from an optional
    /// `medin.*` file in the working directory, then applies the environment.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("medin").required(false),
        };
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("MEDIN").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        debug!(?settings, "loaded settings");
        Ok(settings)
    }
}
