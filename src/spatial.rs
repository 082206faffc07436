//! Area and spatial reference system lookups.

use std::collections::HashMap;

use bimap::BiMap;
use serde::Serialize;

use crate::error::Result;
use crate::path::OtherHasher;

pub type AreaId = String;

// citation titles of the area gazetteers we can resolve, and their area class
const AREA_CLASSES: [(&str, &str); 2] = [
    ("Charting Progress 2 Sea Areas", "cp"),
    ("International Hydrographic Bureau, Limits of Oceans and Seas", "sa"),
];

/// The area class for an extent citation title, if the gazetteer is known.
pub fn area_class(title: &str) -> Option<&'static str> {
    AREA_CLASSES.iter().find(|(t, _)| *t == title).map(|(_, class)| *class)
}

pub trait AreaResolver {
    /// Finds the area of `class` whose name contains `name`, preferring the shortest such name.
    fn get_area_id(&self, name: &str, class: &str) -> Result<Option<AreaId>>;
    fn get_area_name(&self, id: &str) -> Result<Option<String>>;
}

/// Areas held in memory, looked up both by (class, name) and by id.
#[derive(Debug, Default, Clone)]
pub struct AreaIndex {
    areas: BiMap<(String, String), AreaId>,
}

impl AreaIndex {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, id: &str, name: &str, class: &str) {
        self.areas.insert((class.to_string(), name.to_string()), id.to_string());
    }
    pub fn with(mut self, id: &str, name: &str, class: &str) -> Self {
        self.insert(id, name, class);
        self
    }
    pub fn len(&self) -> usize {
        self.areas.len()
    }
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl AreaResolver for AreaIndex {
    fn get_area_id(&self, name: &str, class: &str) -> Result<Option<AreaId>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .areas
            .iter()
            .filter(|((c, n), _)| c == class && n.to_lowercase().contains(&wanted))
            .min_by(|((_, a), _), ((_, b), _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(|(_, id)| id.clone()))
    }
    fn get_area_name(&self, id: &str) -> Result<Option<String>> {
        Ok(self.areas.get_by_right(id).map(|(_, name)| name.clone()))
    }
}

/// What is known about a spatial reference system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpatialReference {
    pub identifier: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub scope: Option<String>,
}

impl SpatialReference {
    /// A record carrying nothing but the code it was looked up by.
    pub fn identified(identifier: &str) -> Self {
        Self { identifier: identifier.to_string(), name: None, kind: None, scope: None }
    }
}

pub trait SpatialReferenceResolver {
    fn resolve(&self, code: &str) -> Result<Option<SpatialReference>>;
}

#[derive(Debug, Default, Clone)]
pub struct StaticReferenceSystems {
    systems: HashMap<String, SpatialReference, OtherHasher>,
}

impl StaticReferenceSystems {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, system: SpatialReference) {
        self.systems.insert(system.identifier.clone(), system);
    }
    pub fn with(mut self, system: SpatialReference) -> Self {
        self.insert(system);
        self
    }
}

impl SpatialReferenceResolver for StaticReferenceSystems {
    fn resolve(&self, code: &str) -> Result<Option<SpatialReference>> {
        Ok(self.systems.get(code.trim()).cloned())
    }
}
