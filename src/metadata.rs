//! The assembled metadata of one document.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{MedinError, Result};
use crate::extract::{
    AccessLimit, BoundingBox, Conformity, DateElement, DateMode, Extent, Extractor, Keywords, OnlineResource,
    Resolution, Resolvers, TemporalReference, VerticalExtent,
};
use crate::merge::Contacts;
use crate::settings::Settings;
use crate::spatial::SpatialReference;
use crate::vocab::VocabTerm;

/// The MEDIN elements of a resource, identified by an externally supplied uid.
///
/// Every element may be absent. A malformed metadata date is kept as
/// [`DateElement::Invalid`] instead of failing the whole document.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub uid: String,
    pub title: Option<String>,
    pub alt_titles: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub resource_type: Option<VocabTerm>,
    pub online_resource: Vec<OnlineResource>,
    pub unique_id: Option<String>,
    pub coupled_resource: Vec<String>,
    pub resource_language: Option<String>,
    pub topic_category: BTreeMap<String, VocabTerm>,
    pub service_type: Vec<String>,
    pub keywords: Keywords,
    pub bbox: Vec<BoundingBox>,
    pub extents: Vec<Extent>,
    pub vertical_extent: Option<VerticalExtent>,
    pub reference_system: Option<SpatialReference>,
    pub temporal_reference: Option<TemporalReference>,
    pub lineage: Option<String>,
    pub spatial_resolution: Vec<Resolution>,
    pub additional_info: Option<String>,
    pub access_limits: Vec<AccessLimit>,
    pub access_conditions: Vec<String>,
    pub responsible_party: Contacts,
    pub data_format: BTreeMap<String, VocabTerm>,
    pub update_frequency: Option<String>,
    pub inspire_conformity: Vec<Conformity>,
    pub date: Option<DateElement>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub language: Option<String>,
    pub parent_id: Option<String>,
    pub author: Option<String>,
}

impl Metadata {
    /// Parses a document and assembles its metadata. Only a document that
    /// cannot be parsed at all is an error.
    pub fn parse(uid: &str, bytes: &[u8], resolvers: Resolvers<'_>, settings: &Settings) -> Result<Metadata> {
        let document = Document::parse(bytes)?;
        Ok(Self::from_document(uid, &document, resolvers, settings))
    }

    pub fn from_document(uid: &str, document: &Document, resolvers: Resolvers<'_>, settings: &Settings) -> Metadata {
        let extractor = Extractor::new(document, resolvers, settings);
        let date = match extractor.date(DateMode::Capture) {
            Ok(date) => date,
            Err(MedinError::Metadata(error)) => Some(DateElement::Invalid(error)),
            Err(e) => {
                warn!(uid, error = %e, "metadata date dropped");
                None
            }
        };
        let metadata = Metadata {
            uid: uid.to_string(),
            title: extractor.title(),
            alt_titles: extractor.alt_titles(),
            abstract_text: extractor.abstract_text(),
            resource_type: extractor.resource_type(),
            online_resource: extractor.online_resources(),
            unique_id: extractor.unique_id(),
            coupled_resource: extractor.coupled_resources(),
            resource_language: extractor.resource_language(),
            topic_category: extractor.topic_categories(),
            service_type: extractor.service_types(),
            keywords: extractor.keywords(),
            bbox: extractor.bounding_boxes(),
            extents: extractor.extents(),
            vertical_extent: extractor.vertical_extent(),
            reference_system: extractor.reference_system(),
            temporal_reference: extractor.temporal_reference(),
            lineage: extractor.lineage(),
            spatial_resolution: extractor.spatial_resolution(),
            additional_info: extractor.additional_info(),
            access_limits: extractor.access_limits(),
            access_conditions: extractor.access_conditions(),
            responsible_party: extractor.responsible_party(),
            data_format: extractor.data_formats(),
            update_frequency: extractor.update_frequency(),
            inspire_conformity: extractor.inspire_conformity(),
            date,
            name: extractor.standard_name(),
            version: extractor.standard_version(),
            language: extractor.language(),
            parent_id: extractor.parent_id(),
            author: extractor.author(),
        };
        info!(uid, title = ?metadata.title, parties = metadata.responsible_party.len(), "assembled metadata");
        metadata
    }
}
