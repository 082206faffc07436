//! The element extractor.
//!
//! One method per MEDIN metadata element. Every method is independent of the
//! others and reads the document through explicit scopes, so they can be
//! called in any order and any number of times. A missing element is never an
//! error: it comes back as `None` or an empty collection. The only element
//! that can fail is the metadata date, see [`DateMode`].

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::contact::Contact;
use crate::document::Document;
use crate::error::{MedinError, MetadataError, Result};
use crate::merge::Contacts;
use crate::party;
use crate::path::Scope;
use crate::settings::Settings;
use crate::spatial::{area_class, AreaId, AreaResolver, SpatialReference, SpatialReferenceResolver};
use crate::temporal::{parse_date, parse_datetime, parse_lenient, MetadataDate, TemporalValue};
use crate::vocab::{resolve_term, VocabTerm, VocabularyResolver};

lazy_static! {
    static ref KEYWORD_LIST: Regex = Regex::new(r"\s*([A-Z]\d+)\s*").unwrap();
}

const LANGUAGES: [(&str, &str); 5] = [
    ("eng", "English"),
    ("cym", "Welsh/Cymru"),
    ("gle", "Irish (Gaelic)"),
    ("gla", "Scottish (Gaelic)"),
    ("cor", "Cornish"),
];

const UPDATE_FREQUENCIES: [(&str, &str); 12] = [
    ("continual", "Data is repeatedly and frequently updated"),
    ("daily", "Data is updated each day"),
    ("weekly", "Data is updated on a weekly basis"),
    ("fortnightly", "Data is updated every two weeks"),
    ("monthly", "Data is updated each month"),
    ("quarterly", "Data is updated every three months"),
    ("biannually", "Data is updated twice each year"),
    ("annually", "Data is updated every year"),
    ("asNeeded", "Data is updated as deemed necessary"),
    ("irregular", "Data is updated at intervals that are uneven in duration"),
    ("notPlanned", "There are no plans to update the data"),
    ("unknown", "Frequency of maintenance for the data is not known"),
];

// ------------- Element values -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnlineResource {
    pub link: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// West, south, east and north ordinates in decimal degrees.
///
/// West may exceed east for boxes crossing the anti-meridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn ordinates(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
    pub fn is_well_ordered(&self) -> bool {
        self.south <= self.north
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub title: String,
    pub name: String,
    pub id: Option<AreaId>,
}

/// A part of the vertical extent: plain text, or a (code space, identifier)
/// or (abbreviation, direction) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VerticalPart {
    Text(String),
    Pair(String, String),
}

pub type VerticalExtent = BTreeMap<String, VerticalPart>;

/// Words of each keyword list, keyed by list title. A word carries a term
/// only when the list could be tied to a vocabulary.
pub type Keywords = BTreeMap<String, BTreeMap<String, Option<VocabTerm>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemporalReference {
    pub range: Option<(TemporalValue, TemporalValue)>,
    pub single: Vec<(String, TemporalValue)>,
}

impl TemporalReference {
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.single.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub distance: Option<String>,
    pub scale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLimit {
    Term(VocabTerm),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conformity {
    pub specification: Option<String>,
    pub explanation: Option<String>,
    pub pass: Option<bool>,
}

/// What to do with a metadata date that is present but malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMode {
    /// Fail with [`MedinError::Metadata`].
    Raise,
    /// Keep the error as the element's value.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DateElement {
    Valid(MetadataDate),
    Invalid(MetadataError),
}

/// The external lookups the extractor consults.
#[derive(Clone, Copy)]
pub struct Resolvers<'r> {
    pub vocabulary: &'r dyn VocabularyResolver,
    pub areas: &'r dyn AreaResolver,
    pub reference_systems: &'r dyn SpatialReferenceResolver,
}

// ------------- Extractor -------------
pub struct Extractor<'d, 'r> {
    root: Scope<'d>,
    resolvers: Resolvers<'r>,
    settings: &'r Settings,
}

// the code list value of a code element, falling back on its text
fn code_value(scope: Scope<'_>, path: &str) -> Option<String> {
    scope.value(&format!("{}/@codeListValue", path)).or_else(|| scope.value(path))
}

impl<'d, 'r> Extractor<'d, 'r> {
    pub fn new(document: &'d Document, resolvers: Resolvers<'r>, settings: &'r Settings) -> Self {
        Self { root: document.root(), resolvers, settings }
    }

    fn term(&self, collection: &str, code: &str) -> VocabTerm {
        resolve_term(self.resolvers.vocabulary, collection, code)
    }

    /// The organisation of the first originator.
    pub fn author(&self) -> Option<String> {
        self.root.value(
            "//gmd:CI_ResponsibleParty/gmd:role/gmd:CI_RoleCode[@codeListValue='originator']/../../gmd:organisationName",
        )
    }

    /// Element 1: resource title.
    pub fn title(&self) -> Option<String> {
        self.root.value("//gmd:identificationInfo/*/gmd:citation/gmd:CI_Citation/gmd:title")
    }

    /// Element 2: alternative resource titles.
    pub fn alt_titles(&self) -> Vec<String> {
        self.root.values("//gmd:alternateTitle/gco:CharacterString")
    }

    /// Element 3: resource abstract.
    pub fn abstract_text(&self) -> Option<String> {
        self.root.value("//gmd:identificationInfo/*/gmd:abstract")
    }

    /// Element 4: resource type.
    pub fn resource_type(&self) -> Option<VocabTerm> {
        let code = self
            .root
            .value("//gmd:hierarchyLevel/gmd:MD_ScopeCode")
            .or_else(|| self.root.value("//gmd:hierarchyLevel/gmd:MD_ScopeCode/@codeListValue"))?;
        Some(self.term(&self.settings.vocabulary.resource_types, &code))
    }

    /// Element 5: resource locators. Resources without a link are skipped.
    pub fn online_resources(&self) -> Vec<OnlineResource> {
        self.root
            .elements("//gmd:CI_OnlineResource")
            .into_iter()
            .filter_map(|resource| {
                Some(OnlineResource {
                    link: resource.value("./gmd:linkage/gmd:URL")?,
                    name: resource.value("./gmd:name"),
                    description: resource.value("./gmd:description"),
                })
            })
            .collect()
    }

    /// Element 6: unique resource identifier.
    pub fn unique_id(&self) -> Option<String> {
        ["MD_Identifier", "RS_Identifier"].iter().find_map(|tag| {
            self.root.value(&format!(
                "//gmd:identificationInfo//gmd:identifier/gmd:{}/gmd:code/gco:CharacterString",
                tag
            ))
        })
    }

    /// Element 7: coupled resources of a service.
    pub fn coupled_resources(&self) -> Vec<String> {
        let mut resources = self.root.values("//srv:operatesOn/@xlink:href");
        for identifier in self.root.values("//srv:coupledResource/srv:SV_CoupledResource/srv:identifier") {
            if !resources.contains(&identifier) {
                resources.push(identifier);
            }
        }
        resources
    }

    /// Element 8: resource language.
    pub fn resource_language(&self) -> Option<String> {
        let language = "//gmd:identificationInfo/*/gmd:language/gmd:LanguageCode";
        let code = self.root.value(&format!("{}/@codeListValue", language))?;
        match LANGUAGES.iter().find(|(c, _)| *c == code) {
            Some((_, name)) => Some(name.to_string()),
            None => self.root.value(language).or(Some(code)),
        }
    }

    /// Element 9: topic categories, keyed by code.
    pub fn topic_categories(&self) -> BTreeMap<String, VocabTerm> {
        self.root
            .values("//gmd:MD_TopicCategoryCode")
            .into_iter()
            .map(|code| {
                let term = self.term(&self.settings.vocabulary.topic_categories, &code);
                (code, term)
            })
            .collect()
    }

    /// Element 10: spatial data service types.
    pub fn service_types(&self) -> Vec<String> {
        self.root.values("//srv:SV_ServiceIdentification/srv:serviceType/gco:LocalName")
    }

    // the vocabulary a keyword list title refers to, e.g. "SeaDataNet Parameter Discovery Vocabulary (P021)"
    fn keyword_list(&self, title: &str) -> Option<String> {
        if title.to_lowercase().contains("inspire") {
            return Some(self.settings.vocabulary.inspire_themes.clone());
        }
        KEYWORD_LIST.captures(title).map(|c| c[1].to_string())
    }

    /// Element 11: keywords, grouped by the title of their list.
    pub fn keywords(&self) -> Keywords {
        let mut keywords = Keywords::new();
        for list in self.root.elements("//gmd:descriptiveKeywords/gmd:MD_Keywords") {
            let words = list.values("./gmd:keyword/*");
            if words.is_empty() {
                continue;
            }
            let (title, code) = match list.value(".//gmd:MD_KeywordTypeCode/@codeListValue") {
                Some(code) => (code.clone(), Some(code)),
                None => match list.value(".//gmd:title/gco:CharacterString") {
                    Some(title) => {
                        let code = self.keyword_list(&title);
                        (title, code)
                    }
                    None => ("unknown".to_string(), Some("unknown".to_string())),
                },
            };
            let entry = keywords.entry(title).or_default();
            for word in words {
                let term = code.as_deref().map(|collection| self.term(collection, &word));
                entry.insert(word, term);
            }
        }
        keywords
    }

    /// Element 12: geographic bounding boxes. A box missing any ordinate is left out.
    pub fn bounding_boxes(&self) -> Vec<BoundingBox> {
        let ordinate = |bbox: Scope<'d>, name: &str| -> Option<f64> {
            let text = bbox.value(&format!("./gmd:{}/gco:Decimal", name))?;
            match text.parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(ordinate = name, text = %text, "bounding box ordinate is not a number");
                    None
                }
            }
        };
        self.root
            .elements("//gmd:EX_Extent/gmd:geographicElement/gmd:EX_GeographicBoundingBox")
            .into_iter()
            .filter_map(|bbox| {
                Some(BoundingBox {
                    west: ordinate(bbox, "westBoundLongitude")?,
                    south: ordinate(bbox, "southBoundLatitude")?,
                    east: ordinate(bbox, "eastBoundLongitude")?,
                    north: ordinate(bbox, "northBoundLatitude")?,
                })
            })
            .collect()
    }

    /// Element 13: named extents, resolved to areas for the known gazetteers.
    pub fn extents(&self) -> Vec<Extent> {
        let mut extents = Vec::new();
        for identifier in self.root.elements("//gmd:geographicIdentifier/gmd:MD_Identifier") {
            let Some(title) = identifier.value("./gmd:authority/gmd:CI_Citation/gmd:title/gco:CharacterString") else {
                continue;
            };
            let Some(name) = identifier.value("./gmd:code/gco:CharacterString") else {
                continue;
            };
            let id = area_class(&title).and_then(|class| match self.resolvers.areas.get_area_id(&name, class) {
                Ok(id) => id,
                Err(e) => {
                    warn!(name = %name, class, error = %e, "area lookup failed");
                    None
                }
            });
            extents.push(Extent { title, name, id });
        }
        extents
    }

    /// Element 14: vertical extent, one entry per part that is present.
    pub fn vertical_extent(&self) -> Option<VerticalExtent> {
        let extent = self.root.first("//gmd:extent/gmd:EX_Extent/gmd:verticalElement/gmd:EX_VerticalExtent")?;
        let mut parts = VerticalExtent::new();
        let mut text = |key: &str, scope: Scope<'d>, path: &str| {
            if let Some(value) = scope.value(path) {
                parts.insert(key.to_string(), VerticalPart::Text(value));
            }
        };
        text("min-value", extent, "./gmd:minimumValue/gco:Real");
        text("max-value", extent, "./gmd:maximumValue/gco:Real");
        text("crs", extent, "./gmd:verticalCRS/@xlink:href");

        let Some(crs) = extent.first("./gmd:verticalCRS/gml:VerticalCRS") else {
            return Some(parts);
        };
        text("crs-name", crs, "./gml:name");
        text("crs-scope", crs, "./gml:scope");
        text("cs-name", crs, "./gml:verticalCS/gml:VerticalCS/gml:name");
        text("datum-name", crs, "./gml:verticalDatum/gml:VerticalDatum/gml:name");
        text("datum-scope", crs, "./gml:verticalDatum/gml:VerticalDatum/gml:scope");
        text("datum-info", crs, "./gml:verticalDatum/gml:VerticalDatum/gml:anchorDefinition");

        let mut pair = |key: &str, first: &str, second: &str| {
            if let (Some(a), Some(b)) = (crs.value(first), crs.value(second)) {
                parts.insert(key.to_string(), VerticalPart::Pair(a, b));
            }
        };
        pair("crs-id", "./gml:identifier/@codeSpace", "./gml:identifier");
        pair(
            "cs-id",
            "./gml:verticalCS/gml:VerticalCS/gml:identifier/@codeSpace",
            "./gml:verticalCS/gml:VerticalCS/gml:identifier",
        );
        let axis = "./gml:verticalCS/gml:VerticalCS/gml:axis/gml:CoordinateSystemAxis";
        pair("csaxis-id", &format!("{}/gml:identifier/@codeSpace", axis), &format!("{}/gml:identifier", axis));
        pair("csaxis-info", &format!("{}/gml:axisAbbrev", axis), &format!("{}/gml:axisDirection", axis));
        pair(
            "datum-id",
            "./gml:verticalDatum/gml:VerticalDatum/gml:identifier/@codeSpace",
            "./gml:verticalDatum/gml:VerticalDatum/gml:identifier",
        );
        Some(parts)
    }

    /// Element 15: spatial reference system.
    pub fn reference_system(&self) -> Option<SpatialReference> {
        let code = self.root.value(
            "//gmd:referenceSystemInfo/gmd:MD_ReferenceSystem/gmd:referenceSystemIdentifier/gmd:RS_Identifier/gmd:code/gco:CharacterString",
        )?;
        match self.resolvers.reference_systems.resolve(&code) {
            Ok(Some(system)) => Some(system),
            Ok(None) => {
                debug!(code = %code, "reference system not known");
                Some(SpatialReference::identified(&code))
            }
            Err(e) => {
                warn!(code = %code, error = %e, "reference system lookup failed");
                Some(SpatialReference::identified(&code))
            }
        }
    }

    /// Element 16: temporal reference. Timestamps are truncated to their date.
    pub fn temporal_reference(&self) -> Option<TemporalReference> {
        let mut reference = TemporalReference::default();
        let temporal = "//gmd:EX_Extent/gmd:temporalElement/gmd:EX_TemporalExtent";
        let begin = self.root.value(&format!("{}//gml:beginPosition", temporal));
        let end = self.root.value(&format!("{}//gml:endPosition", temporal));
        if let (Some(begin), Some(end)) = (begin, end) {
            match (parse_lenient(&begin), parse_lenient(&end)) {
                (Ok(b), Ok(e)) => reference.range = Some((b, e)),
                _ => warn!(begin = %begin, end = %end, "temporal extent is not a valid range"),
            }
        }

        for date in self.root.elements("//gmd:identificationInfo/*/gmd:citation/gmd:CI_Citation/gmd:date/gmd:CI_Date") {
            let Some(text) = date.value("./gmd:date/*") else { continue };
            let Some(code) = code_value(date, "./gmd:dateType/gmd:CI_DateTypeCode") else {
                continue;
            };
            match parse_lenient(&text) {
                Ok(value) => reference.single.push((code, value)),
                Err(e) => warn!(code = %code, error = %e, "citation date skipped"),
            }
        }

        if reference.is_empty() { None } else { Some(reference) }
    }

    /// Element 17: lineage.
    pub fn lineage(&self) -> Option<String> {
        self.root.value("//gmd:lineage/gmd:LI_Lineage/gmd:statement")
    }

    /// Element 18: spatial resolution.
    pub fn spatial_resolution(&self) -> Vec<Resolution> {
        self.root
            .elements("//gmd:identificationInfo/*/gmd:spatialResolution/gmd:MD_Resolution")
            .into_iter()
            .map(|resolution| Resolution {
                distance: resolution.value("./gmd:distance/gco:Distance"),
                scale: resolution.value("./gmd:equivalentScale/gmd:MD_RepresentativeFraction/gmd:denominator"),
            })
            .filter(|r| r.distance.is_some() || r.scale.is_some())
            .collect()
    }

    /// Element 19: additional information source.
    pub fn additional_info(&self) -> Option<String> {
        self.root.value("//gmd:identificationInfo/*/gmd:supplementalInformation")
    }

    /// Element 20: limitations on public access.
    pub fn access_limits(&self) -> Vec<AccessLimit> {
        let constraints = "//gmd:identificationInfo/*/gmd:resourceConstraints/gmd:MD_LegalConstraints";
        let mut limits: Vec<AccessLimit> = self
            .root
            .elements(&format!("{}/gmd:accessConstraints/gmd:MD_RestrictionCode", constraints))
            .into_iter()
            .filter_map(|code| code.value(".").or_else(|| code.value("./@codeListValue")))
            .map(|code| AccessLimit::Term(self.term(&self.settings.vocabulary.access_types, &code)))
            .collect();
        limits.extend(
            self.root
                .values(&format!("{}/gmd:otherConstraints", constraints))
                .into_iter()
                .map(AccessLimit::Other),
        );
        limits
    }

    /// Element 21: conditions applying to access and use.
    pub fn access_conditions(&self) -> Vec<String> {
        self.root.values("//gmd:identificationInfo/*/gmd:resourceConstraints/gmd:*/gmd:useLimitation")
    }

    /// The responsible parties as they appear in the document, unmerged.
    pub fn contacts(&self) -> Vec<Contact> {
        party::responsible_parties(self.root)
    }

    /// Element 22: responsible parties, merged.
    pub fn responsible_party(&self) -> Contacts {
        Contacts::new(self.contacts())
            .with_component_limit(self.settings.merge.component_limit)
            .merge()
    }

    /// Element 23: data formats, keyed by format name.
    pub fn data_formats(&self) -> BTreeMap<String, VocabTerm> {
        self.root
            .elements("//gmd:identificationInfo/*/gmd:resourceFormat/gmd:MD_Format")
            .into_iter()
            .filter_map(|format| format.value("./gmd:name"))
            .map(|name| {
                let term = self.term(&self.settings.vocabulary.data_formats, &name);
                (name, term)
            })
            .collect()
    }

    /// Element 24: frequency of update.
    pub fn update_frequency(&self) -> Option<String> {
        let code = self.root.value(
            "//gmd:identificationInfo/*/gmd:resourceMaintenance/gmd:MD_MaintenanceInformation/gmd:maintenanceAndUpdateFrequency/gmd:MD_MaintenanceFrequencyCode/@codeListValue",
        )?;
        match UPDATE_FREQUENCIES.iter().find(|(c, _)| *c == code) {
            Some((_, description)) => Some(description.to_string()),
            None => Some(code),
        }
    }

    /// Element 25: INSPIRE conformity reports.
    pub fn inspire_conformity(&self) -> Vec<Conformity> {
        self.root
            .elements("//gmd:dataQualityInfo/gmd:DQ_DataQuality/gmd:report/*/gmd:result/gmd:DQ_ConformanceResult")
            .into_iter()
            .map(|result| Conformity {
                specification: result.value("./gmd:specification/gmd:CI_Citation/gmd:title"),
                explanation: result.value("./gmd:explanation"),
                pass: result.value("./gmd:pass/gco:Boolean").and_then(|flag| match flag.as_str() {
                    "true" | "1" => Some(true),
                    "false" | "0" => Some(false),
                    _ => None,
                }),
            })
            .collect()
    }

    /// Element 26: metadata date.
    ///
    /// A `gco:Date` is preferred over a `gco:DateTime`. When the value is
    /// malformed, [`DateMode::Raise`] fails and [`DateMode::Capture`] returns
    /// the error as [`DateElement::Invalid`].
    pub fn date(&self, mode: DateMode) -> Result<Option<DateElement>> {
        let invalid = |error: MetadataError| match mode {
            DateMode::Raise => Err(MedinError::Metadata(error)),
            DateMode::Capture => Ok(Some(DateElement::Invalid(error))),
        };
        if let Some(date) = self.root.value("/gmd:MD_Metadata/gmd:dateStamp/gco:Date") {
            return match parse_date(&date) {
                Ok(value) => Ok(Some(DateElement::Valid(MetadataDate::Date(value)))),
                Err(_) => invalid(MetadataError::new(
                    "The metadata date is not valid",
                    format!("The date retrieved from the XML is not a valid date: {}", date),
                )),
            };
        }
        let Some(timestamp) = self.root.value("/gmd:MD_Metadata/gmd:dateStamp/gco:DateTime") else {
            return Ok(None);
        };
        match parse_datetime(&timestamp) {
            Ok(value) => Ok(Some(DateElement::Valid(MetadataDate::DateTime(value)))),
            Err(_) => invalid(MetadataError::new(
                "The metadata timestamp is not valid",
                format!("The timestamp retrieved from the XML is not a valid datetime: {}", timestamp),
            )),
        }
    }

    /// Element 27: metadata standard name.
    pub fn standard_name(&self) -> Option<String> {
        self.root.value("//gmd:MD_Metadata/gmd:metadataStandardName/gco:CharacterString")
    }

    /// Element 28: metadata standard version.
    pub fn standard_version(&self) -> Option<String> {
        self.root.value("//gmd:MD_Metadata/gmd:metadataStandardVersion/gco:CharacterString")
    }

    /// Element 29: metadata language.
    pub fn language(&self) -> Option<String> {
        self.root
            .value("//gmd:MD_Metadata/gmd:language/gmd:LanguageCode")
            .or_else(|| self.root.value("//gmd:MD_Metadata/gmd:language/gmd:LanguageCode/@codeListValue"))
    }

    /// Element 30: parent identifier.
    pub fn parent_id(&self) -> Option<String> {
        self.root.value("//gmd:MD_Metadata/gmd:parentIdentifier/gco:CharacterString")
    }
}
