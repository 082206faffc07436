//! Medin – an object model for MEDIN/ISO19115 marine metadata records.
//!
//! A MEDIN record is an ISO19115(-2) XML document describing a marine data
//! resource. This crate reads such a document into a [`metadata::Metadata`]
//! aggregate holding the MEDIN elements: titles, extents, lineage, access
//! constraints, vocabulary terms and a deduplicated hierarchy of responsible
//! parties.
//!
//! ## Modules
//! * [`document`] – The parsed document, an arena of namespace-resolved nodes.
//! * [`path`] – Structural path queries (grammar in `path.pest`) evaluated
//!   against an explicit [`path::Scope`].
//! * [`temporal`] – Dates that keep the precision of their source text.
//! * [`extract`] – The element extractor, one method per MEDIN element.
//! * [`party`] – Responsible parties as found in the document.
//! * [`contact`] – The [`contact::Contact`] tree and its roles.
//! * [`merge`] – The [`merge::Contacts`] collection: attribute inference and merging.
//! * [`vocab`], [`spatial`] – Lookup contracts of the vocabulary, area and
//!   spatial reference resolvers, with in-memory implementations.
//! * [`persist`] – SQLite implementations of the resolver contracts.
//! * [`settings`] – Layered configuration.
//! * [`metadata`] – The assembled [`metadata::Metadata`].
//!
//! ## Contact Merging
//! The same party often appears several times in a record with different
//! details filled in. Missing attributes are inferred from contacts that share
//! other attributes, contacts are grouped by organisation, and shared details
//! are promoted to one root per organisation while individuals become its
//! children.
//!
//! ## Quick Start
//! ```
//! use medin::extract::Resolvers;
//! use medin::metadata::Metadata;
//! use medin::settings::Settings;
//! use medin::spatial::{AreaIndex, StaticReferenceSystems};
//! use medin::vocab::StaticVocabulary;
//!
//! let xml = br#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
//!     xmlns:gco="http://www.isotc211.org/2005/gco">
//!   <gmd:parentIdentifier><gco:CharacterString>parent-1</gco:CharacterString></gmd:parentIdentifier>
//! </gmd:MD_Metadata>"#;
//! let vocabulary = StaticVocabulary::new();
//! let areas = AreaIndex::new();
//! let systems = StaticReferenceSystems::new();
//! let resolvers = Resolvers { vocabulary: &vocabulary, areas: &areas, reference_systems: &systems };
//! let metadata = Metadata::parse("record-1", xml, resolvers, &Settings::default()).unwrap();
//! assert_eq!(metadata.parent_id.as_deref(), Some("parent-1"));
//! assert!(metadata.responsible_party.is_empty());
//! ```

pub mod contact;
pub mod document;
pub mod error;
pub mod extract;
pub mod merge;
pub mod metadata;
pub mod party;
pub mod path;
pub mod persist;
pub mod settings;
pub mod spatial;
pub mod temporal;
pub mod vocab;
