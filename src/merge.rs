//! The contact collection and the merge engine.
//!
//! Contacts scattered through a document often describe the same party with
//! different attributes filled in. [`Contacts::merge`] collapses them into one
//! root per organisation. Two steps do the work:
//!
//! * **Inference.** A missing attribute is inferred by walking the graph whose
//!   edges join contacts agreeing on some non-empty attribute other than the
//!   one being inferred. A contact offers the attributes of its whole subtree
//!   as links, so a merged root still reaches what its folded members reached.
//!   The walk is breadth first over a bitmap of visited contact indices and
//!   gives up at `component_limit` contacts. A value is adopted only when a
//!   complete walk finds exactly one distinct value.
//! * **Folding.** Within an organisation group, attribute values are promoted
//!   to a shared base contact. Contacts that gave up every eligible attribute
//!   hand their roles (and sub-contacts) to the base and disappear; the rest
//!   become children of the base.
//!
//! Grouping works on copies, so it never changes the collection it groups.
//! Merging a group however consumes those copies, promoting and clearing
//! their attributes as it goes.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

// the visited set of an inference walk
use roaring::RoaringBitmap;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::contact::{Contact, ContactAttribute};

pub const DEFAULT_COMPONENT_LIMIT: usize = 256;

/// A set of contact roots.
#[derive(Debug, Clone)]
pub struct Contacts {
    contacts: Vec<Contact>,
    component_limit: usize,
}

impl Default for Contacts {
    fn default() -> Self {
        Self { contacts: Vec::new(), component_limit: DEFAULT_COMPONENT_LIMIT }
    }
}

/// The values reachable during one inference walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    pub values: BTreeSet<String>,
    /// False when the walk stopped at the component limit.
    pub complete: bool,
}

type Footprint<'c> = BTreeSet<(ContactAttribute, &'c str)>;

// every value held in the subtree, except those of the inferred attribute
fn footprint<'c>(contact: &'c Contact, target: ContactAttribute, into: &mut Footprint<'c>) {
    for attribute in ContactAttribute::ALL {
        if attribute == target {
            continue;
        }
        if let Some(value) = contact.get(attribute) {
            into.insert((attribute, value));
        }
    }
    for child in contact.contacts() {
        footprint(child, target, into);
    }
}

fn footprint_of(contact: &Contact, target: ContactAttribute) -> Footprint<'_> {
    let mut into = Footprint::new();
    footprint(contact, target, &mut into);
    into
}

impl Contacts {
    pub fn new<I: IntoIterator<Item = Contact>>(contacts: I) -> Self {
        let mut collection = Self::default();
        collection.extend(contacts);
        collection
    }
    pub fn with_component_limit(mut self, limit: usize) -> Self {
        self.component_limit = limit.max(1);
        self
    }
    pub fn component_limit(&self) -> usize {
        self.component_limit
    }
    /// Adds a contact unless an equal one is already present.
    pub fn insert(&mut self, contact: Contact) -> bool {
        if self.contacts.contains(&contact) {
            false
        } else {
            self.contacts.push(contact);
            true
        }
    }
    pub fn extend<I: IntoIterator<Item = Contact>>(&mut self, contacts: I) {
        for contact in contacts {
            self.insert(contact);
        }
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Contact> {
        self.contacts.iter()
    }
    pub fn len(&self) -> usize {
        self.contacts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
    pub fn number_of_people(&self) -> usize {
        self.contacts.iter().filter(|c| c.is_person()).count()
    }

    /// Every distinct value of `attribute` reachable from `contact` through
    /// contacts sharing some other non-empty attribute anywhere in their subtrees.
    pub fn match_attribute(&self, contact: &Contact, attribute: ContactAttribute) -> Matches {
        let footprints: Vec<Footprint> = self.contacts.iter().map(|c| footprint_of(c, attribute)).collect();
        let mut matches = Matches::default();
        let mut visited = RoaringBitmap::new();
        let start = footprint_of(contact, attribute);
        let mut queue = VecDeque::from([&start]);
        while let Some(current) = queue.pop_front() {
            for (index, candidate) in self.contacts.iter().enumerate() {
                let links = &footprints[index];
                let index = index as u32;
                if visited.contains(index) || current.is_disjoint(links) {
                    continue;
                }
                if visited.len() as usize >= self.component_limit {
                    warn!(%attribute, limit = self.component_limit, "inference stopped at the component limit");
                    return matches;
                }
                visited.insert(index);
                if let Some(value) = candidate.get(attribute) {
                    matches.values.insert(value.to_string());
                }
                queue.push_back(links);
            }
        }
        matches.complete = true;
        matches
    }

    /// The inferred value of `attribute`, adopted only if a complete walk
    /// found it unambiguous.
    pub fn infer_attribute(&self, contact: &Contact, attribute: ContactAttribute) -> Option<String> {
        let Matches { mut values, complete } = self.match_attribute(contact, attribute);
        if complete && values.len() == 1 {
            values.pop_first()
        } else {
            debug!(%attribute, candidates = values.len(), complete, "attribute not inferred");
            None
        }
    }

    /// Buckets copies of the contacts by `attribute`, inferring it where it is missing.
    pub fn group_by_attribute(&self, attribute: ContactAttribute) -> BTreeMap<Option<String>, Contacts> {
        let mut groups: BTreeMap<Option<String>, Contacts> = BTreeMap::new();
        for contact in &self.contacts {
            let mut contact = contact.clone();
            if contact.get(attribute).is_none() {
                let inferred = self.infer_attribute(&contact, attribute);
                contact.set(attribute, inferred.as_deref());
            }
            let key = contact.get(attribute).map(str::to_string);
            groups
                .entry(key)
                .or_insert_with(|| Contacts::default().with_component_limit(self.component_limit))
                .insert(contact);
        }
        groups
    }
    pub fn group_by_organisation(&self) -> BTreeMap<Option<String>, Contacts> {
        self.group_by_attribute(ContactAttribute::Organisation)
    }

    /// Collapses the collection into one root per organisation.
    pub fn merge(&self) -> Contacts {
        let mut merged = Contacts::default().with_component_limit(self.component_limit);
        for (organisation, group) in self.group_by_organisation() {
            let crowded = group.number_of_people() > 2;
            let mut base = Contact::new(organisation.as_deref());
            for mut contact in group.contacts {
                let (eligible, mut empty): (&[ContactAttribute], bool) = if crowded && contact.is_person() {
                    (&ContactAttribute::SHARED, false)
                } else {
                    (&ContactAttribute::ALL, true)
                };
                for &attribute in eligible {
                    let Some(value) = contact.get(attribute) else { continue };
                    if base.get(attribute).is_none_or(|b| b == value) {
                        let value = contact.take(attribute);
                        base.set(attribute, value.as_deref());
                    } else {
                        empty = false;
                    }
                }
                if empty {
                    base.add_roles(contact.roles().iter().cloned());
                    for child in contact.contacts() {
                        base.add_contact(child.clone());
                    }
                } else {
                    base.add_contact(contact);
                }
            }
            debug!(organisation = ?organisation, children = base.contacts().len(), "merged organisation");
            merged.insert(base);
        }
        merged
    }
}

impl PartialEq for Contacts {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.contacts.iter().all(|c| other.contacts.contains(c))
            && other.contacts.iter().all(|c| self.contacts.contains(c))
    }
}
impl Eq for Contacts {}

impl<'a> IntoIterator for &'a Contacts {
    type Item = &'a Contact;
    type IntoIter = std::slice::Iter<'a, Contact>;
    fn into_iter(self) -> Self::IntoIter {
        self.contacts.iter()
    }
}

impl IntoIterator for Contacts {
    type Item = Contact;
    type IntoIter = std::vec::IntoIter<Contact>;
    fn into_iter(self) -> Self::IntoIter {
        self.contacts.into_iter()
    }
}

impl FromIterator<Contact> for Contacts {
    fn from_iter<I: IntoIterator<Item = Contact>>(contacts: I) -> Self {
        Contacts::new(contacts)
    }
}

impl fmt::Display for Contacts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, contact) in self.contacts.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write!(f, "{}", contact)?;
        }
        Ok(())
    }
}

impl Serialize for Contacts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.contacts)
    }
}
