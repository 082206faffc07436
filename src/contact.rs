// used to keep roles ordered and free of duplicates
use std::collections::BTreeSet;
// used to print out the contact tree
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

// ------------- ContactAttribute -------------
#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone, Copy)]
pub enum ContactAttribute {
    Organisation,
    Name,
    Position,
    Address,
    Tel,
    Fax,
    Email,
    Url,
}

impl ContactAttribute {
    pub const ALL: [ContactAttribute; 8] = [
        ContactAttribute::Organisation,
        ContactAttribute::Name,
        ContactAttribute::Position,
        ContactAttribute::Address,
        ContactAttribute::Tel,
        ContactAttribute::Fax,
        ContactAttribute::Email,
        ContactAttribute::Url,
    ];
    /// The attributes an individual shares with the organisation it belongs to.
    pub const SHARED: [ContactAttribute; 3] =
        [ContactAttribute::Organisation, ContactAttribute::Address, ContactAttribute::Url];

    fn index(self) -> usize {
        self as usize
    }
    pub fn key(self) -> &'static str {
        match self {
            ContactAttribute::Organisation => "organisation",
            ContactAttribute::Name => "name",
            ContactAttribute::Position => "position",
            ContactAttribute::Address => "address",
            ContactAttribute::Tel => "tel",
            ContactAttribute::Fax => "fax",
            ContactAttribute::Email => "email",
            ContactAttribute::Url => "url",
        }
    }
    pub fn label(self) -> &'static str {
        match self {
            ContactAttribute::Organisation => "Organisation",
            ContactAttribute::Name => "Name",
            ContactAttribute::Position => "Position",
            ContactAttribute::Address => "Address",
            ContactAttribute::Tel => "Tel",
            ContactAttribute::Fax => "Fax",
            ContactAttribute::Email => "Email",
            ContactAttribute::Url => "Url",
        }
    }
}

impl fmt::Display for ContactAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Trims a value and maps the blank, `unknown` and `inapplicable` sentinels to absent.
pub fn normalize(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("unknown") || value.eq_ignore_ascii_case("inapplicable") {
        None
    } else {
        Some(value.to_string())
    }
}

// ------------- Role -------------
#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone, Copy)]
pub enum RoleCode {
    ResourceProvider,
    Custodian,
    Owner,
    User,
    Distributor,
    Originator,
    PointOfContact,
    PrincipalInvestigator,
    Processor,
    Publisher,
    Author,
}

impl RoleCode {
    pub const ALL: [RoleCode; 11] = [
        RoleCode::ResourceProvider,
        RoleCode::Custodian,
        RoleCode::Owner,
        RoleCode::User,
        RoleCode::Distributor,
        RoleCode::Originator,
        RoleCode::PointOfContact,
        RoleCode::PrincipalInvestigator,
        RoleCode::Processor,
        RoleCode::Publisher,
        RoleCode::Author,
    ];
    pub fn code(&self) -> &'static str {
        match self {
            RoleCode::ResourceProvider => "resourceProvider",
            RoleCode::Custodian => "custodian",
            RoleCode::Owner => "owner",
            RoleCode::User => "user",
            RoleCode::Distributor => "distributor",
            RoleCode::Originator => "originator",
            RoleCode::PointOfContact => "pointOfContact",
            RoleCode::PrincipalInvestigator => "principalInvestigator",
            RoleCode::Processor => "processor",
            RoleCode::Publisher => "publisher",
            RoleCode::Author => "author",
        }
    }
    pub fn description(&self) -> &'static str {
        match self {
            RoleCode::ResourceProvider => "Party that supplies the resource.",
            RoleCode::Custodian => {
                "Party that accepts accountability and responsibility for the data and ensures appropriate care and maintenance of the resource."
            }
            RoleCode::Owner => "Party that owns the resource.",
            RoleCode::User => "Party who uses the resource.",
            RoleCode::Distributor => "Party that distributes the resource.",
            RoleCode::Originator => "Party who created the resource.",
            RoleCode::PointOfContact => {
                "Party who can be contacted for acquiring knowledge about or acquisition of the resource."
            }
            RoleCode::PrincipalInvestigator => "Key party responsible for gathering information and conducting research.",
            RoleCode::Processor => "Party who has processed the data in a manner such that the resource has been modified.",
            RoleCode::Publisher => "Party who published the resource.",
            RoleCode::Author => "Party who authored the resource.",
        }
    }
    pub fn from_code(code: &str) -> Option<RoleCode> {
        RoleCode::ALL.iter().copied().find(|r| r.code() == code.trim())
    }
}

/// Why a party is associated with the resource.
#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone, serde::Serialize)]
pub struct Role {
    abbreviation: String,
    description: String,
}

impl Role {
    pub fn new(abbreviation: impl Into<String>, description: impl Into<String>) -> Self {
        Self { abbreviation: abbreviation.into(), description: description.into() }
    }
    /// A role from a `CI_RoleCode` value; an unlisted code describes itself.
    pub fn from_code(code: &str) -> Self {
        match RoleCode::from_code(code) {
            Some(role) => role.into(),
            None => Self::new(code.trim(), code.trim()),
        }
    }
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<RoleCode> for Role {
    fn from(code: RoleCode) -> Self {
        Self::new(code.code(), code.description())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

// ------------- Contact -------------
/// A responsible party, possibly holding the sub-parties folded into it.
#[derive(Debug, Clone, Default)]
pub struct Contact {
    attributes: [Option<String>; 8],
    roles: BTreeSet<Role>,
    contacts: Vec<Contact>,
}

impl Contact {
    pub fn new(organisation: Option<&str>) -> Self {
        let mut contact = Self::default();
        contact.set(ContactAttribute::Organisation, organisation);
        contact
    }
    pub fn get(&self, attribute: ContactAttribute) -> Option<&str> {
        self.attributes[attribute.index()].as_deref()
    }
    /// Sets an attribute; sentinel values leave it absent.
    pub fn set(&mut self, attribute: ContactAttribute, value: Option<&str>) {
        self.attributes[attribute.index()] = normalize(value);
    }
    pub fn take(&mut self, attribute: ContactAttribute) -> Option<String> {
        self.attributes[attribute.index()].take()
    }
    pub fn with(mut self, attribute: ContactAttribute, value: &str) -> Self {
        self.set(attribute, Some(value));
        self
    }
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }
    pub fn organisation(&self) -> Option<&str> {
        self.get(ContactAttribute::Organisation)
    }
    pub fn name(&self) -> Option<&str> {
        self.get(ContactAttribute::Name)
    }
    pub fn position(&self) -> Option<&str> {
        self.get(ContactAttribute::Position)
    }
    pub fn address(&self) -> Option<&str> {
        self.get(ContactAttribute::Address)
    }
    pub fn tel(&self) -> Option<&str> {
        self.get(ContactAttribute::Tel)
    }
    pub fn fax(&self) -> Option<&str> {
        self.get(ContactAttribute::Fax)
    }
    pub fn email(&self) -> Option<&str> {
        self.get(ContactAttribute::Email)
    }
    pub fn url(&self) -> Option<&str> {
        self.get(ContactAttribute::Url)
    }
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }
    pub fn add_role(&mut self, role: Role) {
        self.roles.insert(role);
    }
    pub fn add_roles<I: IntoIterator<Item = Role>>(&mut self, roles: I) {
        self.roles.extend(roles);
    }
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
    pub fn has_attributes(&self) -> bool {
        self.attributes.iter().any(Option::is_some)
    }
    pub fn is_person(&self) -> bool {
        self.name().is_some() || self.position().is_some()
    }
    /// True unless some attribute present on both sides differs.
    pub fn same_contact(&self, other: &Contact) -> bool {
        compatible(&self.attributes, &other.attributes)
    }
    /// Folds `contact` into the first compatible child, or adopts it as a new child.
    ///
    /// Folding fills the child's absent attributes from `contact` and takes over
    /// its roles and any of its children the child does not already hold.
    pub fn add_contact(&mut self, contact: Contact) {
        let Contact { attributes, roles, contacts } = contact;
        let existing = self.contacts.iter_mut().find(|child| compatible(&child.attributes, &attributes));
        match existing {
            Some(child) => {
                for (mine, theirs) in child.attributes.iter_mut().zip(attributes) {
                    if mine.is_none() {
                        *mine = theirs;
                    }
                }
                child.roles.extend(roles);
                for grandchild in contacts {
                    child.insert_child(grandchild);
                }
            }
            None => self.contacts.push(Contact { attributes, roles, contacts }),
        }
    }
    // adopts a child unless an equal one is already held
    fn insert_child(&mut self, contact: Contact) {
        if !self.contacts.contains(&contact) {
            self.contacts.push(contact);
        }
    }

    fn serialise(&self, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
        let space = "  ".repeat(depth);
        let mut lines: Vec<String> = ContactAttribute::ALL
            .iter()
            .filter_map(|&a| self.get(a).map(|v| format!("{}: {}", a.label(), v)))
            .collect();
        for (i, role) in self.roles.iter().enumerate() {
            let lead = if i == 0 { "Roles: " } else { "       " };
            lines.push(format!("{}{}", lead, role));
        }
        write!(f, "{}{}", space, lines.join(&format!("\n{}", space)))?;
        for child in &self.contacts {
            write!(f, "\n\n")?;
            child.serialise(depth + 2, f)?;
        }
        Ok(())
    }
}

fn compatible(a: &[Option<String>; 8], b: &[Option<String>; 8]) -> bool {
    a.iter().zip(b.iter()).all(|pair| match pair {
        (Some(x), Some(y)) => x == y,
        _ => true,
    })
}

// children are compared as a set
fn same_members(a: &[Contact], b: &[Contact]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.attributes == other.attributes
                && self.roles == other.roles
                && same_members(&self.contacts, &other.contacts))
    }
}
impl Eq for Contact {}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.serialise(0, f)
    }
}

impl Serialize for Contact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for attribute in ContactAttribute::ALL {
            if let Some(value) = self.get(attribute) {
                map.serialize_entry(attribute.key(), value)?;
            }
        }
        map.serialize_entry("roles", &self.roles)?;
        map.serialize_entry("contacts", &self.contacts)?;
        map.end()
    }
}
