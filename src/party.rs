//! Reading responsible parties out of a document.
//!
//! Produces one unmerged [`Contact`] per `CI_ResponsibleParty` found in the
//! metadata contact, the point of contact of any identification section and
//! the distributor contacts, in that order.

use tracing::debug;

use crate::contact::{Contact, ContactAttribute, Role};
use crate::path::Scope;

const PARTY_PATHS: [&str; 3] = [
    "//gmd:MD_Metadata/gmd:contact/gmd:CI_ResponsibleParty",
    "//gmd:MD_Metadata/gmd:identificationInfo/*/gmd:pointOfContact/gmd:CI_ResponsibleParty",
    "//gmd:MD_Metadata/gmd:distributionInfo/gmd:MD_Distribution/gmd:distributor/gmd:MD_Distributor/gmd:distributorContact/gmd:CI_ResponsibleParty",
];

const ADDRESS: &str = "./gmd:contactInfo/gmd:CI_Contact/gmd:address/gmd:CI_Address";

pub fn responsible_parties(root: Scope<'_>) -> Vec<Contact> {
    let contacts: Vec<Contact> = PARTY_PATHS
        .iter()
        .flat_map(|path| root.elements(path))
        .map(contact_details)
        .collect();
    debug!(count = contacts.len(), "read responsible parties");
    contacts
}

/// The attributes and role of one responsible party element.
pub fn contact_details(party: Scope<'_>) -> Contact {
    let mut contact = Contact::new(party.value("./gmd:organisationName").as_deref());
    contact.set(ContactAttribute::Name, party.value("./gmd:individualName").as_deref());
    contact.set(ContactAttribute::Position, party.value("./gmd:positionName").as_deref());

    let mut address = party.values(&format!("{}/gmd:deliveryPoint", ADDRESS));
    for tag in ["city", "postalCode", "country"] {
        if let Some(part) = party.value(&format!("{}/gmd:{}", ADDRESS, tag)) {
            address.push(part);
        }
    }
    if !address.is_empty() {
        contact.set(ContactAttribute::Address, Some(&address.join(", ")));
    }

    contact.set(
        ContactAttribute::Tel,
        party.value("./gmd:contactInfo/gmd:CI_Contact/gmd:phone/gmd:CI_Telephone/gmd:voice").as_deref(),
    );
    contact.set(
        ContactAttribute::Fax,
        party.value("./gmd:contactInfo/gmd:CI_Contact/gmd:phone/gmd:CI_Telephone/gmd:facsimile").as_deref(),
    );
    contact.set(ContactAttribute::Email, party.value(&format!("{}/gmd:electronicMailAddress", ADDRESS)).as_deref());
    contact.set(
        ContactAttribute::Url,
        party
            .value("./gmd:contactInfo/gmd:CI_Contact/gmd:onlineResource/gmd:CI_OnlineResource/gmd:linkage/gmd:URL")
            .as_deref(),
    );

    // the code list value is authoritative, the element text is the fallback
    let role = party
        .value("./gmd:role/gmd:CI_RoleCode/@codeListValue")
        .or_else(|| party.value("./gmd:role/gmd:CI_RoleCode"));
    if let Some(role) = role {
        contact.add_role(Role::from_code(&role));
    }
    contact
}
