use medin::contact::{Contact, ContactAttribute, Role, RoleCode};
use medin::merge::Contacts;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const MBA: &str = "Marine Biological Association of the UK (MBA)";

fn organisation(name: &str) -> Contact {
    Contact::new(Some(name))
}

fn anonymous() -> Contact {
    Contact::new(None)
}

#[test]
fn sentinel_values_are_treated_as_absent() {
    let contact = Contact::new(Some("  Unknown "))
        .with(ContactAttribute::Name, "inapplicable")
        .with(ContactAttribute::Tel, "   ")
        .with(ContactAttribute::Email, "  info@mba.ac.uk ");
    assert_eq!(contact.organisation(), None);
    assert_eq!(contact.name(), None);
    assert_eq!(contact.tel(), None);
    assert_eq!(contact.email(), Some("info@mba.ac.uk"), "values are trimmed");
    assert!(!contact.is_person());
}

#[test]
fn unlisted_role_codes_describe_themselves() {
    let known = Role::from_code("custodian");
    assert_eq!(known, Role::from(RoleCode::Custodian));
    assert!(known.description().starts_with("Party that accepts accountability"));
    let unknown = Role::from_code("chiefScientist");
    assert_eq!(unknown.abbreviation(), "chiefScientist");
    assert_eq!(unknown.description(), "chiefScientist");
}

#[test]
fn same_contact_only_compares_attributes_present_on_both_sides() {
    let a = organisation("MBA").with(ContactAttribute::Email, "a@mba.ac.uk");
    let b = organisation("MBA").with(ContactAttribute::Tel, "01752 633207");
    let c = organisation("MBA").with(ContactAttribute::Email, "c@mba.ac.uk");
    assert!(a.same_contact(&b));
    assert!(b.same_contact(&a));
    assert!(!a.same_contact(&c), "different emails must not match");
    assert!(anonymous().same_contact(&a), "an empty contact matches anything");
}

#[test]
fn contacts_equal_regardless_of_child_order() {
    let jane = anonymous().with(ContactAttribute::Name, "Jane");
    let john = anonymous().with(ContactAttribute::Name, "John");
    let mut first = organisation("MBA");
    first.add_contact(jane.clone());
    first.add_contact(john.clone());
    let mut second = organisation("MBA");
    second.add_contact(john);
    second.add_contact(jane);
    assert_eq!(first, second);
}

#[test]
fn add_contact_folds_into_a_compatible_child() {
    let mut base = organisation("MBA");
    base.add_contact(anonymous().with(ContactAttribute::Name, "Jane"));
    base.add_contact(
        anonymous()
            .with(ContactAttribute::Name, "Jane")
            .with(ContactAttribute::Email, "jane@mba.ac.uk")
            .with_role(RoleCode::Custodian.into()),
    );
    assert_eq!(base.contacts().len(), 1, "Jane should be folded, not duplicated");
    let jane = &base.contacts()[0];
    assert_eq!(jane.email(), Some("jane@mba.ac.uk"), "absent attributes are filled in");
    assert!(jane.roles().contains(&Role::from(RoleCode::Custodian)));

    base.add_contact(anonymous().with(ContactAttribute::Name, "John"));
    assert_eq!(base.contacts().len(), 2);
}

#[test]
fn missing_organisation_is_inferred_through_a_chain_of_shared_attributes() {
    let contacts = Contacts::new(vec![
        organisation("X").with(ContactAttribute::Email, "e1@x.org"),
        anonymous().with(ContactAttribute::Email, "e1@x.org").with(ContactAttribute::Tel, "111"),
        anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Name, "Bob"),
    ]);
    let bob = anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Name, "Bob");
    assert_eq!(contacts.infer_attribute(&bob, ContactAttribute::Organisation).as_deref(), Some("X"));

    let groups = contacts.group_by_organisation();
    assert_eq!(groups.len(), 1, "every contact belongs to X");
    let x = groups.get(&Some("X".to_string())).expect("group X");
    assert_eq!(x.len(), 3);
    assert!(x.iter().all(|c| c.organisation() == Some("X")));
}

#[test]
fn ambiguous_inference_adopts_nothing() {
    let contacts = Contacts::new(vec![
        organisation("X").with(ContactAttribute::Email, "shared@example.org"),
        organisation("Y").with(ContactAttribute::Email, "shared@example.org"),
        anonymous().with(ContactAttribute::Email, "shared@example.org").with(ContactAttribute::Name, "Bob"),
    ]);
    let bob = anonymous().with(ContactAttribute::Email, "shared@example.org").with(ContactAttribute::Name, "Bob");
    let candidates = contacts.match_attribute(&bob, ContactAttribute::Organisation);
    assert!(candidates.complete);
    assert_eq!(candidates.values.len(), 2);
    assert_eq!(contacts.infer_attribute(&bob, ContactAttribute::Organisation), None);

    let groups = contacts.group_by_organisation();
    let unassigned = groups.get(&None).expect("a group without organisation");
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned.iter().next().and_then(Contact::name), Some("Bob"));
}

#[test]
fn component_limit_bounds_the_inference_walk() {
    let chain = vec![
        organisation("X").with(ContactAttribute::Email, "e1@x.org"),
        anonymous().with(ContactAttribute::Email, "e1@x.org").with(ContactAttribute::Tel, "111"),
        anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Name, "Bob"),
    ];
    let bob = chain[2].clone();
    let unbounded = Contacts::new(chain.clone());
    assert_eq!(unbounded.infer_attribute(&bob, ContactAttribute::Organisation).as_deref(), Some("X"));

    let bounded = Contacts::new(chain).with_component_limit(1);
    assert_eq!(bounded.component_limit(), 1);
    assert_eq!(
        bounded.infer_attribute(&bob, ContactAttribute::Organisation),
        None,
        "the walk stops before reaching X"
    );
    assert_eq!(Contacts::default().with_component_limit(0).component_limit(), 1);
}

#[test]
fn a_truncated_walk_adopts_nothing() {
    let carl = anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Name, "Carl");
    let contacts = vec![
        carl.clone(),
        organisation("X").with(ContactAttribute::Tel, "111"),
        organisation("Y").with(ContactAttribute::Tel, "111"),
    ];
    let bounded = Contacts::new(contacts.clone()).with_component_limit(2);
    let partial = bounded.match_attribute(&carl, ContactAttribute::Organisation);
    assert!(!partial.complete, "Y lies beyond the limit");
    assert_eq!(partial.values.len(), 1, "only X was seen before the walk stopped");
    assert_eq!(
        bounded.infer_attribute(&carl, ContactAttribute::Organisation),
        None,
        "a value seen by an unfinished walk is not adopted"
    );
    let groups = bounded.group_by_organisation();
    assert!(groups.get(&None).is_some_and(|g| g.iter().any(|c| c.name() == Some("Carl"))));

    let unbounded = Contacts::new(contacts);
    let full = unbounded.match_attribute(&carl, ContactAttribute::Organisation);
    assert!(full.complete);
    assert_eq!(full.values.len(), 2);
}

#[test]
fn organisation_is_inferred_from_two_parties_sharing_it() {
    let contacts = Contacts::new(vec![
        organisation("X").with(ContactAttribute::Tel, "111"),
        organisation("X").with(ContactAttribute::Email, "e@x.org"),
        anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Email, "e@x.org"),
    ]);
    let c = anonymous().with(ContactAttribute::Tel, "111").with(ContactAttribute::Email, "e@x.org");
    assert_eq!(contacts.infer_attribute(&c, ContactAttribute::Organisation).as_deref(), Some("X"));
    let groups = contacts.group_by_organisation();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups.get(&Some("X".to_string())).map(Contacts::len), Some(3));
}

#[test]
fn merged_roots_link_through_their_children() {
    let fax = "01752 633102";
    let mba = "http://www.mba.ac.uk";
    let contacts = Contacts::new(vec![
        anonymous().with(ContactAttribute::Url, "http://www.dassh.ac.uk").with_role(RoleCode::Custodian.into()),
        anonymous()
            .with(ContactAttribute::Fax, fax)
            .with(ContactAttribute::Url, mba)
            .with_role(RoleCode::Author.into()),
        organisation("Y").with(ContactAttribute::Fax, fax).with_role(RoleCode::Owner.into()),
        organisation("Z").with(ContactAttribute::Url, mba).with_role(RoleCode::Author.into()),
    ]);
    let once = contacts.merge();
    assert_eq!(once.len(), 3, "the fax and url lead to two organisations, so nothing is inferred");
    let unassigned = once.iter().find(|c| c.organisation().is_none()).expect("a root without organisation");
    assert_eq!(unassigned.fax(), Some(fax));
    assert_eq!(unassigned.contacts().len(), 1);
    assert_eq!(unassigned.contacts()[0].url(), Some(mba), "the conflicting url became a child");

    let twice = once.merge();
    assert_eq!(once, twice, "the child's url still links the root to Z");
}

#[test]
fn grouping_leaves_the_collection_unchanged() {
    let contacts = Contacts::new(vec![
        organisation("X").with(ContactAttribute::Email, "e1@x.org"),
        anonymous().with(ContactAttribute::Email, "e1@x.org").with(ContactAttribute::Name, "Bob"),
    ]);
    let before = contacts.clone();
    let groups = contacts.group_by_organisation();
    assert_eq!(groups.len(), 1);
    assert_eq!(contacts, before);
    assert!(
        contacts.iter().any(|c| c.organisation().is_none()),
        "the inferred organisation lives only in the group copies"
    );
}

#[test]
fn duplicates_are_not_inserted() {
    let mut contacts = Contacts::default();
    assert!(contacts.insert(organisation("MBA")));
    assert!(!contacts.insert(organisation("MBA")));
    assert_eq!(contacts.len(), 1);
}

#[test]
fn parties_of_one_organisation_merge_into_a_single_root() {
    let contacts = Contacts::new(vec![
        organisation(MBA).with(ContactAttribute::Tel, "01752 633207").with_role(RoleCode::PointOfContact.into()),
        organisation(MBA).with(ContactAttribute::Email, "sec@mba.ac.uk").with_role(RoleCode::Originator.into()),
    ]);
    let merged = contacts.merge();
    assert_eq!(merged.len(), 1);
    let root = merged.iter().next().expect("root");
    assert_eq!(root.organisation(), Some(MBA));
    assert_eq!(root.tel(), Some("01752 633207"));
    assert_eq!(root.email(), Some("sec@mba.ac.uk"));
    assert_eq!(root.roles().len(), 2, "both roles end up on the root");
    assert!(root.contacts().is_empty(), "nothing is left over for a child");
}

#[test]
fn conflicting_details_become_children() {
    let contacts = Contacts::new(vec![
        organisation("MBA").with(ContactAttribute::Email, "sec@mba.ac.uk").with_role(RoleCode::Custodian.into()),
        organisation("MBA").with(ContactAttribute::Email, "data@mba.ac.uk").with_role(RoleCode::Distributor.into()),
    ]);
    let merged = contacts.merge();
    assert_eq!(merged.len(), 1);
    let root = merged.iter().next().expect("root");
    assert_eq!(root.email(), Some("sec@mba.ac.uk"), "the first value is promoted");
    assert!(root.roles().contains(&Role::from(RoleCode::Custodian)));
    assert_eq!(root.contacts().len(), 1);
    let child = &root.contacts()[0];
    assert_eq!(child.organisation(), None, "the shared organisation moved to the root");
    assert_eq!(child.email(), Some("data@mba.ac.uk"));
    assert!(child.roles().contains(&Role::from(RoleCode::Distributor)));
}

#[test]
fn individuals_of_a_crowded_organisation_keep_their_own_details() {
    let person = |name: &str, email: &str| {
        organisation("MBA")
            .with(ContactAttribute::Name, name)
            .with(ContactAttribute::Email, email)
            .with(ContactAttribute::Address, "Citadel Hill, Plymouth")
    };
    let contacts = Contacts::new(vec![
        organisation("MBA").with(ContactAttribute::Tel, "01752 633207"),
        person("Anne", "anne@mba.ac.uk"),
        person("Ben", "ben@mba.ac.uk"),
        person("Cara", "cara@mba.ac.uk"),
    ]);
    assert_eq!(contacts.number_of_people(), 3);
    let merged = contacts.merge();
    assert_eq!(merged.len(), 1);
    let root = merged.iter().next().expect("root");
    assert_eq!(root.tel(), Some("01752 633207"));
    assert_eq!(root.address(), Some("Citadel Hill, Plymouth"), "the shared address is promoted");
    assert_eq!(root.name(), None, "no individual's name is promoted");
    assert_eq!(root.contacts().len(), 3);
    for child in root.contacts() {
        assert!(child.name().is_some());
        assert!(child.email().is_some());
        assert_eq!(child.address(), None);
        assert_eq!(child.organisation(), None);
    }
}

#[test]
fn merging_is_idempotent() {
    let contacts = Contacts::new(vec![
        organisation(MBA).with(ContactAttribute::Tel, "01752 633207").with_role(RoleCode::PointOfContact.into()),
        organisation(MBA).with(ContactAttribute::Email, "sec@mba.ac.uk").with_role(RoleCode::Originator.into()),
        organisation(MBA)
            .with(ContactAttribute::Name, "Jane")
            .with(ContactAttribute::Email, "jane@mba.ac.uk")
            .with_role(RoleCode::Custodian.into()),
        organisation("DASSH").with(ContactAttribute::Url, "http://www.dassh.ac.uk"),
        anonymous().with(ContactAttribute::Url, "http://www.dassh.ac.uk").with(ContactAttribute::Name, "Dan"),
    ]);
    let once = contacts.merge();
    let twice = once.merge();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

const ORGANISATIONS: [&str; 3] = ["MBA", "DASSH", "Cefas"];

// a small value pool per attribute so random contacts collide often
fn random_contact(rng: &mut StdRng) -> Contact {
    let roles = [RoleCode::Owner, RoleCode::Custodian, RoleCode::Author];
    let mut contact = anonymous();
    for attribute in ContactAttribute::ALL {
        if !rng.gen_bool(0.4) {
            continue;
        }
        let value = match attribute {
            ContactAttribute::Organisation => ORGANISATIONS.choose(rng).map(|o| o.to_string()),
            attribute => Some(format!("{}-{}", attribute, rng.gen_range(0..3))),
        };
        contact.set(attribute, value.as_deref());
    }
    match roles.choose(rng) {
        Some(&role) => contact.with_role(role.into()),
        None => contact,
    }
}

#[test]
fn merging_random_collections_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(19115);
    for case in 0..2000 {
        let size = rng.gen_range(1..=8);
        let contacts: Contacts = (0..size).map(|_| random_contact(&mut rng)).collect();
        let once = contacts.merge();
        let twice = once.merge();
        assert_eq!(once, twice, "case {case} changed on a second merge:\n{contacts}");
    }
}

#[test]
fn merging_nothing_gives_nothing() {
    let merged = Contacts::default().merge();
    assert!(merged.is_empty());
    assert_eq!(merged.to_string(), "");
}

#[test]
fn contact_tree_prints_indented() {
    let mut root = organisation("MBA")
        .with(ContactAttribute::Tel, "01752 633207")
        .with_role(RoleCode::PointOfContact.into())
        .with_role(RoleCode::Originator.into());
    root.add_contact(anonymous().with(ContactAttribute::Name, "Jane"));
    let expected = "Organisation: MBA\n\
                    Tel: 01752 633207\n\
                    Roles: Party who created the resource.\n       \
                    Party who can be contacted for acquiring knowledge about or acquisition of the resource.\n\
                    \n    \
                    Name: Jane";
    assert_eq!(root.to_string(), expected);
}

#[test]
fn contacts_serialize_their_present_attributes() {
    let contact = organisation("MBA").with_role(RoleCode::Owner.into());
    let json = serde_json::to_value(&contact).expect("json");
    assert_eq!(json["organisation"], "MBA");
    assert!(json.get("tel").is_none(), "absent attributes are left out");
    assert_eq!(json["roles"][0]["abbreviation"], "owner");
    assert_eq!(json["contacts"], serde_json::json!([]));
}
