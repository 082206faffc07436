// used for the resolver databases
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;
use crate::spatial::{AreaId, AreaResolver, SpatialReference, SpatialReferenceResolver};
use crate::vocab::{Concept, VocabularyResolver};

/// SQLite backed vocabulary, area and reference system lookups.
///
/// Statements are prepared through the connection's statement cache so that
/// lookups only need a shared borrow of the persistor.
pub struct Persistor<'db> {
    pub db: &'db Connection,
}

impl<'db> Persistor<'db> {
    pub fn new(connection: &'db Connection) -> Result<Persistor<'db>> {
        let persistor = Persistor { db: connection };
        persistor.create_schema()?;
        Ok(persistor)
    }
    pub fn create_schema(&self) -> Result<()> {
        self.db.execute_batch(
            "
            create table if not exists concepts (
                collection text not null,
                pref_label text not null,
                definition text not null,
                constraint unique_concept primary key (
                    collection,
                    pref_label
                )
            );
            create table if not exists areas (
                id text not null,
                name text not null,
                type text not null,
                constraint referenceable_area primary key (
                    id
                )
            );
            create table if not exists reference_systems (
                identifier text not null,
                name text null,
                type text null,
                scope text null,
                constraint referenceable_reference_system primary key (
                    identifier
                )
            );
            ",
        )?;
        Ok(())
    }
    pub fn add_concept(&self, collection: &str, concept: &Concept) -> Result<()> {
        self.db
            .prepare_cached(
                "
                insert or replace into concepts (
                    collection,
                    pref_label,
                    definition
                ) values (?, ?, ?)
            ",
            )?
            .execute(params![collection, concept.pref_label, concept.definition])?;
        Ok(())
    }
    pub fn add_area(&self, id: &str, name: &str, class: &str) -> Result<()> {
        self.db
            .prepare_cached(
                "
                insert or replace into areas (
                    id,
                    name,
                    type
                ) values (?, ?, ?)
            ",
            )?
            .execute(params![id, name, class])?;
        Ok(())
    }
    pub fn add_reference_system(&self, system: &SpatialReference) -> Result<()> {
        self.db
            .prepare_cached(
                "
                insert or replace into reference_systems (
                    identifier,
                    name,
                    type,
                    scope
                ) values (?, ?, ?, ?)
            ",
            )?
            .execute(params![system.identifier, system.name, system.kind, system.scope])?;
        Ok(())
    }
}

impl VocabularyResolver for Persistor<'_> {
    fn lookup(&self, term: &str, collection: &str) -> Result<Option<Concept>> {
        let concept = self
            .db
            .prepare_cached(
                "
                select pref_label, definition
                    from concepts
                    where collection = ?
                    and lower(pref_label) = lower(?)
            ",
            )?
            .query_row(params![collection, term.trim()], |row| {
                Ok(Concept { pref_label: row.get(0)?, definition: row.get(1)? })
            })
            .optional()?;
        debug!(term, collection, found = concept.is_some(), "concept lookup");
        Ok(concept)
    }
}

impl AreaResolver for Persistor<'_> {
    fn get_area_id(&self, name: &str, class: &str) -> Result<Option<AreaId>> {
        Ok(self
            .db
            .prepare_cached(
                "
                select id
                    from areas
                    where type = ?
                    and name like '%' || ? || '%'
                    order by length(name), name
                    limit 1
            ",
            )?
            .query_row(params![class, name.trim()], |row| row.get(0))
            .optional()?)
    }
    fn get_area_name(&self, id: &str) -> Result<Option<String>> {
        Ok(self
            .db
            .prepare_cached(
                "
                select name
                    from areas
                    where id = ?
            ",
            )?
            .query_row(params![id], |row| row.get(0))
            .optional()?)
    }
}

impl SpatialReferenceResolver for Persistor<'_> {
    fn resolve(&self, code: &str) -> Result<Option<SpatialReference>> {
        Ok(self
            .db
            .prepare_cached(
                "
                select identifier, name, type, scope
                    from reference_systems
                    where identifier = ?
            ",
            )?
            .query_row(params![code.trim()], |row| {
                Ok(SpatialReference {
                    identifier: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                    scope: row.get(3)?,
                })
            })
            .optional()?)
    }
}
