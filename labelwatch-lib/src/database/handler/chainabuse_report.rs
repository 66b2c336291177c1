use crate::database::schema::chainabuse_report;
use crate::database::schema::chainabuse_report::dsl::*;
use crate::database::Upsert;
use crate::error::Error;
use crate::model::ChainabuseReport;
use crate::model::ChainabuseReportInsert;
use chrono::Utc;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use diesel::PgConnection;

pub struct ChainabuseReportHandler<'a> {
    connection: &'a PgConnection,
}

impl<'a> ChainabuseReportHandler<'a> {
    pub fn new(connection: &'a PgConnection) -> Self {
        ChainabuseReportHandler { connection }
    }

    /// Inserts the report or replaces the stored document if the id is already known.
    pub fn upsert(&self, entity_id: &str, entity_report: &serde_json::Value) -> Result<Upsert, Error> {
        let existed = self.get(entity_id)?.is_some();
        let now = Utc::now();

        let entity = ChainabuseReportInsert {
            id: entity_id,
            report: entity_report.clone(),
            added_at: now,
            updated_at: now,
        };

        diesel::insert_into(chainabuse_report::table)
            .values(&entity)
            .on_conflict(id)
            .do_update()
            .set((report.eq(excluded(report)), updated_at.eq(excluded(updated_at))))
            .execute(self.connection)?;

        Ok(match existed {
            true => Upsert::Updated,
            false => Upsert::Inserted,
        })
    }

    pub fn get(&self, entity_id: &str) -> Result<Option<ChainabuseReport>, Error> {
        Ok(chainabuse_report.filter(id.eq(entity_id)).first(self.connection).optional()?)
    }
}
