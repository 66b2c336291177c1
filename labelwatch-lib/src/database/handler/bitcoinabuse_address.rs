use crate::database::schema::bitcoinabuse_address;
use crate::database::schema::bitcoinabuse_address::dsl::*;
use crate::database::Upsert;
use crate::error::Error;
use crate::model::BitcoinabuseAddress;
use crate::model::BitcoinabuseAddressInsert;
use crate::model::ReportEntry;
use chrono::Utc;
use diesel::pg::upsert::excluded;
use diesel::prelude::*;
use diesel::PgConnection;

pub struct BitcoinabuseAddressHandler<'a> {
    connection: &'a PgConnection,
}

impl<'a> BitcoinabuseAddressHandler<'a> {
    pub fn new(connection: &'a PgConnection) -> Self {
        BitcoinabuseAddressHandler { connection }
    }

    /// Inserts the address or, if already present, overwrites its reports with `entries`.
    pub fn replace_reports(&self, entity_address: &str, entries: &[ReportEntry]) -> Result<Upsert, Error> {
        let existed = self.get(entity_address)?.is_some();
        let now = Utc::now();

        let entity = BitcoinabuseAddressInsert {
            address: entity_address,
            reports: serde_json::to_value(entries)?,
            added_at: now,
            updated_at: now,
        };

        diesel::insert_into(bitcoinabuse_address::table)
            .values(&entity)
            .on_conflict(address)
            .do_update()
            .set((reports.eq(excluded(reports)), updated_at.eq(excluded(updated_at))))
            .execute(self.connection)?;

        Ok(match existed {
            true => Upsert::Updated,
            false => Upsert::Inserted,
        })
    }

    pub fn get(&self, entity_address: &str) -> Result<Option<BitcoinabuseAddress>, Error> {
        Ok(bitcoinabuse_address.filter(address.eq(entity_address)).first(self.connection).optional()?)
    }

    pub fn get_reports(&self, entity_address: &str) -> Result<Option<Vec<ReportEntry>>, Error> {
        match self.get(entity_address)? {
            Some(row) => Ok(Some(serde_json::from_value(row.reports)?)),
            None => Ok(None),
        }
    }
}
