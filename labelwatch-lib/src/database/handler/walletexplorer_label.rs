use crate::database::schema::walletexplorer_label;
use crate::database::schema::walletexplorer_label::dsl::*;
use crate::error::Error;
use crate::model::Label;
use crate::model::WalletexplorerLabel;
use crate::model::WalletexplorerLabelInsert;
use diesel::prelude::*;
use diesel::PgConnection;

pub struct WalletexplorerLabelHandler<'a> {
    connection: &'a PgConnection,
}

impl<'a> WalletexplorerLabelHandler<'a> {
    pub fn new(connection: &'a PgConnection) -> Self {
        WalletexplorerLabelHandler { connection }
    }

    /// Adds all labels to the address, skipping those already present. Returns the number of new labels.
    pub fn insert(&self, entity_address: &str, labels: &[Label]) -> Result<usize, Error> {
        if labels.is_empty() {
            return Ok(0);
        }

        let entities: Vec<WalletexplorerLabelInsert> =
            labels.iter().map(|label| label.to_insertable(entity_address)).collect();

        Ok(diesel::insert_into(walletexplorer_label::table)
            .values(&entities)
            .on_conflict_do_nothing()
            .execute(self.connection)?)
    }

    pub fn get(&self, entity_address: &str) -> Result<Vec<Label>, Error> {
        let rows: Vec<WalletexplorerLabel> =
            walletexplorer_label.filter(address.eq(entity_address)).get_results(self.connection)?;

        Ok(rows.iter().map(WalletexplorerLabel::to_label).collect())
    }
}
