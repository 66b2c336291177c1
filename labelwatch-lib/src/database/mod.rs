//! Persistent storage of crawled addresses.
//!
//! [`AddressStore`] is the seam the crawlers ingest through; [`DatabaseClient`] implements it on top of
//! PostgreSQL whereas [`memory::MemoryStore`] keeps everything in memory (tests, dry runs).

pub mod handler;
pub mod memory;
pub mod schema;

use crate::config::Config;
use crate::database::handler::bitcoinabuse_address::BitcoinabuseAddressHandler;
use crate::database::handler::chainabuse_report::ChainabuseReportHandler;
use crate::database::handler::walletexplorer_label::WalletexplorerLabelHandler;
use crate::error::Error;
use crate::model::Label;
use crate::model::ReportEntry;
use diesel::Connection;
use diesel::PgConnection;

/// Outcome of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Storage operations needed by the crawlers, one document per address (or report id).
pub trait AddressStore {
    /// Set-union merge of `labels` into the address' label set; returns the number of newly added labels.
    fn merge_labels(&self, address: &str, labels: &[Label]) -> Result<usize, Error>;

    /// Replaces the address' reports wholesale with `reports`.
    fn replace_reports(&self, address: &str, reports: &[ReportEntry]) -> Result<Upsert, Error>;

    /// Replaces the stored chainabuse report with the given id.
    fn upsert_chainabuse_report(&self, id: &str, report: &serde_json::Value) -> Result<Upsert, Error>;
}

/// Database client, providing all table handlers.
pub struct DatabaseClient {
    connection: PgConnection,
}

impl DatabaseClient {
    /// Returns a new database client.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(DatabaseClient {
            connection: PgConnection::establish(&config.database_url)?,
        })
    }

    /// Returns a handler for the `bitcoinabuse_address` table.
    pub fn bitcoinabuse_address(&self) -> BitcoinabuseAddressHandler {
        BitcoinabuseAddressHandler::new(&self.connection)
    }

    /// Returns a handler for the `walletexplorer_label` table.
    pub fn walletexplorer_label(&self) -> WalletexplorerLabelHandler {
        WalletexplorerLabelHandler::new(&self.connection)
    }

    /// Returns a handler for the `chainabuse_report` table.
    pub fn chainabuse_report(&self) -> ChainabuseReportHandler {
        ChainabuseReportHandler::new(&self.connection)
    }
}

impl AddressStore for DatabaseClient {
    fn merge_labels(&self, address: &str, labels: &[Label]) -> Result<usize, Error> {
        self.walletexplorer_label().insert(address, labels)
    }

    fn replace_reports(&self, address: &str, reports: &[ReportEntry]) -> Result<Upsert, Error> {
        self.bitcoinabuse_address().replace_reports(address, reports)
    }

    fn upsert_chainabuse_report(&self, id: &str, report: &serde_json::Value) -> Result<Upsert, Error> {
        self.chainabuse_report().upsert(id, report)
    }
}
