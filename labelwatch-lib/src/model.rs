//! Structs that are both used by the site clients as well as the Database schema / bindings.

#![allow(clippy::extra_unused_lifetimes)] // Clippy complains about the Insertable proc-macro

use crate::database::schema::*;
use chrono::DateTime;
use chrono::Utc;
use diesel::Insertable;
use diesel::Queryable;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Source tag of labels originating from <https://www.walletexplorer.com/>.
pub const SOURCE_WALLETEXPLORER: &str = "walletExplorer";

/// A label attributing an address to a wallet or service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "src")]
    pub source: String,
}

impl Label {
    pub fn new(name: &str, kind: &str, source: &str) -> Self {
        Label {
            name: name.to_string(),
            kind: kind.to_string(),
            source: source.to_string(),
        }
    }

    pub fn to_insertable<'a>(&'a self, address: &'a str) -> WalletexplorerLabelInsert<'a> {
        WalletexplorerLabelInsert {
            address,
            name: &self.name,
            kind: &self.kind,
            source: &self.source,
            added_at: Utc::now(),
        }
    }
}

/// A single abuse report row, e.g. `2022-11-02 | ransomware | Paid the ransom to this address ...`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub date: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "desc")]
    pub description: String,
}

/// Everything known about one address; the address is the natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRecord {
    pub address: String,
    pub labels: BTreeSet<Label>,
    pub reports: Vec<ReportEntry>,
}

/// Wallet names grouped by their category (`exchanges`, `pools`, `services/others`, ...), both sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletListing {
    pub categories: BTreeMap<String, BTreeSet<String>>,
}

impl WalletListing {
    pub fn wallet_count(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }
}

#[derive(Queryable, Debug)]
pub struct WalletexplorerLabel {
    pub address: String,
    pub name: String,
    pub kind: String,
    pub source: String,
    pub added_at: DateTime<Utc>,
}

impl WalletexplorerLabel {
    pub fn to_label(&self) -> Label {
        Label::new(&self.name, &self.kind, &self.source)
    }
}

#[derive(Insertable)]
#[table_name = "walletexplorer_label"]
pub struct WalletexplorerLabelInsert<'a> {
    pub address: &'a str,
    pub name: &'a str,
    pub kind: &'a str,
    pub source: &'a str,
    pub added_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
pub struct BitcoinabuseAddress {
    pub address: String,
    pub reports: serde_json::Value,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "bitcoinabuse_address"]
pub struct BitcoinabuseAddressInsert<'a> {
    pub address: &'a str,
    pub reports: serde_json::Value,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Debug)]
pub struct ChainabuseReport {
    pub id: String,
    pub report: serde_json::Value,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "chainabuse_report"]
pub struct ChainabuseReportInsert<'a> {
    pub id: &'a str,
    pub report: serde_json::Value,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
