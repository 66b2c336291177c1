//! Upserts crawled data into an [`AddressStore`].
//!
//! The collections deliberately differ in their merge semantics:
//! - WalletExplorer labels are merged as a set, revisiting a wallet never removes or duplicates labels.
//! - Bitcoinabuse reports are replaced wholesale, the detail pages always contain the full history anyway.
//! - Chainabuse reports are replaced as a whole document keyed by the report id.

use crate::api::chainabuse::report_id;
use crate::database::AddressStore;
use crate::database::Upsert;
use crate::error::Error;
use crate::model::Label;
use crate::model::ReportEntry;
use crate::model::SOURCE_WALLETEXPLORER;
use log::warn;

/// Running counters of upsert outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl UpsertStats {
    pub fn record(&mut self, upsert: Upsert) {
        match upsert {
            Upsert::Inserted => self.inserted += 1,
            Upsert::Updated => self.updated += 1,
        }
    }

    pub fn add(&mut self, other: &UpsertStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.skipped += other.skipped;
    }
}

/// Labels every address with the wallet it belongs to. Returns the number of newly added labels.
pub fn wallet_addresses(
    store: &dyn AddressStore,
    category: &str,
    wallet_name: &str,
    addresses: &[String],
) -> Result<usize, Error> {
    let labels = [Label::new(wallet_name, category, SOURCE_WALLETEXPLORER)];
    let mut added = 0;

    for address in addresses {
        added += store.merge_labels(address, &labels)?;
    }

    Ok(added)
}

pub fn address_reports(store: &dyn AddressStore, address: &str, reports: &[ReportEntry]) -> Result<Upsert, Error> {
    store.replace_reports(address, reports)
}

/// Upserts all Chainabuse report edges, skipping (and logging) edges without a report id.
pub fn chainabuse_edges(store: &dyn AddressStore, edges: &[serde_json::Value]) -> Result<UpsertStats, Error> {
    let mut stats = UpsertStats::default();

    for edge in edges {
        match report_id(edge) {
            Some(id) => stats.record(store.upsert_chainabuse_report(id, edge)?),
            None => {
                warn!("Skipping Chainabuse report without id; {edge}");
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use serde_json::json;

    const ADDRESS: &str = "1BoatSLRHtKNngkdXEeobR76b53LETtpyT";

    fn report(date: &str, kind: &str) -> ReportEntry {
        ReportEntry {
            date: date.to_string(),
            kind: kind.to_string(),
            description: format!("{kind} reported on {date}"),
        }
    }

    #[test]
    fn labels_are_merged_without_duplicates() {
        let store = MemoryStore::new();
        let addresses = vec![ADDRESS.to_string()];

        assert_eq!(wallet_addresses(&store, "exchanges", "Bitstamp.net", &addresses).unwrap(), 1);
        assert_eq!(wallet_addresses(&store, "exchanges", "Bitstamp.net", &addresses).unwrap(), 0);
        assert_eq!(wallet_addresses(&store, "services/others", "Bitstamp.net", &addresses).unwrap(), 1);

        let record = store.record(ADDRESS).unwrap();
        assert_eq!(record.labels.len(), 2);
        assert!(record.labels.contains(&Label::new("Bitstamp.net", "exchanges", SOURCE_WALLETEXPLORER)));
        assert!(record.labels.contains(&Label::new("Bitstamp.net", "services/others", SOURCE_WALLETEXPLORER)));
    }

    #[test]
    fn reports_are_replaced() {
        let store = MemoryStore::new();
        let first = vec![report("2022-01-01", "ransomware"), report("2022-01-02", "sextortion")];
        let second = vec![report("2023-05-05", "darknet market")];

        assert_eq!(address_reports(&store, ADDRESS, &first).unwrap(), Upsert::Inserted);
        assert_eq!(address_reports(&store, ADDRESS, &second).unwrap(), Upsert::Updated);

        assert_eq!(store.record(ADDRESS).unwrap().reports, second);
        assert_eq!(store.address_count(), 1);
    }

    #[test]
    fn chainabuse_edges_keyed_by_report_id() {
        let store = MemoryStore::new();
        let edges = vec![
            json!({ "cursor": "c1", "node": { "id": "r1", "scamCategory": "PHISHING" } }),
            json!({ "cursor": "c2", "node": { "scamCategory": "OTHER" } }),
            json!({ "cursor": "c3", "node": { "id": "r2" } }),
        ];

        let stats = chainabuse_edges(&store, &edges).unwrap();
        assert_eq!(stats, UpsertStats { inserted: 2, updated: 0, skipped: 1 });

        let revisited = vec![json!({ "cursor": "c1", "node": { "id": "r1", "scamCategory": "RANSOMWARE" } })];
        let stats = chainabuse_edges(&store, &revisited).unwrap();
        assert_eq!(stats.updated, 1);

        assert_eq!(store.chainabuse_count(), 2);
        assert_eq!(store.chainabuse_report("r1").unwrap()["node"]["scamCategory"], "RANSOMWARE");
    }
}
