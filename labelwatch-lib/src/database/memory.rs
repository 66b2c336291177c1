//! In-memory [`AddressStore`], mirroring the upsert semantics of the PostgreSQL tables.

use crate::database::AddressStore;
use crate::database::Upsert;
use crate::error::Error;
use crate::model::AddressRecord;
use crate::model::Label;
use crate::model::ReportEntry;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

#[derive(Default)]
pub struct MemoryStore {
    labels: Mutex<HashMap<String, BTreeSet<Label>>>,
    reports: Mutex<HashMap<String, Vec<ReportEntry>>>,
    chainabuse: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of distinct addresses holding labels, reports or both.
    pub fn address_count(&self) -> usize {
        let labels = lock(&self.labels);
        let reports = lock(&self.reports);

        labels.len() + reports.keys().filter(|address| !labels.contains_key(*address)).count()
    }

    pub fn chainabuse_report(&self, id: &str) -> Option<serde_json::Value> {
        lock(&self.chainabuse).get(id).cloned()
    }

    pub fn chainabuse_count(&self) -> usize {
        lock(&self.chainabuse).len()
    }

    /// Returns labels and reports known for the address, `None` if neither exist.
    pub fn record(&self, address: &str) -> Option<AddressRecord> {
        let labels = lock(&self.labels).get(address).cloned();
        let reports = lock(&self.reports).get(address).cloned();

        if labels.is_none() && reports.is_none() {
            return None;
        }

        Some(AddressRecord {
            address: address.to_string(),
            labels: labels.unwrap_or_default(),
            reports: reports.unwrap_or_default(),
        })
    }
}

// A poisoned lock only means another thread panicked mid-upsert; each upsert leaves the map consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AddressStore for MemoryStore {
    fn merge_labels(&self, address: &str, labels: &[Label]) -> Result<usize, Error> {
        if labels.is_empty() {
            return Ok(0);
        }

        let mut stored = lock(&self.labels);
        let set = stored.entry(address.to_string()).or_default();

        Ok(labels.iter().filter(|label| set.insert((*label).clone())).count())
    }

    fn replace_reports(&self, address: &str, reports: &[ReportEntry]) -> Result<Upsert, Error> {
        match lock(&self.reports).insert(address.to_string(), reports.to_vec()) {
            Some(_) => Ok(Upsert::Updated),
            None => Ok(Upsert::Inserted),
        }
    }

    fn upsert_chainabuse_report(&self, id: &str, report: &serde_json::Value) -> Result<Upsert, Error> {
        match lock(&self.chainabuse).insert(id.to_string(), report.clone()) {
            Some(_) => Ok(Upsert::Updated),
            None => Ok(Upsert::Inserted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SOURCE_WALLETEXPLORER;

    #[test]
    fn labels_and_reports_are_tracked_separately() {
        let store = MemoryStore::new();
        let address = "1BoatSLRHtKNngkdXEeobR76b53LETtpyT";

        store.merge_labels(address, &[Label::new("Bitstamp.net", "exchanges", SOURCE_WALLETEXPLORER)]).unwrap();
        assert_eq!(store.replace_reports(address, &[]).unwrap(), Upsert::Inserted);
        assert_eq!(store.replace_reports(address, &[]).unwrap(), Upsert::Updated);

        assert_eq!(store.address_count(), 1);
        assert_eq!(store.record(address).unwrap().labels.len(), 1);
        assert!(store.record("bc1qunknown").is_none());
    }

    #[test]
    fn merging_no_labels_creates_nothing() {
        let store = MemoryStore::new();

        assert_eq!(store.merge_labels("1BoatSLRHtKNngkdXEeobR76b53LETtpyT", &[]).unwrap(), 0);
        assert_eq!(store.address_count(), 0);
        assert!(store.record("1BoatSLRHtKNngkdXEeobR76b53LETtpyT").is_none());
    }
}
