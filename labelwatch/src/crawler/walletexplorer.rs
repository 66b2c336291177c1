//! Crawler for <https://www.walletexplorer.com/>
//!
//! Every [`PASS_INTERVAL`] the wallet index is fetched and each listed wallet's addresses are labeled with the
//! wallet name and its category. Wallets are visited sequentially in sorted order; labels are merged, so a pass
//! never removes labels added by an earlier one.

use crate::crawler::sleep_logged;
use crate::crawler::CrawlContext;
use crate::crawler::Crawler;
use anyhow::Error;
use labelwatch_lib::api::walletexplorer::WalletexplorerClient;
use labelwatch_lib::database::AddressStore;
use labelwatch_lib::ingest;
use labelwatch_lib::model::WalletListing;
use log::info;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

const NAME: &str = "walletexplorer";

const PASS_INTERVAL: Duration = Duration::from_secs(8 * 60 * 60);

pub struct WalletexplorerCrawler {
    ctx: Arc<CrawlContext>,
}

/// Totals of a single pass over the wallet index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub wallets: usize,
    pub empty_wallets: usize,
    pub addresses: usize,
    pub new_labels: usize,
}

impl WalletexplorerCrawler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        WalletexplorerCrawler { ctx }
    }
}

impl Crawler for WalletexplorerCrawler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self) -> Result<(), Error> {
        let client = WalletexplorerClient::new(&self.ctx.config)?;

        self.ctx.with_store(|store| -> Result<(), Error> {
            loop {
                let started = Instant::now();

                let listing = client.wallet_listing()?;
                info!("[{NAME}] Found {} wallets in {} categories", listing.wallet_count(), listing.categories.len());

                let summary = crawl_listing(&listing, store, |wallet| Ok(client.wallet_addresses(wallet)?))?;
                info!("[{NAME}] Pass done; {summary:?}");

                sleep_logged(NAME, PASS_INTERVAL.saturating_sub(started.elapsed()));
            }
        })
    }
}

/// Fetches and labels the addresses of every wallet within `listing`.
fn crawl_listing<F>(listing: &WalletListing, store: &dyn AddressStore, mut fetch: F) -> Result<PassSummary, Error>
where
    F: FnMut(&str) -> Result<Vec<String>, Error>,
{
    let mut summary = PassSummary::default();

    for (category, wallets) in &listing.categories {
        for wallet in wallets {
            if wallet.is_empty() {
                continue;
            }

            let addresses = fetch(wallet)?;
            summary.wallets += 1;

            if addresses.is_empty() {
                warn!("[{NAME}] Wallet {wallet} ({category}) has no addresses, skipping");
                summary.empty_wallets += 1;
                continue;
            }

            let new_labels = ingest::wallet_addresses(store, category, wallet, &addresses)?;
            info!("[{NAME}] {category}/{wallet}: {} addresses, {new_labels} new labels", addresses.len());

            summary.addresses += addresses.len();
            summary.new_labels += new_labels;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelwatch_lib::database::memory::MemoryStore;
    use labelwatch_lib::model::Label;
    use labelwatch_lib::model::SOURCE_WALLETEXPLORER;
    use std::collections::BTreeSet;

    fn listing() -> WalletListing {
        let mut listing = WalletListing::default();
        listing.categories.insert(
            "exchanges".to_string(),
            BTreeSet::from(["Bitstamp.net".to_string(), "Kraken.com".to_string(), String::new()]),
        );
        listing
            .categories
            .insert("pools".to_string(), BTreeSet::from(["SlushPool.com".to_string()]));

        listing
    }

    fn addresses_of(wallet: &str) -> Vec<String> {
        match wallet {
            "Bitstamp.net" => vec!["1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string(), "3Kzh9qAqVWQhEsfQz7zEQL1EuSx5tyNLNS".to_string()],
            "SlushPool.com" => vec!["1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string()],
            _ => Vec::new(),
        }
    }

    #[test]
    fn wallets_visited_in_sorted_order() {
        let store = MemoryStore::new();
        let mut visited = Vec::new();

        let summary = crawl_listing(&listing(), &store, |wallet| {
            visited.push(wallet.to_string());
            Ok(addresses_of(wallet))
        })
        .unwrap();

        assert_eq!(visited, vec!["Bitstamp.net", "Kraken.com", "SlushPool.com"]);
        assert_eq!(
            summary,
            PassSummary {
                wallets: 3,
                empty_wallets: 1,
                addresses: 3,
                new_labels: 3,
            }
        );

        let record = store.record("1BoatSLRHtKNngkdXEeobR76b53LETtpyT").unwrap();
        assert_eq!(
            record.labels,
            BTreeSet::from([
                Label::new("Bitstamp.net", "exchanges", SOURCE_WALLETEXPLORER),
                Label::new("SlushPool.com", "pools", SOURCE_WALLETEXPLORER),
            ])
        );
    }

    #[test]
    fn second_pass_adds_no_labels() {
        let store = MemoryStore::new();

        crawl_listing(&listing(), &store, |wallet| Ok(addresses_of(wallet))).unwrap();
        let summary = crawl_listing(&listing(), &store, |wallet| Ok(addresses_of(wallet))).unwrap();

        assert_eq!(summary.new_labels, 0);
        assert_eq!(summary.addresses, 3);
        assert_eq!(store.address_count(), 2);
    }

    #[test]
    fn fetch_errors_abort_the_pass() {
        let store = MemoryStore::new();
        let result = crawl_listing(&listing(), &store, |_| anyhow::bail!("Failed to parse wallet page"));

        assert!(result.is_err());
        assert_eq!(store.address_count(), 0);
    }
}
