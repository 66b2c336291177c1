//! Consists of sub-modules responsible for crawling the individual sites into our store.

pub mod bitcoinabuse;
pub mod chainabuse;
pub mod walletexplorer;

use anyhow::Error;
use chrono::Utc;
use labelwatch_lib::config::Config;
use labelwatch_lib::database::memory::MemoryStore;
use labelwatch_lib::database::AddressStore;
use labelwatch_lib::database::DatabaseClient;
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Trait providing the entry point for starting a crawler.
pub trait Crawler {
    /// Name used within log and abort messages.
    fn name(&self) -> &'static str;

    /// Starts the crawling process; only returns on unrecoverable errors.
    fn start(&self) -> Result<(), Error>;
}

/// Where crawled data ends up.
pub enum StoreTarget {
    Database,
    Memory(MemoryStore),
}

/// State shared by all crawler threads.
pub struct CrawlContext {
    pub config: Config,
    pub target: StoreTarget,
}

impl CrawlContext {
    pub fn new(config: Config, target: StoreTarget) -> Arc<Self> {
        Arc::new(CrawlContext { config, target })
    }

    /// Runs `f` with a store owned by the calling thread, i.e. database connections are never shared.
    pub fn with_store<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&dyn AddressStore) -> Result<R, Error>,
    {
        match &self.target {
            StoreTarget::Database => {
                let dbc = DatabaseClient::new(&self.config)?;
                f(&dbc)
            }

            StoreTarget::Memory(store) => f(store),
        }
    }
}

/// Sleeps for `duration`, logging when the crawler is going to resume.
pub(crate) fn sleep_logged(crawler: &str, duration: Duration) {
    if duration.is_zero() {
        return;
    }

    let resume_at = Utc::now() + chrono::Duration::seconds(duration.as_secs() as i64);
    info!("[{crawler}] Sleeping {}s, resuming at {}", duration.as_secs(), resume_at.format("%d.%m.%Y %T"));

    std::thread::sleep(duration);
}
