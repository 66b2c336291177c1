//! Crawler for <https://www.bitcoinabuse.com/>
//!
//! Two threads connected by a zero-capacity channel: the listing thread walks `/reports?page=N` and hands every
//! reported address to the detail loader, which fetches all reports of that address and replaces the stored ones.
//! Since the channel has no buffer the listing thread blocks whenever the loader is busy, throttling the crawl to
//! the speed of the detail pages.
//!
//! With `--init` the whole listing is walked once first. Afterwards only the pages that appeared since the last
//! pass are visited, see [`DailySchedule`].

use crate::crawler::sleep_logged;
use crate::crawler::CrawlContext;
use crate::crawler::Crawler;
use anyhow::Error;
use labelwatch_lib::api::bitcoinabuse::BitcoinabuseClient;
use labelwatch_lib::api::bitcoinabuse::ReportsPage;
use labelwatch_lib::api::bitcoinabuse::REPORTS_PAGE_SIZE;
use labelwatch_lib::api::page::Paginator;
use labelwatch_lib::cache::dedup_cache;
use labelwatch_lib::cache::DedupCache;
use labelwatch_lib::database::AddressStore;
use labelwatch_lib::error::Error as LibError;
use labelwatch_lib::ingest;
use labelwatch_lib::ingest::UpsertStats;
use labelwatch_lib::model::ReportEntry;
use log::debug;
use log::info;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::time::Duration;

const NAME: &str = "bitcoinabuse";

const BACKFILL_PAGE_PACE: Duration = Duration::from_secs(5);
const STEADY_PAGE_PACE: Duration = Duration::from_secs(10);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const DEDUP_TTL: Duration = Duration::from_secs(12 * 60 * 60);

pub struct BitcoinabuseCrawler {
    ctx: Arc<CrawlContext>,
    init: bool,
}

impl BitcoinabuseCrawler {
    pub fn new(ctx: Arc<CrawlContext>, init: bool) -> Self {
        BitcoinabuseCrawler { ctx, init }
    }

    fn produce(&self, tx: &SyncSender<String>) -> Result<(), Error> {
        let client = BitcoinabuseClient::new(&self.ctx.config)?;

        let mut schedule = DailySchedule::new(1);
        if self.init {
            info!("[{NAME}] Backfilling the complete report listing");
            let max_page = backfill(|page| client.reports_page(page), tx, BACKFILL_PAGE_PACE)?;
            schedule = DailySchedule::new(max_page);
        }

        loop {
            let page = schedule.page();
            let listing = client.reports_page(page)?;
            info!("[{NAME}] page {page}: {}", listing.addresses.len());

            let max_page = listing.max_page;
            send_all(tx, listing.addresses)?;

            match schedule.after_page(max_page) {
                Step::Continue => std::thread::sleep(STEADY_PAGE_PACE),
                Step::DayDone => sleep_logged(NAME, DAY),
            }
        }
    }
}

impl Crawler for BitcoinabuseCrawler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self) -> Result<(), Error> {
        let (tx, rx) = std::sync::mpsc::sync_channel::<String>(0);

        let ctx = Arc::clone(&self.ctx);
        let loader = std::thread::spawn(move || -> Result<UpsertStats, Error> {
            let client = BitcoinabuseClient::new(&ctx.config)?;
            let cache = dedup_cache(DEDUP_TTL);

            ctx.with_store(|store| load_details(store, &rx, &cache, |address| Ok(client.address_reports(address)?)))
        });

        let produced = self.produce(&tx);
        drop(tx);

        // A failing loader surfaces as a disconnected channel within the producer, hence prefer its error
        match loader.join() {
            Ok(Ok(stats)) => info!("[{NAME}] Detail loader finished; {stats:?}"),
            Ok(Err(why)) => return Err(why),
            Err(_) => anyhow::bail!("[{NAME}] Detail loader panicked"),
        }

        produced
    }
}

/// Tracks which listing page to visit next once the backfill is done.
///
/// New reports are prepended to the listing, so every day the number of pages grows by
/// `today_max_page - yesterday_max_page`. Exactly these pages plus the first one are visited before the baseline
/// is moved to today's value and the crawler rests for a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    page: usize,
    yesterday_max_page: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    DayDone,
}

impl DailySchedule {
    pub fn new(yesterday_max_page: usize) -> Self {
        DailySchedule {
            page: 1,
            yesterday_max_page,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Decides what follows the current page given the max page found on it.
    pub fn after_page(&mut self, today_max_page: usize) -> Step {
        if self.page <= today_max_page.saturating_sub(self.yesterday_max_page) {
            self.page += 1;
            return Step::Continue;
        }

        // A page without any page links tells us nothing about today's listing size
        if today_max_page > 0 {
            self.yesterday_max_page = today_max_page;
        }

        self.page = 1;
        Step::DayDone
    }
}

/// Walks all listing pages sending their addresses to the loader, returning the highest page number seen.
fn backfill<F>(mut fetch: F, tx: &SyncSender<String>, pace: Duration) -> Result<usize, Error>
where
    F: FnMut(usize) -> Result<ReportsPage, LibError>,
{
    let mut max_page = 0;

    let cursor = Paginator::new(REPORTS_PAGE_SIZE, pace).walk(
        |page| {
            let listing = fetch(page)?;
            info!("[{NAME}] page {page}: {}", listing.addresses.len());

            max_page = max_page.max(listing.max_page);
            Ok(listing.addresses)
        },
        |addresses| send_all(tx, addresses),
    )?;

    info!("[{NAME}] Backfill done after {} pages", cursor.fetched());
    Ok(max_page)
}

fn send_all(tx: &SyncSender<String>, addresses: Vec<String>) -> Result<(), LibError> {
    for address in addresses {
        tx.send(address).map_err(|_| LibError::CrawlerChannelDisconnected)?;
    }

    Ok(())
}

/// Fetches and stores the reports of every address received until the sending side hangs up.
///
/// Addresses processed within the last [`DEDUP_TTL`] are skipped; this only saves requests, the stored reports
/// would be the same.
fn load_details<F>(
    store: &dyn AddressStore,
    rx: &Receiver<String>,
    cache: &DedupCache,
    mut fetch: F,
) -> Result<UpsertStats, Error>
where
    F: FnMut(&str) -> Result<Vec<ReportEntry>, Error>,
{
    let mut stats = UpsertStats::default();

    for address in rx.iter() {
        if cache.contains_key(&address) {
            debug!("[{NAME}] pass {address}");
            stats.skipped += 1;
            continue;
        }

        info!("[{NAME}] checking {address}");
        let reports = fetch(&address)?;
        stats.record(ingest::address_reports(store, &address, &reports)?);

        cache.insert(address, ());
    }

    Ok(stats)
}
