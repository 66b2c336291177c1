//! Crawler for <https://www.chainabuse.com/>
//!
//! Reports are requested in creation order, following the cursor of the last received report. Once the end is
//! reached the crawler rests and then asks for reports after the last cursor again, picking up whatever was
//! reported in the meantime. The cursor is kept in memory only, a restart begins with the very first report.

use crate::crawler::sleep_logged;
use crate::crawler::CrawlContext;
use crate::crawler::Crawler;
use anyhow::Error;
use labelwatch_lib::api::chainabuse::ChainabuseClient;
use labelwatch_lib::api::chainabuse::ReportsResponse;
use labelwatch_lib::database::AddressStore;
use labelwatch_lib::ingest;
use labelwatch_lib::ingest::UpsertStats;
use log::info;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

const NAME: &str = "chainabuse";

const THROTTLED_SLEEP: Duration = Duration::from_secs(60 * 60);
const MISSING_REPORTS_SLEEP: Duration = Duration::from_secs(10 * 60);
const UP_TO_DATE_SLEEP: Duration = Duration::from_secs(60 * 60);

pub struct ChainabuseCrawler {
    ctx: Arc<CrawlContext>,
}

impl ChainabuseCrawler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        ChainabuseCrawler { ctx }
    }
}

impl Crawler for ChainabuseCrawler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn start(&self) -> Result<(), Error> {
        let client = ChainabuseClient::new(&self.ctx.config)?;
        let mut state = CrawlState::default();

        self.ctx.with_store(|store| -> Result<(), Error> {
            loop {
                let response = client.reports_after(state.cursor.as_deref())?;
                let pause = state.step(response, store)?;

                sleep_logged(NAME, pause);
            }
        })
    }
}

#[derive(Debug, Default)]
struct CrawlState {
    cursor: Option<String>,
    totals: UpsertStats,
}

impl CrawlState {
    /// Stores the reports of a single response and returns how long to pause before the next request.
    fn step(&mut self, response: ReportsResponse, store: &dyn AddressStore) -> Result<Duration, Error> {
        let page = match response {
            ReportsResponse::Throttled(body) => {
                warn!("[{NAME}] No data after cursor {:?}, throttled; {body}", self.cursor);
                return Ok(THROTTLED_SLEEP);
            }

            ReportsResponse::MissingReports(body) => {
                warn!("[{NAME}] No reports after cursor {:?}; {body}", self.cursor);
                return Ok(MISSING_REPORTS_SLEEP);
            }

            ReportsResponse::Page(page) => page,
        };

        if page.edges.is_empty() {
            info!("[{NAME}] No new reports after cursor {:?}", self.cursor);
            return Ok(UP_TO_DATE_SLEEP);
        }

        let stats = ingest::chainabuse_edges(store, &page.edges)?;
        self.totals.add(&stats);
        info!("[{NAME}] Stored {} reports; {stats:?}, total {:?}", page.edges.len(), self.totals);

        if let Some(end_cursor) = page.end_cursor {
            self.cursor = Some(end_cursor);
        }

        match page.has_next_page {
            true => Ok(Duration::ZERO),
            false => {
                info!("[{NAME}] Up to date at cursor {:?}", self.cursor);
                Ok(UP_TO_DATE_SLEEP)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelwatch_lib::api::chainabuse::ReportsPage;
    use labelwatch_lib::database::memory::MemoryStore;
    use serde_json::json;

    fn page(ids: &[&str], end_cursor: Option<&str>, has_next_page: bool) -> ReportsResponse {
        ReportsResponse::Page(ReportsPage {
            edges: ids.iter().map(|id| json!({ "cursor": format!("cursor-{id}"), "node": { "id": id } })).collect(),
            end_cursor: end_cursor.map(str::to_string),
            has_next_page,
        })
    }

    #[test]
    fn follows_cursor_until_up_to_date() {
        let store = MemoryStore::new();
        let mut state = CrawlState::default();

        assert_eq!(state.step(page(&["r1", "r2"], Some("c2"), true), &store).unwrap(), Duration::ZERO);
        assert_eq!(state.cursor.as_deref(), Some("c2"));

        assert_eq!(state.step(page(&["r2", "r3"], Some("c3"), false), &store).unwrap(), UP_TO_DATE_SLEEP);
        assert_eq!(state.cursor.as_deref(), Some("c3"));

        assert_eq!(state.totals, UpsertStats { inserted: 3, updated: 1, skipped: 0 });
        assert_eq!(store.chainabuse_count(), 3);
    }

    #[test]
    fn keeps_cursor_when_missing() {
        let store = MemoryStore::new();
        let mut state = CrawlState {
            cursor: Some("c9".to_string()),
            ..Default::default()
        };

        assert_eq!(state.step(page(&["r10"], None, false), &store).unwrap(), UP_TO_DATE_SLEEP);
        assert_eq!(state.cursor.as_deref(), Some("c9"));
    }

    #[test]
    fn throttled_and_empty_responses_pause() {
        let store = MemoryStore::new();
        let mut state = CrawlState::default();

        let throttled = ReportsResponse::Throttled(json!({ "errors": [{ "message": "Too Many Requests" }] }));
        assert_eq!(state.step(throttled, &store).unwrap(), THROTTLED_SLEEP);

        let missing = ReportsResponse::MissingReports(json!({ "data": { "reports": null } }));
        assert_eq!(state.step(missing, &store).unwrap(), MISSING_REPORTS_SLEEP);

        assert_eq!(state.step(page(&[], None, false), &store).unwrap(), UP_TO_DATE_SLEEP);

        assert_eq!(state.cursor, None);
        assert_eq!(store.chainabuse_count(), 0);
    }
}
