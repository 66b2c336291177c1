//! Client for <https://www.bitcoinabuse.com/>
//!
//! The site has no API we could use without a token, hence both the report listing
//! (`/reports?page=N`, 100 addresses per page) and the per-address detail pages (`/reports/{address}?page=N`,
//! 10 reports per page) are scraped from their HTML.

use crate::api::page::Paginator;
use crate::config::Config;
use crate::error::Error;
use crate::model::ReportEntry;
use crate::parser;
use std::time::Duration;

use super::GenericResponseHandler;
use super::RequestHandler;

pub const BITCOINABUSE_BASE_URL: &str = "https://www.bitcoinabuse.com";

/// Number of addresses on a full report listing page.
pub const REPORTS_PAGE_SIZE: usize = 100;

/// Number of reports on a full address detail page.
pub const DETAIL_PAGE_SIZE: usize = 10;

pub struct BitcoinabuseClient {
    request_handler: RequestHandler,
    base_url: String,
}

/// One page of the report listing.
#[derive(Debug)]
pub struct ReportsPage {
    /// Reported addresses in listing order.
    pub addresses: Vec<String>,

    /// Highest page number linked from this page, i.e. the current size of the listing.
    pub max_page: usize,
}

impl BitcoinabuseClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        BitcoinabuseClient::with_base_url(config, BITCOINABUSE_BASE_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self, Error> {
        Ok(BitcoinabuseClient {
            request_handler: RequestHandler::new(config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the addresses listed on the given page of the report listing.
    pub fn reports_page(&self, page: usize) -> Result<ReportsPage, Error> {
        let url = format!("{}/reports?page={page}", self.base_url);
        let content = self.request_handler.execute::<GenericResponseHandler>(&url)?;

        Ok(ReportsPage {
            addresses: parser::report_addresses(&content),
            max_page: parser::max_page(&content),
        })
    }

    /// Returns all reports filed against an address, walking its detail pages until a page is not full.
    pub fn address_reports(&self, address: &str) -> Result<Vec<ReportEntry>, Error> {
        Paginator::new(DETAIL_PAGE_SIZE, Duration::ZERO).collect(|page| {
            let url = format!("{}/reports/{address}?page={page}", self.base_url);
            let content = self.request_handler.execute::<GenericResponseHandler>(&url)?;

            Ok(parser::report_entries(&content))
        })
    }
}
