//! Client for <https://www.walletexplorer.com/>
//!
//! The index page lists all known wallets (exchanges, pools, services, gambling, ...) while
//! `/wallet/{name}/addresses?page=N` lists 100 addresses of a single wallet per page. WalletExplorer throttles
//! aggressively and signals it within the page body rather than with a status code, see
//! [`super::WalletExplorerResponseHandler`].

use crate::api::page::Paginator;
use crate::config::Config;
use crate::error::Error;
use crate::model::WalletListing;
use crate::parser;
use std::time::Duration;

use super::RequestHandler;
use super::WalletExplorerResponseHandler;

pub const WALLETEXPLORER_BASE_URL: &str = "https://www.walletexplorer.com";

/// Number of addresses on a full wallet address page.
pub const ADDRESSES_PAGE_SIZE: usize = 100;

pub struct WalletexplorerClient {
    request_handler: RequestHandler,
    base_url: String,
}

impl WalletexplorerClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        WalletexplorerClient::with_base_url(config, WALLETEXPLORER_BASE_URL)
    }

    pub fn with_base_url(config: &Config, base_url: &str) -> Result<Self, Error> {
        Ok(WalletexplorerClient {
            request_handler: RequestHandler::new(config)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns all wallets listed on the index page grouped by category.
    pub fn wallet_listing(&self) -> Result<WalletListing, Error> {
        let url = format!("{}/", self.base_url);
        let content = self.request_handler.execute::<WalletExplorerResponseHandler>(&url)?;

        Ok(parser::wallet_listing(&content))
    }

    /// Returns all addresses attributed to a wallet.
    pub fn wallet_addresses(&self, wallet_name: &str) -> Result<Vec<String>, Error> {
        // Blank rows still count towards a full page, hence they are dropped only once all pages are fetched
        let rows = Paginator::new(ADDRESSES_PAGE_SIZE, Duration::ZERO).collect(|page| {
            let url = format!("{}/wallet/{wallet_name}/addresses?page={page}", self.base_url);
            let content = self.request_handler.execute::<WalletExplorerResponseHandler>(&url)?;

            Ok(parser::wallet_addresses(&content))
        })?;

        Ok(rows.into_iter().filter(|address| !address.is_empty()).collect())
    }
}
