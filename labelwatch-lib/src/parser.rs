//! Extractors turning the HTML pages of <https://www.bitcoinabuse.com/> and <https://www.walletexplorer.com/>
//! into addresses, report rows and wallet names.
//!
//! All functions are pure and never fail: markup which does not have the expected structure simply yields
//! an empty result, such that a redesigned page cannot crash a running crawler.

use crate::model::ReportEntry;
use crate::model::WalletListing;
use lazy_static::lazy_static;
use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::Name;
use select::predicate::Predicate;

lazy_static! {
    /// Links to a detail page within the report listing, e.g. `<a href="/reports/1C2ek9b57xdVY9rPUaUnczxN5vGjVS8EhA">`
    static ref REGEX_REPORT_LINK: Regex = Regex::new(r#"href="/reports/(\w{8,}?)">"#).unwrap();

    /// Pagination links, e.g. `<a class="page-link" href="https://www.bitcoinabuse.com/reports?page=2">`
    static ref REGEX_PAGE_LINK: Regex = Regex::new(r#"page=([0-9]+)""#).unwrap();

    /// Wallet links on the index page, e.g. `<a href="/wallet/Bitstamp.net">`
    static ref REGEX_WALLET_LINK: Regex = Regex::new(r#"/wallet/([\w.-]+)$"#).unwrap();
}

/// Number of table cells forming one [`ReportEntry`] (date, type, description).
const REPORT_ENTRY_CELLS: usize = 3;

/// Returns all reported addresses linked from a report listing page, in document order.
pub fn report_addresses(content: &str) -> Vec<String> {
    REGEX_REPORT_LINK.captures_iter(content).map(|captures| captures[1].to_string()).collect()
}

/// Returns the highest page number linked from a listing page, 0 if there is no pagination at all.
pub fn max_page(content: &str) -> usize {
    REGEX_PAGE_LINK
        .captures_iter(content)
        .filter_map(|captures| captures[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

/// Returns the report rows of an address detail page.
///
/// The rows live in the table of the second `<div>` within `<body><div><main>`; every three consecutive cells
/// form one entry and a trailing incomplete entry is dropped.
pub fn report_entries(content: &str) -> Vec<ReportEntry> {
    let document = Document::from(content);
    let mut cells = Vec::new();

    for main in document.find(Name("body").child(Name("div")).child(Name("main"))) {
        let section = match main.children().filter(|child| child.is(Name("div"))).nth(1) {
            Some(section) => section,
            None => continue,
        };

        for table in section.children().filter(|child| child.is(Name("table"))) {
            cells.extend(table.find(Name("tbody").child(Name("tr")).child(Name("td"))).map(|cell| cell_text(&cell)));
        }
    }

    group_report_cells(cells)
}

fn group_report_cells(cells: Vec<String>) -> Vec<ReportEntry> {
    cells
        .chunks_exact(REPORT_ENTRY_CELLS)
        .map(|chunk| ReportEntry {
            date: chunk[0].clone(),
            kind: chunk[1].clone(),
            description: chunk[2].clone(),
        })
        .collect()
}

/// Returns the first column of every row of a wallet's address page, one entry per row.
///
/// Rows with a blank first cell yield an empty string rather than being skipped, since the number of rows is
/// what tells a full page from the last one; callers drop the empty entries afterwards.
pub fn wallet_addresses(content: &str) -> Vec<String> {
    let document = Document::from(content);

    document
        .find(Name("table").descendant(Name("tr")))
        .filter_map(|row| row.children().find(|child| child.is(Name("td"))))
        .map(|cell| cell_text(&cell))
        .collect()
}

/// Returns all wallets listed on the index page grouped by their category.
///
/// Each category is a table cell holding a `<h3>Exchanges:</h3>` heading followed by a list of wallet links;
/// the heading becomes the lower-cased category without its trailing colon.
pub fn wallet_listing(content: &str) -> WalletListing {
    let document = Document::from(content);
    let mut listing = WalletListing::default();

    for cell in document.find(Name("table").descendant(Name("td"))) {
        let category = match cell.find(Name("h3")).next() {
            Some(heading) => category_label(&heading.text()),
            None => continue,
        };

        if category.is_empty() {
            continue;
        }

        let names = cell
            .find(Name("ul").descendant(Name("a")))
            .filter_map(|link| link.attr("href"))
            .filter_map(|href| REGEX_WALLET_LINK.captures(href.trim()))
            .map(|captures| captures[1].to_string());

        listing.categories.entry(category).or_default().extend(names);
    }

    listing
}

fn category_label(heading: &str) -> String {
    let heading = heading.trim();
    heading.strip_suffix(':').unwrap_or(heading).trim().to_lowercase()
}

#[inline]
fn cell_text(cell: &Node) -> String {
    cell.text().trim().to_string()
}
