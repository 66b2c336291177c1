//! Handles the pagination logic of listings that have no explicit "last page" marker.
//!
//! Both sites render a fixed number of rows per page, hence a page holding fewer rows than that is taken as
//! the last one. This is a heuristic, e.g. a listing with exactly 200 entries costs one additional (empty)
//! request, but it is the only end-of-data signal available.

use crate::error::Error;
use std::time::Duration;

/// Transient state of a single listing traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlCursor {
    /// Page to fetch next, starting at 1.
    pub page: usize,

    /// Number of records found on the most recently fetched page.
    pub last_count: usize,
}

impl CrawlCursor {
    pub fn new() -> Self {
        CrawlCursor {
            page: 1,
            last_count: 0,
        }
    }

    /// Records the result of the current page and moves on to the next one.
    pub fn advance(&mut self, count: usize) {
        self.last_count = count;
        self.page += 1;
    }

    /// Returns the number of pages fetched so far.
    pub fn fetched(&self) -> usize {
        self.page - 1
    }
}

impl Default for CrawlCursor {
    fn default() -> Self {
        CrawlCursor::new()
    }
}

pub struct Paginator {
    full_page: usize,
    pace: Duration,
}

impl Paginator {
    /// Returns a paginator treating pages with less than `full_page` records as the last page, sleeping `pace`
    /// between two consecutive pages.
    pub fn new(full_page: usize, pace: Duration) -> Self {
        Paginator { full_page, pace }
    }

    /// Fetches all pages and returns their records in order.
    pub fn collect<T, F>(&self, fetch: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(usize) -> Result<Vec<T>, Error>,
    {
        let mut items = Vec::new();
        self.walk(fetch, |mut page| {
            items.append(&mut page);
            Ok(())
        })?;

        Ok(items)
    }

    /// Fetches all pages handing each page's records to `visit`, returning the final cursor.
    pub fn walk<T, F, V>(&self, fetch: F, visit: V) -> Result<CrawlCursor, Error>
    where
        F: FnMut(usize) -> Result<Vec<T>, Error>,
        V: FnMut(Vec<T>) -> Result<(), Error>,
    {
        self.walk_with_sleep(fetch, visit, std::thread::sleep)
    }

    fn walk_with_sleep<T, F, V, S>(&self, mut fetch: F, mut visit: V, mut sleep: S) -> Result<CrawlCursor, Error>
    where
        F: FnMut(usize) -> Result<Vec<T>, Error>,
        V: FnMut(Vec<T>) -> Result<(), Error>,
        S: FnMut(Duration),
    {
        let mut cursor = CrawlCursor::new();

        loop {
            if cursor.page > 1 && !self.pace.is_zero() {
                sleep(self.pace);
            }

            let items = fetch(cursor.page)?;
            let count = items.len();

            visit(items)?;
            cursor.advance(count);

            if count < self.full_page {
                return Ok(cursor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(sizes: Vec<usize>) -> impl FnMut(usize) -> Result<Vec<String>, Error> {
        move |page| Ok((0..sizes[page - 1]).map(|idx| format!("{page}-{idx}")).collect())
    }

    #[test]
    fn stops_on_first_short_page() {
        let mut requested = Vec::new();
        let mut fetch = pages(vec![100, 100, 47, 100]);

        let items = Paginator::new(100, Duration::ZERO)
            .collect(|page| {
                requested.push(page);
                fetch(page)
            })
            .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(items.len(), 247);
        assert_eq!(items[0], "1-0");
        assert_eq!(items[246], "3-46");
    }

    #[test]
    fn empty_first_page() {
        let items = Paginator::new(100, Duration::ZERO).collect(pages(vec![0])).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn detail_pages_of_ten_records() {
        let cursor = Paginator::new(10, Duration::ZERO).walk(pages(vec![10, 10, 10, 9]), |_| Ok(())).unwrap();

        assert_eq!(cursor.fetched(), 4);
        assert_eq!(cursor.last_count, 9);
    }

    #[test]
    fn pacing_between_pages_only() {
        let mut slept = Vec::new();
        let cursor = Paginator::new(2, Duration::from_secs(5))
            .walk_with_sleep(pages(vec![2, 2, 1]), |_| Ok(()), |delay| slept.push(delay))
            .unwrap();

        assert_eq!(cursor.fetched(), 3);
        assert_eq!(slept, vec![Duration::from_secs(5); 2]);
    }

    #[test]
    fn errors_abort_the_walk() {
        let mut visited = 0;
        let result = Paginator::new(1, Duration::ZERO).walk(
            |page| match page {
                1 => Ok(vec![page]),
                _ => Err(Error::CrawlerChannelDisconnected),
            },
            |_| {
                visited += 1;
                Ok(())
            },
        );

        assert!(matches!(result, Err(Error::CrawlerChannelDisconnected)));
        assert_eq!(visited, 1);
    }
}
