//! One pass over a fixed look-ahead window of ranked results.

use std::io::Write;

use tracing::{debug, info};

use qbatch_core::error::{Error, Result};
use qbatch_core::traits::IndexService;
use qbatch_core::types::{QueryTree, ScoredDoc};

/// Pages fetched up front per query. Matches beyond `LOOKAHEAD_PAGES * page_size`
/// are counted in `total_hits` but never reached.
pub const LOOKAHEAD_PAGES: usize = 5;

/// Consecutive slices of at most `page_size` hits; the last holds the remainder.
pub struct Pages<'a> {
    hits: &'a [ScoredDoc],
    page_size: usize,
    start: usize,
}

impl<'a> Pages<'a> {
    pub fn new(hits: &'a [ScoredDoc], page_size: usize) -> Self {
        Self { hits, page_size: page_size.max(1), start: 0 }
    }
}

impl<'a> Iterator for Pages<'a> {
    type Item = &'a [ScoredDoc];

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.hits.len().min(self.start + self.page_size);
        if end == self.start {
            return None;
        }
        let page = &self.hits[self.start..end];
        self.start = end;
        Some(page)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    /// True number of matching documents.
    pub total_hits: usize,
    /// Hits inside the look-ahead window.
    pub retrieved: usize,
    /// Pages the window holds; only the first is emitted.
    pub pages: usize,
    pub written: usize,
    pub missing_path: usize,
}

pub struct PagedSearcher<'a, S: IndexService + ?Sized> {
    index: &'a S,
    page_size: usize,
    raw: bool,
}

impl<'a, S: IndexService + ?Sized> PagedSearcher<'a, S> {
    pub fn new(index: &'a S, page_size: usize, raw: bool) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidConfig("page size must be greater than 0".into()));
        }
        Ok(Self { index, page_size, raw })
    }

    pub fn window(&self) -> usize { LOOKAHEAD_PAGES * self.page_size }

    /// Search once for the whole look-ahead window and emit its first page.
    ///
    /// Batch runs never turn pages, so at most `page_size` paths are written
    /// to `out`, one per line. Titles, documents without a path, and raw
    /// `(doc, score)` pairs go to the log only.
    pub fn run<W: Write + ?Sized>(&self, query: &QueryTree, out: &mut W) -> Result<PageStats> {
        let top = self.index.search(query, self.window())?;
        let mut stats = PageStats { total_hits: top.total_hits, retrieved: top.hits.len(), ..PageStats::default() };
        if top.hits.is_empty() {
            info!(query = %query, "no matching documents");
            return Ok(stats);
        }
        info!(total_hits = top.total_hits, retrieved = top.hits.len(), "matching documents");

        let mut pages = Pages::new(&top.hits, self.page_size);
        let Some(page) = pages.next() else { return Ok(stats) };
        stats.pages = 1 + pages.count();
        debug!(pages = stats.pages, hits = page.len(), "first page");
        for hit in page {
            if self.raw {
                info!("doc={} score={}", hit.doc, hit.score);
                continue;
            }
            let record = self.index.lookup(hit.doc)?;
            match record.path {
                Some(path) => {
                    writeln!(out, "{path}")?;
                    stats.written += 1;
                    if let Some(title) = record.title {
                        info!(path = %path, "title: {title}");
                    }
                }
                None => {
                    stats.missing_path += 1;
                    info!(doc = %hit.doc, "no path for document");
                }
            }
        }
        Ok(stats)
    }
}
