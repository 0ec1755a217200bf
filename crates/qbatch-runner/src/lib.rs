//! qbatch-runner
//!
//! Drives query files through parsing, optional semantic augmentation and
//! paginated search, writing matched document paths to one output file per
//! query file.

pub mod output;
pub mod pager;
pub mod runner;

pub use output::OutputFile;
pub use pager::{PageStats, PagedSearcher, Pages, LOOKAHEAD_PAGES};
pub use runner::{BatchReport, BatchRunner, BatchSettings, FileReport};
