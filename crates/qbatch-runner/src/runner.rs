use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, info_span, warn};
use walkdir::WalkDir;

use qbatch_core::config::AppConfig;
use qbatch_core::error::{Error, Result};
use qbatch_core::traits::{Embedder, IndexService};
use qbatch_core::types::QueryTree;
use qbatch_hybrid::SemanticAugmenter;
use qbatch_text::QueryParser;

use crate::output::OutputFile;
use crate::pager::PagedSearcher;

/// Hit limit of each benchmark repetition.
const BENCHMARK_HITS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub query_dir: PathBuf,
    pub output_dir: PathBuf,
    pub field: String,
    pub vector_field: String,
    pub page_size: usize,
    pub knn: usize,
    pub raw: bool,
    pub repeat: usize,
}

impl BatchSettings {
    /// Settings from the loaded configuration, with relative paths resolved against `base`.
    pub fn from_config(app: &AppConfig, base: &Path) -> Self {
        Self {
            query_dir: app.query_dir(base),
            output_dir: app.output_dir(base),
            field: app.search.field.clone(),
            vector_field: app.search.vector_field.clone(),
            page_size: app.search.page_size,
            knn: app.search.knn,
            raw: app.search.raw,
            repeat: app.search.repeat,
        }
    }
}

/// Outcome of one query file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileReport {
    pub name: String,
    /// Queries executed.
    pub queries: usize,
    /// Lines skipped because they did not parse.
    pub skipped: usize,
    /// Paths written to the output file.
    pub written: usize,
    /// Set when the file was abandoned; its output was not persisted.
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(&self) -> bool { self.error.is_some() }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn queries(&self) -> usize { self.files.iter().map(|f| f.queries).sum() }

    pub fn failed_files(&self) -> usize { self.files.iter().filter(|f| f.failed()).count() }

    pub fn has_failures(&self) -> bool { self.failed_files() > 0 }
}

/// Runs every query file of a directory against one index.
///
/// Files are processed in file-name order, lines top to bottom; the first
/// blank line ends a file. A line that fails to parse is skipped. Any other
/// failure abandons the current file without touching its previous output,
/// and the batch moves on to the next file.
pub struct BatchRunner<'a, S: IndexService + ?Sized> {
    settings: BatchSettings,
    index: &'a S,
    parser: QueryParser,
    augmenter: Option<SemanticAugmenter<'a>>,
}

impl<'a, S: IndexService + ?Sized> BatchRunner<'a, S> {
    /// `embedder` is required when `settings.knn > 0` and ignored otherwise.
    pub fn new(settings: BatchSettings, index: &'a S, embedder: Option<&'a dyn Embedder>) -> Result<Self> {
        if settings.page_size == 0 {
            return Err(Error::InvalidConfig("page size must be greater than 0".into()));
        }
        let augmenter = match (settings.knn, embedder) {
            (0, _) => None,
            (_, Some(embedder)) => Some(SemanticAugmenter::new(embedder, settings.field.clone(), settings.vector_field.clone())),
            (_, None) => return Err(Error::InvalidConfig("knn > 0 requires an embedder".into())),
        };
        let parser = QueryParser::new(settings.field.clone());
        Ok(Self { settings, index, parser, augmenter })
    }

    pub fn run(&self) -> Result<BatchReport> {
        let files = list_query_files(&self.settings.query_dir)?;
        fs::create_dir_all(&self.settings.output_dir)?;
        info!(files = files.len(), query_dir = %self.settings.query_dir.display(), "batch started");

        let mut report = BatchReport::default();
        for path in files {
            report.files.push(self.run_file(&path));
        }
        info!(files = report.files.len(), queries = report.queries(), failed = report.failed_files(), "batch finished");
        Ok(report)
    }

    fn run_file(&self, path: &Path) -> FileReport {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let span = info_span!("query_file", file = %name);
        let _enter = span.enter();

        let mut report = FileReport { name, ..FileReport::default() };
        match self.process_file(path, &mut report) {
            Ok(output) => info!(queries = report.queries, written = report.written, output = %output.display(), "query file done"),
            Err(e) => {
                error!(error = %e, "query file abandoned, output not written");
                report.error = Some(e.to_string());
            }
        }
        report
    }

    fn process_file(&self, path: &Path, report: &mut FileReport) -> Result<PathBuf> {
        let name = path.file_name().ok_or_else(|| Error::NotFound(format!("file name of {}", path.display())))?;
        let reader = BufReader::new(File::open(path)?);
        let mut output = OutputFile::create(&self.settings.output_dir, name)?;
        let searcher = PagedSearcher::new(self.index, self.settings.page_size, self.settings.raw)?;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let text = line.trim();
            if text.is_empty() {
                break;
            }
            let query = match self.parser.parse(text) {
                Ok(query) => query,
                Err(e) if e.is_line_scoped() => {
                    warn!(line = line_no + 1, error = %e, "skipping query line");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let query = self.augment(query)?;
            info!(line = line_no + 1, query = %query, "searching");
            report.queries += 1;

            if self.settings.repeat > 0 {
                self.benchmark(&query)?;
            }
            let stats = searcher.run(&query, &mut output)?;
            report.written += stats.written;
        }
        output.commit()
    }

    fn augment(&self, query: QueryTree) -> Result<QueryTree> {
        match &self.augmenter {
            Some(augmenter) => augmenter.augment_query(query, self.settings.knn),
            None => Ok(query),
        }
    }

    fn benchmark(&self, query: &QueryTree) -> Result<()> {
        let started = Instant::now();
        for _ in 0..self.settings.repeat {
            self.index.search(query, BENCHMARK_HITS)?;
        }
        let elapsed = started.elapsed();
        info!(repeat = self.settings.repeat, elapsed_ms = elapsed.as_millis() as u64, "benchmark");
        Ok(())
    }
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_query_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidConfig(format!("query directory {} does not exist", dir.display())));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbatch_core::types::{DocRef, DocumentRecord, TopHits};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    struct BrokenIndex;

    impl IndexService for BrokenIndex {
        fn search(&self, _query: &QueryTree, _limit: usize) -> Result<TopHits> {
            Err(Error::Index("segment unreadable".into()))
        }

        fn lookup(&self, doc: DocRef) -> Result<DocumentRecord> {
            Err(Error::NotFound(doc.to_string()))
        }
    }

    struct EmptyIndex;

    impl IndexService for EmptyIndex {
        fn search(&self, _query: &QueryTree, _limit: usize) -> Result<TopHits> {
            Ok(TopHits::default())
        }

        fn lookup(&self, doc: DocRef) -> Result<DocumentRecord> {
            Err(Error::NotFound(doc.to_string()))
        }
    }

    fn settings(dir: &Path) -> BatchSettings {
        BatchSettings {
            query_dir: dir.join("queries"),
            output_dir: dir.join("out"),
            field: "contents".into(),
            vector_field: "contents-vector".into(),
            page_size: 10,
            knn: 0,
            raw: false,
            repeat: 0,
        }
    }

    #[test]
    fn query_files_are_listed_sorted_without_subdirectories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("nested")).unwrap();
        for name in ["b", "a", "c"] {
            fs::write(tmp.path().join(name), "x\n").unwrap();
        }
        fs::write(tmp.path().join("nested/d"), "x\n").unwrap();
        let names: Vec<_> = list_query_files(tmp.path()).unwrap().iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_query_directory_is_a_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let runner = BatchRunner::new(settings(tmp.path()), &EmptyIndex, None).unwrap();
        assert!(matches!(runner.run(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn knn_without_embedder_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut s = settings(tmp.path());
        s.knn = 3;
        assert!(matches!(BatchRunner::new(s, &EmptyIndex, None), Err(Error::InvalidConfig(_))));
    }

    #[test]
    #[traced_test]
    fn zero_hits_and_failures_are_distinguishable_in_logs() {
        let tmp = TempDir::new().unwrap();
        let s = settings(tmp.path());
        fs::create_dir_all(&s.query_dir).unwrap();
        fs::write(s.query_dir.join("q1"), "cat\n").unwrap();

        let report = BatchRunner::new(s.clone(), &EmptyIndex, None).unwrap().run().unwrap();
        assert!(!report.has_failures());
        assert!(logs_contain("no matching documents"));
        assert!(!logs_contain("query file abandoned"));
        assert_eq!(fs::read_to_string(s.output_dir.join("q1")).unwrap(), "");

        let report = BatchRunner::new(s, &BrokenIndex, None).unwrap().run().unwrap();
        assert_eq!(report.failed_files(), 1);
        assert!(logs_contain("query file abandoned"));
        assert!(logs_contain("segment unreadable"));
    }

    #[test]
    #[traced_test]
    fn repeat_runs_the_benchmark() {
        let tmp = TempDir::new().unwrap();
        let mut s = settings(tmp.path());
        s.repeat = 3;
        fs::create_dir_all(&s.query_dir).unwrap();
        fs::write(s.query_dir.join("q1"), "cat\n").unwrap();
        let report = BatchRunner::new(s, &EmptyIndex, None).unwrap().run().unwrap();
        assert_eq!(report.queries(), 1);
        assert!(logs_contain("benchmark"));
        assert!(logs_contain("repeat=3"));
    }
}
