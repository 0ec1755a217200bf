use std::env;
use std::path::PathBuf;

use qbatch_core::traits::IndexService;
use qbatch_text::{QueryParser, TantivyIndexService};

// Query an existing index with one query line and print ranked results.
// Usage:
//   cargo run -p qbatch-text --example search -- "your query" \
//     [--index ./index] [--limit 10] [--field contents]

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: cargo run -p qbatch-text --example search -- <query> [--index DIR] [--limit N] [--field NAME]");
        std::process::exit(1);
    }
    let mut query = String::new();
    let mut index_dir: Option<PathBuf> = None;
    let mut limit: usize = 10;
    let mut field = "contents".to_string();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--index" => {
                if i + 1 >= args.len() { eprintln!("--index requires a path"); std::process::exit(2); }
                index_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2; continue;
            }
            "--limit" => {
                if i + 1 >= args.len() { eprintln!("--limit requires a number"); std::process::exit(2); }
                limit = args[i + 1].parse().unwrap_or(limit);
                i += 2; continue;
            }
            "--field" => {
                if i + 1 >= args.len() { eprintln!("--field requires a name"); std::process::exit(2); }
                field = args[i + 1].clone();
                i += 2; continue;
            }
            s if s.starts_with("--") => {
                eprintln!("Unknown flag: {}", s); std::process::exit(2);
            }
            s => {
                if query.is_empty() { query = s.to_string(); }
                i += 1; continue;
            }
        }
    }

    // Resolve index path precedence: flag > QBATCH_INDEX_DIR > ./index
    let index_dir = index_dir
        .or_else(|| env::var("QBATCH_INDEX_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("index"));

    let parsed = QueryParser::new(field).parse(&query)?;
    println!("Index: {}", index_dir.display());
    println!("Query: {} (limit {})\n", parsed, limit);

    let service = TantivyIndexService::open(&index_dir)?;
    let top = service.search(&parsed, limit)?;
    println!("{} total matching documents", top.total_hits);
    for (i, hit) in top.hits.iter().enumerate() {
        let record = service.lookup(hit.doc)?;
        println!("{:>2}. score={:.3} doc={} path={} title={}",
            i + 1, hit.score, hit.doc,
            record.path.as_deref().unwrap_or("-"), record.title.as_deref().unwrap_or("-"));
    }
    Ok(())
}
