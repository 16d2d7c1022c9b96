use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::seq::IndexedRandom;
use reelmatch_api::{
    export_to_path, ExportOptions, RecommendOptions, Recommendations, Recommender, RestApi,
    DEFAULT_SEARCH_LIMIT,
};
use reelmatch_similarity::LookupMode;
use reelmatch_storage::{load_catalog, ArtifactStore, BuildConfig, IndexBuilder};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Content-based movie and show recommendations
#[derive(Parser, Debug)]
#[command(name = "reelmatch")]
#[command(about = "Content-based recommendations over a title catalog", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and save an artifact set from a catalog CSV
    Build {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// JSON build config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        max_features: Option<usize>,
        /// Words kept per feature blob; 0 keeps every word
        #[arg(long)]
        max_words: Option<usize>,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Recommend titles similar to TITLE
    Recommend {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
        title: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Disable substring title matching
        #[arg(long)]
        exact: bool,
        #[arg(long)]
        exclude_same_type: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Recommend titles for a free-text description
    Text {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
        query: String,
        #[arg(short, long, default_value_t = 10)]
        k: usize,
    },
    /// Search titles by substring
    Search {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
        query: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Export top-K neighbors of every title to CSV
    Export {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(short, long, default_value_t = 5)]
        k: usize,
        /// Only export the first N titles
        #[arg(long)]
        limit: Option<usize>,
        /// Export a random sample of --limit titles drawn with this seed
        #[arg(long, requires = "limit")]
        sample_seed: Option<u64>,
        #[arg(long)]
        no_bom: bool,
    },
    /// Interactive search and recommend loop
    Interactive {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
    },
    /// Serve the REST API
    Serve {
        #[arg(long, default_value = "./artifacts")]
        artifacts: PathBuf,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Build {
            corpus,
            out,
            config,
            max_features,
            max_words,
            chunk_size,
        } => {
            let mut config = match config {
                Some(path) => BuildConfig::from_json_file(&path)?,
                None => BuildConfig::default(),
            };
            if let Some(n) = max_features {
                config.vectorizer.max_features = n;
            }
            if let Some(n) = max_words {
                config.features.max_words = (n > 0).then_some(n);
            }
            if let Some(n) = chunk_size {
                config.chunk_size = n;
            }
            build(&corpus, &out, config)
        }
        Command::Recommend {
            artifacts,
            title,
            k,
            exact,
            exclude_same_type,
            json,
        } => {
            let recommender = Recommender::open(&artifacts);
            let options = RecommendOptions {
                top_k: k,
                lookup: if exact { LookupMode::Exact } else { LookupMode::Fuzzy },
                exclude_same_type,
            };
            let result = recommender.recommend_with(&title, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_recommendations(&recommender, &result)?;
            }
            Ok(())
        }
        Command::Text { artifacts, query, k } => {
            let recommender = Recommender::open(&artifacts);
            let result = recommender.recommend_by_text(&query, k)?;
            if result.is_empty() {
                println!("No title matches that description.");
            }
            print_items(&result);
            Ok(())
        }
        Command::Search {
            artifacts,
            query,
            limit,
        } => {
            let recommender = Recommender::open(&artifacts);
            print_search(&recommender, &query, limit)
        }
        Command::Export {
            artifacts,
            out,
            k,
            limit,
            sample_seed,
            no_bom,
        } => {
            let recommender = Recommender::open(&artifacts);
            let options = ExportOptions {
                top_k: k,
                limit,
                sample_seed,
                bom: !no_bom,
            };
            let report = export_to_path(&recommender, &out, &options)
                .with_context(|| format!("exporting to {}", out.display()))?;
            println!(
                "Exported {} rows for {} titles to {} ({} skipped)",
                report.rows,
                report.sources,
                out.display(),
                report.skipped
            );
            Ok(())
        }
        Command::Interactive { artifacts } => interactive(Recommender::open(&artifacts)),
        Command::Serve { artifacts, port } => serve(artifacts, port).await,
    }
}

fn build(corpus: &Path, out: &Path, config: BuildConfig) -> anyhow::Result<()> {
    info!("Starting reelmatch v{}", env!("CARGO_PKG_VERSION"));
    let catalog = load_catalog(corpus)?;
    let (set, report) = IndexBuilder::new(config).build(catalog.records)?;
    ArtifactStore::new(out).save(&set)?;
    println!(
        "Built index for {} of {} titles ({} terms) in {}",
        report.rows,
        report.input_rows + catalog.blank_titles + catalog.duplicate_ids,
        report.vocab_size,
        out.display()
    );
    println!(
        "  dropped: {} blank titles, {} repeated ids, {} empty features; {} duplicate titles",
        catalog.blank_titles, catalog.duplicate_ids, report.skipped_empty, report.duplicate_titles
    );
    Ok(())
}

fn print_items(result: &Recommendations) {
    for (i, item) in result.items.iter().enumerate() {
        let year = item
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("\n{}. {} ({})", i + 1, item.title, year);
        println!("   Type: {} | Rating: {}", item.kind, item.rating);
        println!("   Score: {:.4}", item.similarity_score);
        println!("   Genre: {}", item.listed_in);
    }
}

fn print_recommendations(recommender: &Recommender, result: &Recommendations) -> anyhow::Result<()> {
    match &result.resolved {
        Some(resolved) => {
            println!("Recommendations for: {}", resolved.title);
            print_items(result);
            Ok(())
        }
        None => {
            println!("Title {:?} not found. Try searching:", result.query);
            print_search(recommender, &result.query, DEFAULT_SEARCH_LIMIT)
        }
    }
}

fn print_search(recommender: &Recommender, query: &str, limit: usize) -> anyhow::Result<()> {
    let hits = recommender.search(query, limit)?;
    println!("Found {} results:", hits.len());
    for hit in hits {
        let year = hit
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_default();
        println!("  {:>6}  {}  {}  {}", hit.row, hit.title, hit.kind, year);
    }
    Ok(())
}

fn prompt(stdin: &mut impl BufRead, label: &str) -> anyhow::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn interactive(recommender: Recommender) -> anyhow::Result<()> {
    recommender.load()?;
    let stdin = io::stdin();
    let mut stdin = stdin.lock();

    loop {
        println!("\nOptions:");
        println!("  1. Search titles");
        println!("  2. Get recommendations");
        println!("  3. Show sample titles");
        println!("  4. Exit");

        let Some(choice) = prompt(&mut stdin, "\nSelect (1-4): ")? else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Some(query) = prompt(&mut stdin, "Search: ")? {
                    print_search(&recommender, &query, DEFAULT_SEARCH_LIMIT)?;
                }
            }
            "2" => {
                if let Some(title) = prompt(&mut stdin, "Title: ")? {
                    let result = recommender.recommend(&title, 5)?;
                    print_recommendations(&recommender, &result)?;
                }
            }
            "3" => {
                let titles = recommender.titles()?;
                let mut rng = rand::rng();
                println!("\nSample titles:");
                for (i, title) in titles.choose_multiple(&mut rng, 20).enumerate() {
                    println!("  {}. {}", i + 1, title);
                }
            }
            "4" | "q" | "quit" | "exit" => break,
            _ => println!("Please select 1-4"),
        }
    }
    Ok(())
}

async fn serve(artifacts: PathBuf, port: u16) -> anyhow::Result<()> {
    info!("Starting reelmatch v{}", env!("CARGO_PKG_VERSION"));
    let recommender = Arc::new(Recommender::open(&artifacts));
    info!("Artifact source: {}", recommender.source());
    recommender
        .load()
        .with_context(|| format!("loading artifacts from {}", artifacts.display()))?;

    let http_recommender = recommender.clone();
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(http_recommender, port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/", port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    recommender.close();
    info!("Shutting down...");
    Ok(())
}
