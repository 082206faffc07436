use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rusqlite::Connection;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use medin::extract::Resolvers;
use medin::metadata::Metadata;
use medin::persist::Persistor;
use medin::settings::Settings;
use medin::spatial::{AreaIndex, StaticReferenceSystems};
use medin::vocab::StaticVocabulary;

/// Reads MEDIN metadata documents and prints their object model.
#[derive(Parser, Debug)]
#[command(name = "medin")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the merged responsible parties instead of the whole record
    #[arg(long)]
    contacts: bool,

    /// Metadata documents; the file stem is used as the record uid
    #[arg(required = true)]
    documents: Vec<PathBuf>,
}

fn main() -> ExitCode {
    // logs go to stderr so that stdout only carries the records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "could not load settings");
            return ExitCode::FAILURE;
        }
    };

    match &settings.resolvers.database {
        Some(path) => {
            info!(database = %path.display(), "using resolver database");
            let connection = match Connection::open(path) {
                Ok(connection) => connection,
                Err(e) => {
                    error!(database = %path.display(), error = %e, "could not open resolver database");
                    return ExitCode::FAILURE;
                }
            };
            let persistor = match Persistor::new(&connection) {
                Ok(persistor) => persistor,
                Err(e) => {
                    error!(error = %e, "could not prepare resolver database");
                    return ExitCode::FAILURE;
                }
            };
            let resolvers = Resolvers { vocabulary: &persistor, areas: &persistor, reference_systems: &persistor };
            run(&args, &settings, resolvers)
        }
        None => {
            let vocabulary = StaticVocabulary::new();
            let areas = AreaIndex::new();
            let systems = StaticReferenceSystems::new();
            let resolvers = Resolvers { vocabulary: &vocabulary, areas: &areas, reference_systems: &systems };
            run(&args, &settings, resolvers)
        }
    }
}

fn run(args: &Args, settings: &Settings, resolvers: Resolvers<'_>) -> ExitCode {
    let mut failed = false;
    for path in &args.documents {
        let uid = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
        let metadata = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Metadata::parse(&uid, &bytes, resolvers, settings).map_err(|e| e.to_string()));
        match metadata {
            Ok(metadata) if args.contacts => println!("{}\n", metadata.responsible_party),
            Ok(metadata) => match serde_json::to_string_pretty(&metadata) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!(document = %path.display(), error = %e, "could not serialize metadata");
                    failed = true;
                }
            },
            Err(e) => {
                error!(document = %path.display(), error = %e, "document skipped");
                failed = true;
            }
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
