mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Rebuild logical pages and content units from multi-up scanned books"
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect page numbers and books and write the logical page map
    Map {
        /// Path to the multi-up PDF
        input_file: PathBuf,

        /// Predefined configuration (default: fazail)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON pipeline configuration
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Write the map to a JSON file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Segment a multi-up PDF into content units
    Segment {
        /// Path to the multi-up PDF
        input_file: PathBuf,

        /// Boundary catalog JSON (default: read the configured contents pages)
        #[arg(short, long, value_name = "FILE")]
        toc: Option<PathBuf>,

        /// Reuse a map written by `folio map`
        #[arg(short, long, value_name = "FILE")]
        map: Option<PathBuf>,

        /// Predefined configuration (default: fazail)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON pipeline configuration
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the result to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Segment a flat transcript PDF against a catalog of numbered items
    Transcript {
        /// Path to the transcript PDF
        input_file: PathBuf,

        /// Catalog JSON: [{id, label?, title}]
        #[arg(long, value_name = "FILE")]
        catalog: PathBuf,

        /// Predefined overrides (default: none)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON transcript configuration
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the result to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Parse the configured contents pages into a boundary catalog
    Toc {
        /// Path to the multi-up PDF
        input_file: PathBuf,

        /// Predefined configuration (default: fazail)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON pipeline configuration
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Write the catalog to a JSON file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Inspect and validate configurations
    Presets {
        #[command(subcommand)]
        action: PresetsAction,
    },
}

#[derive(Subcommand)]
enum PresetsAction {
    /// List predefined configurations
    List,
    /// Print a preset as JSON
    Show {
        /// Preset name (e.g., "fazail")
        preset: String,
    },
    /// Validate a custom pipeline or transcript configuration
    Validate {
        /// Path to JSON configuration
        file: PathBuf,

        /// Validate as a transcript configuration
        #[arg(long)]
        transcript: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Map {
            input_file,
            preset,
            config,
            out,
        } => commands::map::run(input_file, preset, config, out),
        Commands::Segment {
            input_file,
            toc,
            map,
            preset,
            config,
            output,
            out,
        } => commands::segment::run(input_file, toc, map, preset, config, &output, out),
        Commands::Transcript {
            input_file,
            catalog,
            preset,
            config,
            output,
            out,
        } => commands::transcript::run(input_file, catalog, preset, config, &output, out),
        Commands::Toc {
            input_file,
            preset,
            config,
            out,
        } => commands::toc::run(input_file, preset, config, out),
        Commands::Presets { action } => match action {
            PresetsAction::List => commands::presets::list(),
            PresetsAction::Show { preset } => commands::presets::show(&preset),
            PresetsAction::Validate { file, transcript } => {
                commands::presets::validate(&file, transcript)
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
