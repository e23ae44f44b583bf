mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cvextract",
    version,
    about = "Extract structured candidate profiles from resume PDFs"
)]
struct Cli {
    /// Config file layered over the platform and ./.cvextract.toml files
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in the input directory into <name>.pdf.json files
    Run {
        /// Directory to scan for PDFs (default: ./INPUT)
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Directory for the JSON results (default: ./OUTPUT)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Documents processed at the same time
        #[arg(short, long)]
        workers: Option<usize>,

        /// Fixed scratch directory for page images (default: one temp dir per document)
        #[arg(long, value_name = "DIR")]
        workspace: Option<PathBuf>,
    },
    /// Extract the profile of a single PDF and print it as JSON
    Parse {
        /// Path to the resume PDF
        input_file: PathBuf,

        /// Write the profile to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Print the plain text recovered from a PDF (native text or page OCR)
    Text {
        /// Path to the PDF
        input_file: PathBuf,
    },
    /// Check system tools and API configuration
    Doctor,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run {
            input,
            output,
            workers,
            workspace,
        } => {
            let flags = commands::RunFlags {
                input,
                output,
                workers,
                workspace,
            };
            commands::run::run(config, flags).await
        }
        Commands::Parse { input_file, out } => commands::parse::run(config, &input_file, out).await,
        Commands::Text { input_file } => commands::text::run(config, &input_file).await,
        Commands::Doctor => commands::doctor::run(config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "cvextract=debug,cvextract_core=debug"
    } else {
        "cvextract=info,cvextract_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
