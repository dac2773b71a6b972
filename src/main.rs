use std::{fs::File, path::PathBuf};

use clap::Parser;
use product_plots::{
    ledger::ProductLedger,
    plot::{emit_plots, BitmapRenderer},
    reader::read_rows_from_path,
    summary::{summarize, write_summaries, DEFAULT_SENSITIVITY},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Scatter plots of product prices and amounts over time.
#[derive(Parser)]
#[clap(version, about)]
struct Cli {
    /// Input file: a header line, then `<product> <amount> <price>` per line
    #[clap(default_value = "data/exampleDatabase")]
    input: PathBuf,
    /// Existing directory the plots are written to
    #[clap(long, default_value = "plots")]
    output_dir: PathBuf,
    /// Plot width in pixels
    #[clap(long, default_value_t = 640)]
    width: u32,
    /// Plot height in pixels
    #[clap(long, default_value_t = 480)]
    height: u32,
    /// Also write per-product price and amount statistics as CSV (`-` for stdout)
    #[clap(long)]
    summary: Option<PathBuf>,
    /// Chebyshev sensitivity in (0, 1] for counting unlikely entries in the summary
    #[clap(long, default_value_t = DEFAULT_SENSITIVITY)]
    sensitivity: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("product_plots=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if !(cli.sensitivity > 0.0 && cli.sensitivity <= 1.0) {
        return Err(format!("sensitivity must be in (0, 1], got {}", cli.sensitivity).into());
    }

    let rows = read_rows_from_path(&cli.input)?;
    let ledger = ProductLedger::from_rows(rows)?;

    if let Some(path) = &cli.summary {
        let summaries = summarize(&ledger, cli.sensitivity);
        if path.as_os_str() == "-" {
            write_summaries(&summaries, std::io::stdout())?;
        } else {
            let file = File::create(path)?;
            write_summaries(&summaries, file)?;
            info!(path = %path.display(), "summary written");
        }
    }

    let mut renderer = BitmapRenderer::new(cli.width, cli.height);
    emit_plots(&ledger, &cli.output_dir, &mut renderer)?;
    Ok(())
}
