//! Command line converter from GOBL invoices to NAV `InvoiceData` XML.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use szamla::core::Invoice;
use szamla::nav::{self, ConvertOptions};

/// GOBL to NAV Online Invoice (OSA 3.0) converter
#[derive(Parser)]
#[command(name = "szamla")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a GOBL invoice (JSON) into NAV InvoiceData XML
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input GOBL JSON file (stdin when omitted)
    input: Option<PathBuf>,

    /// Output XML file (stdout when omitted)
    output: Option<PathBuf>,

    /// Conversion options as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report all addresses in detailed form
    #[arg(long)]
    detailed_addresses: bool,

    /// Public place category for detailed addresses without a street type
    #[arg(long)]
    public_place_category: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Convert(args) => convert(args),
    }
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let mut options = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<ConvertOptions>(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ConvertOptions::default(),
    };
    if args.detailed_addresses {
        options.detailed_addresses = true;
    }
    if let Some(category) = args.public_place_category {
        options.public_place_category = category;
    }

    let json = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let invoice = Invoice::from_json(&json).context("parsing GOBL invoice")?;
    tracing::info!(code = %invoice.code, lines = invoice.lines.len(), "converting invoice");

    let xml = nav::to_nav_xml_with(&invoice, &options)
        .with_context(|| format!("converting invoice {}", invoice.code))?;

    match &args.output {
        Some(path) => {
            fs::write(path, &xml).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = xml.len(), "wrote NAV XML");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(xml.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
