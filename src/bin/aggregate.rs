//! he-aggregate: aggregate a CSV column from the command line
//!
//! Runs the same pipeline as the server's `/csv/*` routes: load a column,
//! optionally encrypt every value, sum homomorphically, decrypt.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use he_aggregate::{
    summarize, Aggregate, Approximate, ColumnAggregator, CsvOptions, Engine, Exact, Scheme,
    SchemeKind, SchemeParams,
};

#[derive(Parser)]
#[command(name = "he-aggregate")]
#[command(about = "Encrypted CSV column aggregation")]
#[command(version)]
struct Args {
    /// Ring dimension (production default 8192)
    #[arg(long, global = true)]
    ring_dim: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    Exact,
    Approximate,
}

impl From<SchemeArg> for SchemeKind {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Exact => SchemeKind::Exact,
            SchemeArg::Approximate => SchemeKind::Approximate,
        }
    }
}

#[derive(clap::Args)]
struct ColumnArgs {
    /// CSV file to read
    #[arg(long)]
    file: PathBuf,

    /// Zero-based column index
    #[arg(long, default_value_t = 0)]
    column: usize,

    /// Skip the first row
    #[arg(long)]
    header: bool,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Encrypt under this scheme; plaintext when omitted
    #[arg(long, value_enum)]
    scheme: Option<SchemeArg>,
}

#[derive(Subcommand)]
enum Command {
    /// Sum a column
    Sum(ColumnArgs),
    /// Average a column
    Average(ColumnArgs),
    /// Print a fresh public key
    PublicKey {
        #[arg(long, value_enum, default_value = "approximate")]
        scheme: SchemeArg,
    },
    /// Print scheme parameters as JSON
    Params {
        #[arg(long, value_enum, default_value = "approximate")]
        scheme: SchemeArg,
    },
}

fn params_for(kind: SchemeKind, ring_dim: Option<usize>) -> SchemeParams {
    let params = SchemeParams::for_kind(kind);
    match ring_dim {
        Some(ring_dim) => params.with_ring_dim(ring_dim),
        None => params,
    }
}

fn keyed_engine<S: Scheme>(ring_dim: Option<usize>) -> Result<Engine<S>> {
    let mut engine = Engine::<S>::with_params(params_for(S::KIND, ring_dim))
        .wrap_err("Invalid parameters")?;
    let start = Instant::now();
    engine.generate_keys().wrap_err("Key generation failed")?;
    info!("{} keys generated in {:.2?}", S::KIND, start.elapsed());
    Ok(engine)
}

fn run_column(args: &ColumnArgs, aggregate: Aggregate, ring_dim: Option<usize>) -> Result<()> {
    if !args.delimiter.is_ascii() {
        return Err(eyre::eyre!("Delimiter must be ASCII, got {:?}", args.delimiter));
    }
    let aggregator = ColumnAggregator::new(CsvOptions {
        delimiter: args.delimiter as u8,
        has_header: args.header,
    });
    let column = aggregator
        .try_load_column(&args.file, args.column)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    info!("Loaded {} values from column {}", column.len(), args.column);

    let summary = match args.scheme.map(SchemeKind::from) {
        Some(SchemeKind::Exact) => {
            let engine = keyed_engine::<Exact>(ring_dim)?;
            summarize(&column, aggregate, Some(&engine))
        }
        Some(SchemeKind::Approximate) => {
            let engine = keyed_engine::<Approximate>(ring_dim)?;
            summarize(&column, aggregate, Some(&engine))
        }
        None => summarize::<Exact>(&column, aggregate, None),
    }
    .wrap_err("Aggregation failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    match &args.command {
        Command::Sum(column) => run_column(column, Aggregate::Sum, args.ring_dim),
        Command::Average(column) => run_column(column, Aggregate::Average, args.ring_dim),
        Command::PublicKey { scheme } => {
            let text = match SchemeKind::from(*scheme) {
                SchemeKind::Exact => keyed_engine::<Exact>(args.ring_dim)?.export_public_key(),
                SchemeKind::Approximate => {
                    keyed_engine::<Approximate>(args.ring_dim)?.export_public_key()
                }
            }
            .wrap_err("Public key export failed")?;
            println!("{}", text);
            Ok(())
        }
        Command::Params { scheme } => {
            let params = params_for(SchemeKind::from(*scheme), args.ring_dim);
            params.validate().wrap_err("Invalid parameters")?;
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
    }
}
