//! he-server: encrypted aggregation over HTTP
//!
//! Builds both engines, generates their keys and serves the JSON API.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use he_aggregate::http::{router, AppState};
use he_aggregate::{CsvOptions, Engines};

#[derive(Parser)]
#[command(name = "he-server")]
#[command(about = "Encrypted aggregation server")]
#[command(version)]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Skip the first row of CSV files
    #[arg(long)]
    csv_header: bool,

    /// CSV field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Ring dimension (production default 8192)
    #[arg(long)]
    ring_dim: Option<usize>,

    /// Start without keys; every crypto endpoint then fails
    #[arg(long)]
    no_keygen: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("he-aggregate server");
    info!("Bind address: {}", args.bind);

    if !args.delimiter.is_ascii() {
        return Err(eyre::eyre!("Delimiter must be ASCII, got {:?}", args.delimiter));
    }
    let csv = CsvOptions {
        delimiter: args.delimiter as u8,
        has_header: args.csv_header,
    };

    let mut engines = match args.ring_dim {
        Some(ring_dim) => Engines::with_ring_dim(ring_dim),
        None => Engines::new(),
    }
    .map_err(|e| eyre::eyre!("Invalid parameters: {}", e))?;

    if args.no_keygen {
        info!("Key generation skipped");
    } else {
        info!("Generating keys...");
        let keygen_start = Instant::now();
        let [exact, approximate] = engines
            .generate_keys()
            .wrap_err("Key generation failed")?;
        info!(
            "Exact: ring_dim={}, modulus_bits={:.1}, public_key={} bytes",
            exact.ring_dim, exact.modulus_bits, exact.public_key_bytes
        );
        info!(
            "Approximate: ring_dim={}, modulus_bits={:.1}, public_key={} bytes",
            approximate.ring_dim, approximate.modulus_bits, approximate.public_key_bytes
        );
        info!("Keygen time: {:.2?}", keygen_start.elapsed());
    }

    let app = router(Arc::new(AppState { engines, csv }));

    info!("Starting server on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    println!();
    println!("=== he-aggregate Server Running ===");
    println!("Listening on: http://{}", args.bind);
    println!();
    println!("Endpoints:");
    println!("  GET  /health        - Health check");
    println!("  GET  /params        - Scheme parameters");
    println!("  GET  /public_key    - Export public key (?scheme=exact|approximate)");
    println!("  POST /operation     - Run an operation request");
    println!("  POST /encrypt       - Encrypt a value");
    println!("  POST /decrypt       - Decrypt a ciphertext");
    println!("  POST /add_encrypted - Add two ciphertexts");
    println!("  POST /csv/read      - Read a CSV column");
    println!("  POST /csv/sum       - Sum a CSV column");
    println!("  POST /csv/average   - Average a CSV column");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
