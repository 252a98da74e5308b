//! Driftnet node: ingest a UTXO snapshot, then probe random keys against
//! the indexed set from every core.

mod cli;
mod informant;
mod jackpot;
mod worker;

use clap::Parser;
use cli::Cli;
use driftnet_utxo::UtxoIndex;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    init_logger();
    run(Cli::parse())
}

fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (index, _report) = UtxoIndex::load(&cli.snapshot, &cli.table, cli.index_bits)?;
    tracing::info!("{} fingerprints indexed", index.bucket_count());

    let index = Arc::new(index);
    let checked = Arc::new(AtomicU64::new(0));

    let workers = cli.workers.unwrap_or_else(num_cpus::get);
    for _ in 0..workers {
        worker::spawn(index.clone(), checked.clone());
    }
    tracing::info!("spawned {workers} probe workers");

    informant::run(&checked, &index)
}
