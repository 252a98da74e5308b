//! Command line interface.

use clap::Parser;
use std::path::PathBuf;

/// Scan random private keys against an indexed UTXO set.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a Bitcoin Core `dumptxoutset` snapshot.
    pub snapshot: PathBuf,

    /// Path to the lookup table file; created and populated on first run.
    pub table: PathBuf,

    /// Index directory bit width of the lookup table.
    #[arg(long, default_value_t = 28)]
    pub index_bits: u32,

    /// Number of probe worker threads; defaults to one per CPU.
    #[arg(long)]
    pub workers: Option<usize>,
}
