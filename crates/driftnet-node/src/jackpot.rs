//! Jackpot reporting: a local append-only file plus a Telegram webhook.

use anyhow::Context;
use driftnet_crypto::Candidate;
use driftnet_utxo::TxType;
use std::fs::OpenOptions;
use std::io::Write;

const JACKPOT_FILE: &str = "jackpot.txt";

/// Record a hit. Failures are logged, never propagated: a found key must
/// not take the worker down.
pub fn report(candidate: &Candidate, tx_type: TxType) {
    let payload = payload(candidate);
    tracing::info!("JACKPOT ({tx_type}) {payload}");

    if let Err(error) = append_to_file(&payload) {
        tracing::error!("could not write jackpot file: {error}");
    }
    if let Err(error) = send_telegram(&format!("JACKPOT ({tx_type}) {payload}")) {
        tracing::error!("could not send telegram message: {error:#}");
    }
}

fn payload(candidate: &Candidate) -> String {
    format!("{}:{}", candidate.p2pkh_address(), candidate.secret_hex())
}

fn append_to_file(line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(JACKPOT_FILE)?;
    writeln!(file, "{line}")
}

/// Push the payload to the Telegram bot API. Configuration comes from the
/// `TELEGRAM_BOT_TOKEN` and `TELEGRAM_TARGET_CHAT_ID` environment variables.
fn send_telegram(text: &str) -> anyhow::Result<()> {
    let token = std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN is not set")?;
    let chat_id =
        std::env::var("TELEGRAM_TARGET_CHAT_ID").context("TELEGRAM_TARGET_CHAT_ID is not set")?;

    let response = reqwest::blocking::Client::new()
        .get(format!("https://api.telegram.org/bot{token}/sendMessage"))
        .query(&[
            ("chat_id", chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ])
        .send()?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        anyhow::bail!("telegram responded {status}: {body}");
    }
    Ok(())
}
