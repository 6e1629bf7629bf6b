#![forbid(unsafe_code)]
//! Demo driver: submit transfers, mine them and show the resulting chain.

use clap::Parser;
use colored::*;
use comfy_table::Table;
use minichain::balances::BalanceSheet;
use minichain::config::load_config;
use minichain::crypto::KeyPair;
use minichain::error::BalanceError;
use minichain::miner::{CancelFlag, PublicKeys};
use minichain::transaction::{Identity, Transfer};
use minichain::{Ledger, MineOutcome};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "minichain", about = "Mine signed transfers into a proof-of-work chain")]
struct Cli {
    /// Path to a TOML config file; defaults are used when it does not exist.
    #[arg(short, long, default_value = "minichain.toml")]
    config: PathBuf,

    /// Override the configured difficulty.
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Override the configured transaction limit.
    #[arg(short = 'l', long)]
    transaction_limit: Option<usize>,

    /// Print the chain as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Steps to run in order: `SENDER:RECEIVER:AMOUNT` submits a transfer,
    /// `mine` mines the pool. Anything left pending is mined at the end.
    steps: Vec<String>,
}

fn parse_transfer(step: &str) -> Option<Transfer> {
    let mut parts = step.splitn(3, ':');
    let sender = parts.next()?;
    let receiver = parts.next()?;
    let amount = parts.next()?.replace(',', ".").parse::<f64>().ok()?;
    Some(Transfer::new(sender, receiver, amount))
}

fn mine(ledger: &Ledger, keys: &PublicKeys, sheet: &mut BalanceSheet) -> Result<(), Box<dyn std::error::Error>> {
    match ledger.mine_blocking(keys, &CancelFlag::new())? {
        MineOutcome::Mined(summary) => {
            println!(
                "{} block {} with {} transaction(s), nonce {}",
                "Mined".bright_green().bold(),
                summary.index,
                summary.transactions,
                summary.nonce
            );
            if summary.dropped > 0 {
                println!("{} {} invalid transaction(s)", "Dropped".yellow(), summary.dropped);
            }
        }
        MineOutcome::NoPendingTransactions => println!("{}", "No pending transactions to mine.".yellow()),
        MineOutcome::NoValidTransactions { dropped } => {
            println!("{} ({} dropped)", "No valid transactions to mine.".yellow(), dropped)
        }
    }
    sheet.sync(&ledger.export_chain(), &ledger.pending_transactions());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if let Some(limit) = cli.transaction_limit {
        config.transaction_limit = limit;
    }

    let ledger = Ledger::new(&config)?;
    let wallets: BTreeMap<Identity, KeyPair> = config
        .participants
        .iter()
        .map(|name| (name.clone(), KeyPair::generate()))
        .collect();
    let keys: PublicKeys = wallets
        .iter()
        .map(|(name, kp)| (name.clone(), kp.public_key))
        .collect();
    let mut sheet = BalanceSheet::for_participants(&config.participants, &config.opening_balances);

    println!("{}", "minichain".bright_cyan().bold());
    println!("{}", "---------".bright_cyan());

    for step in &cli.steps {
        if step.eq_ignore_ascii_case("mine") {
            mine(&ledger, &keys, &mut sheet)?;
            continue;
        }

        let Some(transfer) = parse_transfer(step) else {
            println!("{} {}", "Invalid step, expected SENDER:RECEIVER:AMOUNT:".red(), step);
            continue;
        };

        if let Err(e @ BalanceError::InsufficientFunds { .. }) = sheet.covers(&transfer) {
            println!("{} {}", "Refused:".red(), e);
            continue;
        }

        // Unknown senders have no wallet; the ledger reports the rejection.
        let signer = wallets
            .get(&transfer.sender)
            .cloned()
            .unwrap_or_else(KeyPair::generate);
        match ledger.submit_transaction(&transfer.sender, &transfer.receiver, transfer.amount, &signer) {
            Ok(accepted) => {
                println!("{} {}", "Queued:".green(), accepted.text);
                if let Some(evicted) = accepted.evicted {
                    println!("{} {}", "Pruned oldest:".yellow(), evicted.text);
                }
            }
            Err(reason) => println!("{} {}", "Rejected:".red(), reason),
        }
        sheet.sync(&ledger.export_chain(), &ledger.pending_transactions());
    }

    if ledger.pending_len() > 0 {
        mine(&ledger, &keys, &mut sheet)?;
    }

    let chain = ledger.export_chain();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
    } else {
        let mut table = Table::new();
        table.set_header(vec!["#", "Hash", "Previous", "Timestamp", "Nonce", "Data"]);
        for block in &chain {
            table.add_row(vec![
                block.index.to_string(),
                block.hash.clone(),
                block.prev_hash.clone(),
                block.timestamp.to_string(),
                block.nonce.to_string(),
                block.data.clone(),
            ]);
        }
        println!("{table}");
    }

    match ledger.validate_chain() {
        Ok(()) => println!("{}", "Blockchain is valid.".bright_green()),
        Err(e) => println!("{} {}", "Blockchain is invalid:".red().bold(), e),
    }

    for (name, balance) in sheet.committed_balances() {
        println!("{}'s balance: {:.2}", name.bright_white(), balance);
    }

    Ok(())
}
