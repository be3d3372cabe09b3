/// VoteChain Daemon - ledger administration
///
/// Admin and debug surface for the vote ledger:
/// - Submits pre-hashed vote payloads to the chain
/// - Reports per-candidate tallies and chain statistics
/// - Verifies chain integrity and dumps the full chain for inspection
///
/// Registration, authentication, and identity hashing live in external
/// collaborators; this binary only ever sees fingerprints.
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, Level};

use votechain_common::{CandidateId, LedgerConfig, VoterFingerprint};
use votechain_core::{JsonFileStore, LedgerService, LedgerStats, VotePayload};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // `--config <path>` may appear before the command
    let mut config_path: Option<PathBuf> = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            bail!("--config requires a path");
        }
        config_path = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let command = args.first().cloned().unwrap_or_else(|| "help".to_string());

    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_help();
            return Ok(());
        }
        "version" | "--version" | "-v" => {
            println!("VoteChain Daemon v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(config_path)?;

    tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    info!("Starting VoteChain Daemon v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(JsonFileStore::new(&config.chain_path));
    let ledger = LedgerService::open(&config, store);

    match command.as_str() {
        "cast" => cast_vote(&ledger, &args[1..]).await?,
        "tally" => print_tally(&ledger).await,
        "verify" => verify_chain(&ledger).await,
        "dump" => dump_chain(&ledger).await?,
        "stats" => print_stats(&ledger.stats().await),
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Run with 'help' to see available commands");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Load configuration from an explicit path, the default location, or
/// defaults
fn load_config(config_path: Option<PathBuf>) -> Result<LedgerConfig> {
    if let Some(path) = config_path {
        return Ok(LedgerConfig::from_file(&path)?);
    }

    let default_path = PathBuf::from("votechain.toml");
    if default_path.exists() {
        Ok(LedgerConfig::from_file(&default_path)?)
    } else {
        Ok(LedgerConfig::default())
    }
}

/// Submit one pre-hashed vote to the ledger
async fn cast_vote(ledger: &LedgerService, args: &[String]) -> Result<()> {
    let (fingerprint, candidate) = match args {
        [fingerprint, candidate, ..] => (fingerprint, candidate),
        _ => bail!("usage: votechain-daemon cast <fingerprint-hex> <candidate-id> [faculty]"),
    };

    let fingerprint = VoterFingerprint::from_hex(fingerprint)?;
    let candidate = CandidateId::from_str(candidate)?;

    let mut payload = VotePayload::new(fingerprint, candidate);
    if let Some(faculty) = args.get(2) {
        payload = payload.with_faculty(faculty.clone());
    }

    let block = ledger.cast_vote(payload).await?;

    println!("Vote recorded");
    println!("  Block:  #{}", block.index);
    println!("  Hash:   {}", block.hash);
    println!("  Nonce:  {}", block.nonce);
    Ok(())
}

/// Print per-candidate counts, highest first
async fn print_tally(ledger: &LedgerService) {
    let mut counts: Vec<_> = ledger.tally().await.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    if counts.is_empty() {
        println!("No votes recorded yet");
        return;
    }

    println!("Votes by candidate:");
    for (candidate, votes) in counts {
        println!("  {:<24} {}", candidate.as_str(), votes);
    }
}

/// Run the integrity scan, exiting non-zero on corruption
async fn verify_chain(ledger: &LedgerService) {
    match ledger.verify().await {
        Ok(()) => println!("Chain is valid"),
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Recovery: discard the chain document and start a fresh chain");
            std::process::exit(1);
        }
    }
}

/// Pretty-print the full chain for admin inspection
async fn dump_chain(ledger: &LedgerService) -> Result<()> {
    let blocks = ledger.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&blocks)?);
    Ok(())
}

/// Print ledger statistics
fn print_stats(stats: &LedgerStats) {
    println!("\n========================================");
    println!("         VoteChain Ledger Status");
    println!("========================================");
    println!("Blocks:       {}", stats.blocks);
    println!("Votes:        {}", stats.votes);
    println!("Difficulty:   {}", stats.difficulty);
    println!("========================================\n");
}

/// Print help message
fn print_help() {
    println!("VoteChain Daemon - Vote Ledger Administration");
    println!();
    println!("USAGE:");
    println!("    votechain-daemon [--config <path>] [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    cast <fingerprint-hex> <candidate-id> [faculty]");
    println!("                Record a vote; the fingerprint must already be a");
    println!("                one-way digest of the voter's identity");
    println!("    tally       Show per-candidate vote counts");
    println!("    verify      Check chain integrity (exits 1 on corruption)");
    println!("    dump        Print the full chain as JSON");
    println!("    stats       Show chain statistics");
    println!("    help        Show this help message");
    println!("    version     Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    votechain-daemon tally");
    println!("    votechain-daemon cast 9f86d081884c7d65... candidate-42 engineering");
}
