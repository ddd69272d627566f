#![forbid(unsafe_code)]
//! Scripted walkthrough: wallets, a rejected transfer, faucet funding and
//! several rounds of leader election and voting, all in one process.

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use stakechain::config::{Config, ConsensusConfig};
use stakechain::ledger::{Ledger, ProcessedBlock, FAUCET_ADDRESS};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed for leader election and vote sampling.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Transfer rounds to run after the initial funding block.
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Amount issued to the first wallet by the faucet.
    #[arg(long, default_value_t = 100)]
    funding: i64,
}

fn header(text: &str) -> Cell {
    Cell::new(text)
        .fg(TableColor::Cyan)
        .add_attribute(Attribute::Bold)
}

fn report_block(processed: &ProcessedBlock) {
    let verdict = if processed.consensus_reached {
        "ratified".green()
    } else {
        "not ratified".red()
    };
    println!(
        "  block #{} ({} tx) leader={} {}",
        processed.index,
        processed.transactions,
        processed.leader.as_deref().unwrap_or("-").bright_white(),
        verdict
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = Config {
        consensus: ConsensusConfig {
            rng_seed: Some(cli.seed),
        },
        ..Config::default()
    };
    let mut ledger = Ledger::from_config(&config)?;

    println!("{}", "StakeChain demo".bright_cyan().bold());
    println!();

    let alice = ledger.create_wallet(Some("alice".to_string())).address;
    let bob = ledger.create_wallet(Some("bob".to_string())).address;
    println!("{} {}", "wallet:".bright_white(), alice);
    println!("{} {}", "wallet:".bright_white(), bob);
    println!();

    match ledger.create_transaction(&alice, &bob, 10) {
        Ok(_) => println!("{}", "unexpected: unfunded transfer accepted".red()),
        Err(e) => println!("{} {} ({})", "rejected:".yellow(), e, e.kind()),
    }

    ledger.fund(&alice, cli.funding)?;
    report_block(&ledger.process_block()?);

    let bar = ProgressBar::new(u64::from(cli.rounds));
    bar.set_style(ProgressStyle::with_template(
        "  {bar:30.cyan/blue} {pos}/{len} {msg}",
    )?);

    let mut produced = Vec::new();
    for round in 0..cli.rounds {
        let (from, to) = if round % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        match ledger.create_transaction(from, to, 10) {
            Ok(tx) => bar.set_message(format!("tx {}", &tx.id[..8])),
            Err(e) => bar.set_message(format!("skipped: {}", e.kind())),
        }
        if ledger.pending_count() > 0 {
            produced.push(ledger.process_block()?);
        }
        bar.inc(1);
    }
    bar.finish_with_message("done");

    for processed in &produced {
        report_block(processed);
    }
    println!();

    let mut balances = Table::new();
    balances
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![header("Address"), header("Balance")]);
    for (address, balance) in ledger.balances().ranked() {
        let color = if address == FAUCET_ADDRESS {
            TableColor::Grey
        } else {
            TableColor::White
        };
        balances.add_row(vec![
            Cell::new(&address).fg(color),
            Cell::new(balance).fg(color),
        ]);
    }
    println!("{}", balances);

    let mut validators = Table::new();
    validators
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header("Name"),
            header("Stake"),
            header("Blocks"),
            header("Reputation"),
            header("Active"),
        ]);
    let leader_id = ledger.current_leader().map(|l| l.id.clone());
    for v in ledger.get_all_validators() {
        let color = if Some(&v.id) == leader_id.as_ref() {
            TableColor::Green
        } else {
            TableColor::White
        };
        validators.add_row(vec![
            Cell::new(&v.name).fg(color),
            Cell::new(v.stake),
            Cell::new(v.blocks_validated),
            Cell::new(v.reputation),
            Cell::new(if v.is_active { "yes" } else { "no" }),
        ]);
    }
    println!("{}", validators);

    let info = ledger.chain_info();
    println!(
        "{} length={} valid={}",
        "chain:".bright_white(),
        info.length,
        if info.is_valid { "yes".green() } else { "NO".red() }
    );

    Ok(())
}
