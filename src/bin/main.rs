#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "StakeChain CLI".bright_cyan().bold());
    println!("{}", "--------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but most functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!(
        "  - {}  {}",
        "stake-node".bright_white(),
        "REST API + optional block producer".dimmed()
    );
    println!(
        "  - {}  {}",
        "stake-demo".bright_white(),
        "scripted wallet/funding/consensus walkthrough".dimmed()
    );
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin stake-node -- --config config.toml".italic());
    println!("{}", "  cargo run --bin stake-demo -- --seed 7 --rounds 3".italic());
}
