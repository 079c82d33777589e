//! Solana Vanity Address Search CLI
//!
//! Usage:
//!   sol_vanity -p AAAAA                  # Find 100 addresses starting with "AAAAA"
//!   sol_vanity -p So1 -p ?ool -n 5       # Stop after 5 matches of either pattern
//!   sol_vanity -p abc --seed <64 hex>    # Reproducible run

use std::process;

use anyhow::Context;
use clap::Parser;

use sol_vanity::{AbortFlag, Cli, Match, SearchScheduler};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match cli.to_search_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    // Print startup info
    println!("Solana Vanity Address Search");
    println!("============================");
    for pattern in config.patterns.iter() {
        println!("Pattern:    {} ({})", pattern, pattern.difficulty_description());
    }
    println!("Units:      {} per pass", config.units_per_pass);
    println!("Workers:    {}", cli.worker_count());
    println!(
        "Budget:     {} pass(es) x {} attempts",
        config.max_iterations,
        format_number(config.attempts_per_pass())
    );
    println!("Target:     {} key(s)", config.stop_after_keys_found);
    println!("Run seed:   {}", hex::encode(config.run_seed));
    println!();

    let mut scheduler = SearchScheduler::ed25519(config, cli.worker_count())
        .context("failed to start search")?;

    let abort = AbortFlag::new();
    let handler_flag = abort.clone();
    ctrlc::set_handler(move || handler_flag.raise())
        .context("failed to set Ctrl-C handler")?;

    println!("Searching... (Press Ctrl+C to stop after the current pass)\n");

    let mut found = 0;
    let mut failure = None;

    while !scheduler.state().is_terminal() {
        if abort.is_raised() {
            scheduler.abort();
            println!("\nStopped by user.");
            break;
        }

        match scheduler.step() {
            Ok(summary) => {
                for m in summary.matches {
                    found += 1;
                    print_result(m, found, cli.json)?;
                }
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
        print_progress(&scheduler);
    }

    let report = scheduler.finish();

    println!("\n--- Final Statistics ---");
    println!("Termination:          {:?}", report.termination);
    println!("Passes completed:     {}", report.state.current_pass());
    println!(
        "Total keys generated: {}",
        format_number(report.state.total_attempts())
    );
    println!("Total matches found:  {}", report.state.total_found());
    println!(
        "Time elapsed:         {:.2}s",
        report.state.elapsed().as_secs_f64()
    );
    println!(
        "Average speed:        {}/s",
        format_number(report.state.keys_per_second() as u64)
    );

    match failure {
        Some(e) => Err(e).context("search run failed"),
        None => Ok(()),
    }
}

fn print_result(m: &Match, index: usize, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(&m.to_record())?);
        return Ok(());
    }

    println!("=== Match #{} ===", index);
    println!("Address:     {}", m.address);
    println!("Secret Key:  {}", m.keypair.to_base58());
    println!(
        "Found at:    pass {}, unit {}, attempt {}",
        m.pass, m.unit, m.attempt
    );
    println!();
    Ok(())
}

fn print_progress<D: sol_vanity::KeyDeriver>(scheduler: &SearchScheduler<D>) {
    let state = scheduler.run_state();

    println!(
        "[{:>4}s] Pass {} | {} keys ({}/s) | {} found",
        state.elapsed().as_secs(),
        state.current_pass(),
        format_number(state.total_attempts()),
        format_number(state.keys_per_second() as u64),
        state.total_found()
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
