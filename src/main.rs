//! Ethereum Vanity Address Generator CLI
//!
//! Usage:
//!   vanity-eth -p dead                       # address starting with "dead"
//!   vanity-eth -s beef                       # address ending with "beef"
//!   vanity-eth -c cafe -n 3                  # 3 addresses containing "cafe"
//!   vanity-eth -p 'x(a|b|c)(10|20)' -s c0ffee
//!   vanity-eth -r '^0x(dead|cafe)'

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use tracing_subscriber::EnvFilter;

use vanity_eth::difficulty::{self, format_duration, format_number};
use vanity_eth::output;
use vanity_eth::{Args, Config, OutputFormat, SearchHandle, SearchOutcome, VanityResult};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config()?;
    let text = args.format == OutputFormat::Text;

    let estimate = difficulty::estimate(
        &config.prefix,
        &config.suffix,
        &config.contains,
        config.case_sensitive,
    )?;

    if text {
        println!("Ethereum Vanity Address Generator");
        println!("==================================");
        println!(
            "Workers:    {}  •  Target: {} address(es)",
            config.workers, config.count
        );
        println!("Pattern:    {}", describe_pattern(&config));
        if let Some(d) = &estimate {
            println!("Difficulty: ~1 in {} addresses match", d);
        }
        println!();
    }

    let search = SearchHandle::spawn(config.clone())?;

    let stop = search.stop_signal();
    ctrlc::set_handler(move || stop.stop()).context("setting Ctrl-C handler")?;

    if text {
        println!("Searching... (Press Ctrl+C to stop)");
    }

    let report_interval = Duration::from_secs(args.report_interval.max(1));
    let mut collected = Vec::new();

    loop {
        match search.recv_timeout(report_interval) {
            Ok(result) => {
                collected.push(result);
                if text {
                    print_result(&collected[collected.len() - 1], collected.len(), &search);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if text {
                    print_progress(&search, estimate.as_ref());
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let total = search.total_keys();
    let elapsed = search.elapsed();
    let rate = search.keys_per_second();
    let outcome = search.join()?;

    match args.format {
        OutputFormat::Json => println!("{}", output::to_json(&collected)?),
        OutputFormat::Text => {
            if outcome == SearchOutcome::Cancelled {
                println!("\r\x1b[K\nStopped by user.");
            }
            println!(
                "\ndone  found {}/{}  •  {} tried  •  {:.0} addr/s  •  {:.3}s",
                collected.len(),
                config.count,
                format_number(total),
                rate,
                elapsed.as_secs_f64(),
            );
        }
    }

    if let Some(path) = &args.output {
        match output::save_to_file(path, &collected) {
            Ok(()) => eprintln!("saved to {}", path.display()),
            Err(e) => eprintln!("error saving file: {}", e),
        }
    }

    Ok(())
}

fn describe_pattern(config: &Config) -> String {
    let mut parts = Vec::new();
    for (name, value) in [
        ("prefix", &config.prefix),
        ("suffix", &config.suffix),
        ("contains", &config.contains),
    ] {
        if !value.is_empty() {
            parts.push(format!("{}={:?}", name, value));
        }
    }
    if let Some(regex) = &config.regex {
        parts.push(format!("regex={:?}", regex));
    }
    if config.case_sensitive {
        parts.push("case-sensitive".into());
    }
    parts.join("  ")
}

fn print_result(result: &VanityResult, index: usize, search: &SearchHandle) {
    println!(
        "\r\x1b[K\n✓  #{} found after {} ({:.0} addr/s)",
        index,
        format_number(search.total_keys()),
        search.keys_per_second()
    );
    println!("  Address:     {}", result.address);
    println!("  Private key: 0x{}", result.private_key);
    println!();
}

fn print_progress(search: &SearchHandle, estimate: Option<&num_bigint::BigUint>) {
    let found = search.total_matches().min(search.target() as u64);
    let remaining = search.target() as u64 - found;
    let rate = search.keys_per_second();

    let eta = estimate
        .and_then(|d| difficulty::eta(d, remaining, rate))
        .map(|eta| format!("  •  ETA {}", format_duration(eta)))
        .unwrap_or_default();

    print!(
        "\r\x1b[K{} tried  •  {}/{} found  •  {:.0} addr/s  •  {}{}",
        format_number(search.total_keys()),
        found,
        search.target(),
        rate,
        format_duration(search.elapsed()),
        eta
    );
    let _ = std::io::stdout().flush();
}
