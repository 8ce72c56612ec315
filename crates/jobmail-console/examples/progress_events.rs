#![allow(clippy::uninlined_format_args)]
//! Example: progress markers and write events
//!
//! Shows a job console that:
//! 1. Prints `try_to` / `try_ok` / `try_ko` progress markers
//! 2. Mirrors every line into its buffer
//! 3. Notifies subscribers before and after each write
//!
//! ## Running
//!
//! ```bash
//! cargo run --package jobmail-console --example progress_events
//! ```

use jobmail_console::{
    Console, ConsoleConfig, ConsoleOptions, StandardConsole, UsageScenario,
};
use std::sync::{Arc, Mutex};

fn main() -> anyhow::Result<()> {
    let config = ConsoleConfig::new("Customer Import").on_init(|args| {
        println!("[init] console ready for {}", args.usage_scenario);
        Ok(())
    });

    let mut console = StandardConsole::with_config(
        UsageScenario::ConsoleApp,
        config,
        ConsoleOptions::new().with_timestamps(),
    );

    let lines = Arc::new(Mutex::new(0_usize));
    let counter = Arc::clone(&lines);
    console.events_mut().written.subscribe(move |args| {
        if args.is_line {
            *counter.lock().map_err(|e| anyhow::anyhow!("{e}"))? += 1;
        }
        Ok(())
    });
    console
        .events_mut()
        .disposing
        .subscribe(|_| Err(anyhow::anyhow!("this failure is logged, never raised")));

    console.try_to("Read customers.csv");
    console.try_ok();
    console.write_line("{0} customers imported, {1} skipped", &[&1280, &3])?;
    console.try_to("Update search index");
    console.try_ko("index server unreachable");

    console.dispose();

    println!();
    println!("Buffered report ({} lines):", lines.lock().map_or(0, |n| *n));
    println!("{}", console.buffer());
    Ok(())
}
