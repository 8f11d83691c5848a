//! tandem demo - runs each primitive once and prints what it produced

mod config;
mod demos;

use tracing_subscriber::EnvFilter;

use crate::config::DemoConfig;

fn main() -> anyhow::Result<()> {
    let config = DemoConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("tandem {} demo", tandem::VERSION);

    println!("1. Atomic counter");
    println!("   value: {}", demos::counter(&config));

    println!("\n2. Concurrent map");
    for (key, value) in demos::map() {
        println!("   {} = {}", key, value);
    }

    println!("\n3. Worker pool");
    let report = demos::pool(&config)?;
    let cubes: Vec<i64> = report.values().copied().collect();
    println!("   cubes (completion order): {:?}", cubes);
    if let Some(reason) = report.cancel_reason() {
        println!("   stopped early: {} ({} of {})", reason, report.len(), report.submitted());
    }
    for failure in report.failures() {
        println!("   failed: {}", failure);
    }

    println!("\n4. Pipeline");
    println!("   result: {:?}", demos::pipeline()?);

    Ok(())
}
