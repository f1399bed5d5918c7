//! Scan command - check the configured development ports.

use anyhow::Result;
use portprobe_core::{ConfigStore, PortProbe};

use crate::output::{format_age, print_json, status_symbol};

pub fn run(json: bool) -> Result<()> {
    let config = ConfigStore::new()?.load()?;
    let results = PortProbe::default().scan(&config.dev_ports)?;

    if json {
        return print_json(&results);
    }

    println!("Scanning common development ports...\n");

    let now = chrono::Utc::now();
    let mut busy = 0;
    for info in &results {
        print!("{} {:>5} - ", status_symbol(info.status()), info.port());
        if info.is_free() {
            println!("FREE");
            continue;
        }

        busy += 1;
        match info.process() {
            Some(p) => {
                print!("USED by {} (PID {})", p.name, p.pid);
                if let Some(started) = p.start_time {
                    print!(" [{}]", format_age(started, now));
                }
                println!();
            }
            None => println!("USED by unknown (PID ?)"),
        }
    }

    println!(
        "\nSummary: {} ports busy, {} ports free",
        busy,
        results.len() - busy
    );
    Ok(())
}
