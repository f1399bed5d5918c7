//! Fix command - interactive port conflict resolution.

use anyhow::Result;
use portprobe_core::{ConfigStore, PortProbe, Signal};

use super::send_and_report;
use super::suggest::suggest_across;
use crate::output::{print_detailed_info, print_port_info};
use crate::prompt;

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Kill,
    Suggest,
    Detail,
    Cancel,
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim() {
        "1" => Some(Choice::Kill),
        "2" => Some(Choice::Suggest),
        "3" => Some(Choice::Detail),
        "4" => Some(Choice::Cancel),
        _ => None,
    }
}

pub fn run(port: u16) -> Result<()> {
    let probe = PortProbe::default();
    let info = probe.check(port)?;

    if info.is_free() {
        println!("Port {} is FREE", port);
        return Ok(());
    }

    print_port_info(&info);
    println!("\nChoose action:");
    println!("1. Kill the process");
    println!("2. Use alternative port (suggest free port)");
    println!("3. Show detailed process info");
    println!("4. Cancel\n");

    let Some(choice) = parse_choice(&prompt::read_line("Enter choice (1-4): ")?) else {
        println!("Invalid input");
        return Ok(());
    };

    match choice {
        Choice::Kill => match info.process() {
            Some(process) => {
                send_and_report(&probe, process.pid, Signal::Terminate);
            }
            None => eprintln!("Could not find process information"),
        },
        Choice::Suggest => {
            let config = ConfigStore::new()?.load()?;
            let suggestions = suggest_across(&probe, 3, &config.suggest_ranges)?;
            println!("\nAvailable alternative ports:");
            for port in suggestions {
                println!("  {}", port);
            }
        }
        Choice::Detail => print_detailed_info(&info),
        Choice::Cancel => println!("Cancelled"),
    }
    Ok(())
}
