//! Config command - show or change the persisted configuration.

use anyhow::{anyhow, Context, Result};
use portprobe_core::{Config, ConfigStore, PortRange};

use crate::output::print_json;

pub fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store.load()?;

    if json {
        return print_json(&config);
    }

    println!("Config file: {}", store.path().display());
    println!();

    let ports: Vec<String> = config.dev_ports.iter().map(u16::to_string).collect();
    println!("Scan ports: {}", ports.join(", "));

    let ranges: Vec<String> = config.suggest_ranges.iter().map(|r| r.to_string()).collect();
    println!("Suggest ranges: {}", ranges.join(", "));
    println!("Suggest count: {}", config.suggest_count);

    Ok(())
}

pub fn set_ports(ports: Vec<u16>) -> Result<()> {
    let store = ConfigStore::new()?;
    update(&store, |config| config.dev_ports = ports)?;
    println!("Updated scan ports in {}", store.path().display());
    Ok(())
}

pub fn set_ranges(ranges: &[String]) -> Result<()> {
    let ranges = ranges
        .iter()
        .map(|r| parse_range(r))
        .collect::<Result<Vec<_>>>()?;
    let store = ConfigStore::new()?;
    update(&store, |config| config.suggest_ranges = ranges)?;
    println!("Updated suggest ranges in {}", store.path().display());
    Ok(())
}

pub fn set_count(count: usize) -> Result<()> {
    let store = ConfigStore::new()?;
    update(&store, |config| config.suggest_count = count)?;
    println!("Updated suggest count in {}", store.path().display());
    Ok(())
}

pub fn reset() -> Result<()> {
    let store = ConfigStore::new()?;
    store.save(&Config::default())?;
    println!("Restored defaults in {}", store.path().display());
    Ok(())
}

/// Load, apply `change`, save.
fn update(store: &ConfigStore, change: impl FnOnce(&mut Config)) -> Result<Config> {
    let mut config = store.load()?;
    change(&mut config);
    store.save(&config)?;
    Ok(config)
}

/// Parse `START-END`, or a single port as a one-port range.
fn parse_range(s: &str) -> Result<PortRange> {
    let (start, end) = s.trim().split_once('-').unwrap_or((s, s));
    let parse = |p: &str| {
        p.trim()
            .parse::<u16>()
            .with_context(|| format!("invalid port in range '{}'", s))
    };
    PortRange::new(parse(start)?, parse(end)?).map_err(|e| anyhow!("{}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_range() {
        let range = parse_range("3000-3999").unwrap();
        assert_eq!((range.start(), range.end()), (3000, 3999));

        let single = parse_range("8080").unwrap();
        assert_eq!((single.start(), single.end()), (8080, 8080));

        assert!(parse_range("4000-3000").is_err());
        assert!(parse_range("0-10").is_err());
        assert!(parse_range("abc-10").is_err());
        assert!(parse_range("70000").is_err());
    }

    #[test]
    fn test_update_persists_changes() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::with_path(dir.path().join("config.json"));

        update(&store, |config| config.dev_ports = vec![1234, 5678]).unwrap();
        update(&store, |config| config.suggest_count = 2).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.dev_ports, vec![1234, 5678]);
        assert_eq!(loaded.suggest_count, 2);
        assert_eq!(loaded.suggest_ranges, Config::default().suggest_ranges);
    }
}
