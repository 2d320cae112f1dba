//! Pulse dump (--mode dump).

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use sdf::sdk::Sdk;
use sdf::{OpenOptions, SdfFile};

use crate::output;

/// Run the dump command, printing at most `limit` pulses.
pub fn run<S: Sdk>(sdk: S, input: &Path, options: &OpenOptions, limit: Option<u64>) -> Result<()> {
    let mut file = SdfFile::open_with(sdk, input, options)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let dumped = dump(&mut file, limit)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    file.close()
        .with_context(|| format!("Failed to close {}", input.display()))?;

    info!("Dumped {} pulses", dumped);
    Ok(())
}

fn dump<S: Sdk>(file: &mut SdfFile<S>, limit: Option<u64>) -> sdf::Result<u64> {
    let limit = limit.unwrap_or(u64::MAX);
    let mut dumped = 0;

    let mut lines = file.scan_lines()?;
    while dumped < limit {
        let Some(line) = lines.try_next()? else {
            break;
        };
        output::print_header(&format!(
            "Scan line {} (facet {}, {} pulses)",
            line.index, line.facet, line.pulse_count
        ));

        let mut pulses = lines.pulses()?;
        while dumped < limit {
            let Some(pulse) = pulses.try_next()? else {
                break;
            };
            output::print_separator();
            println!("{}", pulse);
            for (i, block) in pulse.waveform.blocks().iter().enumerate() {
                println!("\nBlock {}", i);
                println!("{}", block);
            }
            dumped += 1;
        }
    }
    Ok(dumped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf::sdk::memory::{Fixture, MemorySdk};
    use sdf::sdk::HandleKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dump_everything() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[2, 3]));
        let mut file = SdfFile::open(sdk.clone(), tmp.path()).unwrap();

        assert_eq!(dump(&mut file, None).unwrap(), 5);
    }

    #[test]
    fn test_dump_limit_stops_early() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[2, 3, 4]));
        let mut file = SdfFile::open(sdk.clone(), tmp.path()).unwrap();

        assert_eq!(dump(&mut file, Some(3)).unwrap(), 3);
        // Only the first two scan lines were entered.
        assert_eq!(sdk.ledger().acquired(HandleKind::PulseCursor), 2);
        file.close().unwrap();
        assert_eq!(sdk.ledger().live(), 0);
    }

    #[test]
    fn test_run_releases_handles() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[1]));
        run(sdk.clone(), tmp.path(), &OpenOptions::new(), Some(10)).unwrap();
        assert_eq!(sdk.ledger().live(), 0);
    }
}
