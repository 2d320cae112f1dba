//! Header summary (--mode summary).

use anyhow::{Context, Result};
use std::path::Path;

use sdf::sdk::Sdk;
use sdf::{query, Metadata};

use crate::output;

/// Run the summary command.
pub fn run<S: Sdk>(sdk: S, input: &Path) -> Result<()> {
    let metadata = query::summarize(sdk, input)
        .with_context(|| format!("Failed to read header of {}", input.display()))?;
    print_metadata(&metadata);
    Ok(())
}

/// Print header fields, as shared by the summary and survey commands.
pub fn print_metadata(metadata: &Metadata) {
    output::print_header(&format!("{}", metadata.path.display()));
    output::print_kv("instrument", &metadata.instrument, 2);
    output::print_kv("serial", &metadata.serial, 2);
    output::print_kv("epoch", &metadata.epoch, 2);
    output::print_kv("format version", &metadata.format_version.to_string(), 2);
    output::print_kv("group velocity", &format!("{} m/s", metadata.v_group), 2);
    output::print_kv("sampling time", &format!("{} s", metadata.sampling_time), 2);
    output::print_kv("gps synchronized", &metadata.gps_synchronized.to_string(), 2);
    output::print_kv("number of facets", &metadata.num_facets.to_string(), 2);
    output::print_kv("capture time", &metadata.capture_time.to_string(), 2);
    output::print_kv("pulses", &output::format_number(metadata.pulse_count), 2);
    if let Some(count) = metadata.scan_line_count {
        output::print_kv("scan lines", &output::format_number(count), 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf::sdk::memory::{Fixture, MemorySdk};
    use tempfile::NamedTempFile;

    #[test]
    fn test_summary_of_fixture() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[2, 2]));
        run(sdk.clone(), tmp.path()).unwrap();
        assert_eq!(sdk.ledger().live(), 0);
    }
}
