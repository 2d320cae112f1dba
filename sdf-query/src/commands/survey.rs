//! Whole-file totals (--mode survey).

use anyhow::{Context, Result};
use std::path::Path;

use sdf::query;
use sdf::sdk::Sdk;
use sdf::OpenOptions;

use crate::commands::summary;
use crate::output;

/// Run the survey command.
pub fn run<S: Sdk>(sdk: S, input: &Path, options: &OpenOptions) -> Result<()> {
    let survey = query::survey_with(sdk, input, options)
        .with_context(|| format!("Failed to survey {}", input.display()))?;

    summary::print_metadata(&survey.metadata);

    output::print_header("Totals");
    output::print_kv("scan lines", &output::format_number(survey.scan_lines), 2);
    output::print_kv("pulses", &output::format_number(survey.pulses), 2);
    output::print_kv("samples", &output::format_number(survey.samples), 2);
    if let (Some(first), Some(last)) = (survey.first_time, survey.last_time) {
        output::print_kv("start time", &first.to_string(), 2);
        output::print_kv("end time", &last.to_string(), 2);
        output::print_kv("duration", &output::format_duration(last - first), 2);
    }

    if survey.pulses != survey.metadata.pulse_count {
        output::print_warning(&format!(
            "header declares {} pulses, walked {}",
            survey.metadata.pulse_count, survey.pulses
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf::sdk::memory::{Fault, Fixture, MemorySdk};
    use sdf::sdk::HandleKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_survey_of_fixture() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[3, 2]));
        run(sdk.clone(), tmp.path(), &OpenOptions::new()).unwrap();
        assert_eq!(sdk.ledger().live(), 0);
    }

    #[test]
    fn test_survey_error_keeps_library_error() {
        let tmp = NamedTempFile::new().unwrap();
        let sdk = MemorySdk::new(Fixture::with_pulses_per_line(&[3]));
        sdk.inject(Fault::Close(HandleKind::File, 6));

        let err = run(sdk, tmp.path(), &OpenOptions::new()).unwrap_err();
        let sdf_err = err.downcast_ref::<sdf::Error>().unwrap();
        assert_eq!(sdf_err.code(), Some(6));
    }
}
