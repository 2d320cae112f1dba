//! Command-line argument definitions using clap derive macros.

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use sdf::{OpenOptions, SosblMode};
use std::path::{Path, PathBuf};

/// Inspect Riegl full-waveform .sdf files.
///
/// sdf-query opens a file through the vendor's libsdfifc and prints its
/// header, whole-file totals, or every pulse with its waveform blocks.
#[derive(Parser, Debug)]
#[command(name = "sdf-query")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    /// Input .sdf file
    #[arg(value_name = "FILE", required_unless_present = "library_version")]
    pub input: Option<PathBuf>,

    // ========================================================================
    // Mode Selection
    // ========================================================================
    /// What to print
    #[arg(short, long, value_enum, default_value = "summary")]
    pub mode: Mode,

    /// Print the vendor library version and exit
    #[arg(long)]
    pub library_version: bool,

    // ========================================================================
    // Reading
    // ========================================================================
    /// Report sample-block start times relative to the file
    ///
    /// Absolute times of long captures can lose precision.
    #[arg(long)]
    pub relative_time: bool,

    /// Stop the dump after this many pulses
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<u64>,

    // ========================================================================
    // Output Control
    // ========================================================================
    /// Log more detail to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output, including warnings
    #[arg(short, long)]
    pub quiet: bool,
}

/// What to print about the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// The header only
    Summary,
    /// The header plus totals from walking every pulse
    Survey,
    /// Every pulse and its sample blocks
    Dump,
}

impl Args {
    /// Validate argument combinations.
    ///
    /// The input path itself is left to the library, which reports a missing
    /// or unreadable file with its own error kind.
    pub fn validate(&self) -> Result<(), String> {
        // Quiet and verbose are mutually exclusive
        if self.quiet && self.verbose > 0 {
            return Err("Cannot use both --quiet and --verbose".to_string());
        }

        if self.limit.is_some() && self.mode != Mode::Dump {
            return Err("--limit only applies to --mode dump".to_string());
        }

        Ok(())
    }

    /// The input path; present whenever `--library-version` is not given.
    pub fn input(&self) -> Result<&Path, String> {
        self.input
            .as_deref()
            .ok_or_else(|| "Input file is required".to_string())
    }

    /// Options for opening the input file.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        if self.relative_time {
            options = options.sosbl_mode(SosblMode::Relative);
        }
        options
    }

    /// Log level chosen by `--quiet` and `--verbose`.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Off;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Example usage shown in --help.
const EXAMPLES: &str = r#"
EXAMPLES:
    # Print the header
    sdf-query 110630_174316.sdf

    # Walk every pulse and print totals
    sdf-query --mode survey 110630_174316.sdf

    # Print the first ten pulses, with relative block times
    sdf-query --mode dump -n 10 --relative-time 110630_174316.sdf

    # Show which libsdfifc is linked
    sdf-query --library-version

    # Log handle and cursor activity
    sdf-query -vv 110630_174316.sdf
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn args(mode: Mode) -> Args {
        Args {
            input: Some(PathBuf::from("scan.sdf")),
            mode,
            library_version: false,
            relative_time: false,
            limit: None,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn test_log_level() {
        let mut a = args(Mode::Summary);
        assert_eq!(a.log_level(), LevelFilter::Warn);
        a.verbose = 2;
        assert_eq!(a.log_level(), LevelFilter::Trace);
        a.verbose = 0;
        a.quiet = true;
        assert_eq!(a.log_level(), LevelFilter::Off);
    }

    #[test]
    fn test_limit_needs_dump() {
        let mut a = args(Mode::Survey);
        a.limit = Some(3);
        assert!(a.validate().unwrap_err().contains("--limit"));
    }

    #[test]
    fn test_missing_input_left_to_library() {
        let a = args(Mode::Summary);
        assert!(!a.input.as_deref().unwrap().exists());
        assert_eq!(a.validate(), Ok(()));
    }

    #[test]
    fn test_open_options() {
        let mut a = args(Mode::Dump);
        assert_eq!(a.open_options().sosbl_mode, None);
        a.relative_time = true;
        assert_eq!(a.open_options().sosbl_mode, Some(SosblMode::Relative));
    }

    #[test]
    fn test_parse() {
        let a = Args::try_parse_from(["sdf-query", "-vv", "--mode", "dump", "scan.sdf"]).unwrap();
        assert_eq!(a.verbose, 2);
        assert_eq!(a.mode, Mode::Dump);
        assert_eq!(a.input(), Ok(Path::new("scan.sdf")));

        let a = Args::try_parse_from(["sdf-query", "--library-version"]).unwrap();
        assert!(a.input.is_none());
    }
}
