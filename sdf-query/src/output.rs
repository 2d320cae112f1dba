//! Terminal output formatting utilities.

use colored::Colorize;

/// Print an error message to stderr.
///
/// Library errors anywhere in the chain add their kind and, when the vendor
/// reported one, the raw status code.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{}: {}", "error".red().bold(), err);

    // Print cause chain
    for cause in err.chain().skip(1) {
        eprintln!("  {}: {}", "caused by".red(), cause);
    }

    if let Some(sdf_err) = err.chain().find_map(|c| c.downcast_ref::<sdf::Error>()) {
        eprintln!("  {}: {}", "kind".red(), describe(sdf_err));
    }
}

fn describe(err: &sdf::Error) -> String {
    match err.code() {
        Some(code) => format!("{} (vendor code {})", err.kind(), code),
        None => err.kind().to_string(),
    }
}

/// Print a warning message to stderr.
pub fn print_warning(msg: &str) {
    eprintln!("{}: {}", "warning".yellow().bold(), msg);
}

/// Print a header line.
pub fn print_header(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Print a key-value pair.
pub fn print_kv(key: &str, value: &str, indent: usize) {
    let padding = " ".repeat(indent);
    println!("{}{}: {}", padding, key.dimmed(), value);
}

/// Print a separator line.
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// Format a number with thousands separators.
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    result
}

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.2}s", seconds)
    } else {
        let mins = (seconds / 60.0).floor();
        let secs = seconds % 60.0;
        format!("{}m {:.1}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(1.5), "1.50s");
        assert_eq!(format_duration(90.0), "1m 30.0s");
    }

    #[test]
    fn test_describe_includes_vendor_code() {
        assert_eq!(
            describe(&sdf::Error::native(6, "boom")),
            "native-failure (vendor code 6)"
        );
        assert_eq!(describe(&sdf::Error::corrupt("bad")), "corrupt");
        assert_eq!(
            describe(&sdf::Error::corrupt_with_code(2, "bad magic")),
            "corrupt (vendor code 2)"
        );
    }
}
