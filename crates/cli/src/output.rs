//! Output formatting utilities

use chrono::Duration;
use colored::Colorize;

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Format millicores with the `m` unit
pub fn format_milli(millicores: i64) -> String {
    format!("{}m", millicores)
}

/// Format mebibytes with the `Mi` unit
pub fn format_mebi(mebibytes: i64) -> String {
    format!("{}Mi", mebibytes)
}

/// Format a usage percentage with two decimals
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Color a usage percentage: red when bursting past requests, yellow when
/// close, plain otherwise
pub fn color_percent(percent: f64) -> String {
    let formatted = format_percent(percent);
    if percent > 100.0 {
        formatted.red().to_string()
    } else if percent >= 80.0 {
        formatted.yellow().to_string()
    } else {
        formatted
    }
}

/// Format a startup duration like `42s` or `1m30s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds();
    if secs.abs() >= 60 {
        format!("{}m{}s", secs / 60, (secs % 60).abs())
    } else {
        format!("{}s", secs)
    }
}

/// Format an optional startup duration, `0s` when unknown
pub fn format_optional_duration(duration: Option<Duration>) -> String {
    format_duration(duration.unwrap_or_else(Duration::zero))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_in_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::seconds(42)), "42s");
        assert_eq!(format_duration(Duration::seconds(90)), "1m30s");
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_optional_duration(None), "0s");
    }

    #[test]
    fn units_are_suffixed() {
        assert_eq!(format_milli(130), "130m");
        assert_eq!(format_mebi(123), "123Mi");
        assert_eq!(format_percent(66.666), "66.67%");
    }
}
