//! Formatting utilities for file sizes, dates, and other display values.

/// Format file size for display (e.g., "1.2K", "3.4M").
///
/// `None` renders as a dash.
pub fn format_size(size: Option<u64>) -> String {
    match size {
        None => "-".to_string(),
        Some(bytes) if bytes >= 1_000_000_000 => {
            format!("{:.1}G", bytes as f64 / 1_000_000_000.0)
        }
        Some(bytes) if bytes >= 1_000_000 => format!("{:.1}M", bytes as f64 / 1_000_000.0),
        Some(bytes) if bytes >= 1_000 => format!("{:.1}K", bytes as f64 / 1_000.0),
        Some(bytes) => format!("{}B", bytes),
    }
}

/// Format a peer count ("1 peer", "3 peers").
pub fn format_peers(count: usize) -> String {
    if count == 1 {
        "1 peer".to_string()
    } else {
        format!("{} peers", count)
    }
}

/// Format Unix timestamp (seconds or milliseconds) as ISO date (YYYY-MM-DD).
///
/// Properly calculates year/month/day accounting for leap years.
pub fn format_date_iso(timestamp: u64) -> String {
    // Archive entries carry milliseconds.
    let seconds = if timestamp >= 100_000_000_000 {
        timestamp / 1000
    } else {
        timestamp
    };
    let days = seconds / 86400;
    let mut year = 1970i64;
    let mut remaining_days = days as i64;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let days_in_months: [i64; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    for days_in_month in days_in_months.iter() {
        if remaining_days < *days_in_month {
            break;
        }
        remaining_days -= days_in_month;
        month += 1;
    }

    let day = remaining_days + 1;
    format!("{:04}-{:02}-{:02}", year, month, day)
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "-");
        assert_eq!(format_size(Some(500)), "500B");
        assert_eq!(format_size(Some(1500)), "1.5K");
        assert_eq!(format_size(Some(1_500_000)), "1.5M");
        assert_eq!(format_size(Some(2_000_000_000)), "2.0G");
    }

    #[test]
    fn test_format_peers() {
        assert_eq!(format_peers(0), "0 peers");
        assert_eq!(format_peers(1), "1 peer");
        assert_eq!(format_peers(4), "4 peers");
    }

    #[test]
    fn test_format_date_iso() {
        assert_eq!(format_date_iso(0), "1970-01-01");
        assert_eq!(format_date_iso(1704067200), "2024-01-01");
        assert_eq!(format_date_iso(1704067200000), "2024-01-01");
    }
}
