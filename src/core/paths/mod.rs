//! Key and path helpers shared by the fetch, deliver and settle phases.

use chrono::NaiveDate;
use percent_encoding::percent_decode_str;

/// Whether an object key should be relayed.
pub fn is_eligible(object_key: &str, extension: &str) -> bool {
    object_key.ends_with(extension)
}

/// Final `/`-separated segment of an object key.
pub fn file_name(object_key: &str) -> &str {
    object_key.rsplit('/').next().unwrap_or(object_key)
}

/// Join a remote directory and file name with forward slashes only.
///
/// Backslashes in either part are rewritten to `/` and exactly one separator is placed between
/// the directory and the file name.
pub fn join_remote(directory: &str, filename: &str) -> String {
    let directory = directory.replace('\\', "/");
    let filename = filename.replace('\\', "/");
    let filename = filename.trim_start_matches('/');
    if directory.is_empty() {
        return filename.to_string();
    }
    if directory.ends_with('/') {
        format!("{}{}", directory, filename)
    } else {
        format!("{}/{}", directory, filename)
    }
}

/// Storage key an object is archived under: `<prefix>/<YYYY-MM-DD>/<filename>`.
pub fn archive_key(prefix: &str, date: NaiveDate, filename: &str) -> String {
    format!(
        "{}/{}/{}",
        prefix.trim_end_matches('/'),
        date.format("%Y-%m-%d"),
        filename
    )
}

/// Decode an object key as it appears in an S3 event notification.
///
/// Event keys are form-encoded: spaces arrive as `+` and other reserved bytes as `%XX`.
pub fn decode_event_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_is_suffix_match() {
        assert!(is_eligible("incoming/report.dat", ".dat"));
        assert!(!is_eligible("incoming/report.csv", ".dat"));
        assert!(!is_eligible("incoming/report.dat.bak", ".dat"));
        assert!(!is_eligible("incoming/REPORT.DAT", ".dat"));
    }

    #[test]
    fn test_file_name_takes_last_segment() {
        assert_eq!(file_name("incoming/2024/report.dat"), "report.dat");
        assert_eq!(file_name("report.dat"), "report.dat");
    }

    #[test]
    fn test_join_remote_normalizes_backslashes() {
        assert_eq!(join_remote("archive\\dir", "f.dat"), "archive/dir/f.dat");
        assert_eq!(join_remote("archive\\dir\\", "f.dat"), "archive/dir/f.dat");
    }

    #[test]
    fn test_join_remote_single_separator() {
        assert_eq!(join_remote("/in", "report.dat"), "/in/report.dat");
        assert_eq!(join_remote("/in/", "report.dat"), "/in/report.dat");
        assert_eq!(join_remote("", "report.dat"), "report.dat");
    }

    #[test]
    fn test_archive_key_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        assert_eq!(
            archive_key("archived", date, "report.dat"),
            "archived/2024-06-04/report.dat"
        );
        assert_eq!(
            archive_key("archived/", date, "report.dat"),
            "archived/2024-06-04/report.dat"
        );
    }

    #[test]
    fn test_decode_event_key() {
        assert_eq!(
            decode_event_key("incoming/daily+report%282%29.dat"),
            "incoming/daily report(2).dat"
        );
        assert_eq!(decode_event_key("incoming/report.dat"), "incoming/report.dat");
    }
}
