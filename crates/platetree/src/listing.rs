//! Listing lines and the objects they describe.
//!
//! A listing line looks like `2021-11-02 18:36:12    5310570 jump/source_6/...`:
//! date, time, byte size, then the object path, which takes the remainder of
//! the line and may itself contain blanks.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static SLASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").expect("valid regex"));

/// Date patterns tried against a batch id, most specific first.
static DATE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(\d{2}_\d{2}_\d{2})", "%y_%m_%d"),
        (r"(\d{4}_\d{2}_\d{2})", "%Y_%m_%d"),
        (r"(\d{8})", "%Y%m%d"),
        (r"(\d{6})", "%y%m%d"),
    ]
    .into_iter()
    .map(|(rgx, fmt)| (Regex::new(rgx).expect("valid regex"), fmt))
    .collect()
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An object in the archive, as described by one listing line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct S3Object {
    /// Path first so that sorting orders objects by location.
    pub path: String,
    #[serde(rename = "date")]
    pub timestamp: String,
    pub size: u64,
}

impl S3Object {
    pub fn new<T: Into<String>, P: Into<String>>(timestamp: T, size: u64, path: P) -> Self {
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            size,
        }
    }

    /// Parse a listing line into an object.
    ///
    /// Runs of slashes in the path collapse to a single `/`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\n', '\r']).trim_start();
        let fields: Vec<&str> = BLANKS.splitn(line, 4).collect();
        let [date, time, size, path] = fields.as_slice() else {
            return Err(Error::path_format(format!(
                "Expected \"<date> <time> <size> <path>\", got {} field(s)",
                fields.len()
            )));
        };
        let size: u64 = size
            .parse()
            .map_err(|_| Error::path_format(format!("Invalid object size: {size}")))?;
        let path = SLASHES.replace_all(path, "/");

        Ok(Self::new(format!("{date} {time}"), size, path))
    }

    /// The listing timestamp as a calendar instant, when it is well formed.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

impl fmt::Display for S3Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Extract the capture date encoded in a batch folder name.
///
/// Tries `yy_mm_dd`, `yyyy_mm_dd`, `yyyymmdd` and `yymmdd` in that order,
/// taking the last candidate of each pattern in the name. A candidate that
/// is not a real calendar date falls through to the next pattern.
pub fn extract_date(batch_id: &str) -> Option<NaiveDate> {
    DATE_PATTERNS.iter().find_map(|(rgx, fmt)| {
        let candidate = rgx.find_iter(batch_id).last()?;
        NaiveDate::parse_from_str(candidate.as_str(), fmt).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let obj = S3Object::parse(
            "2021-11-02 18:36:12    5310570 jump/source_6/workspace/analysis/Cells.csv\n",
        )
        .unwrap();
        assert_eq!(obj.timestamp, "2021-11-02 18:36:12");
        assert_eq!(obj.size, 5310570);
        assert_eq!(obj.path, "jump/source_6/workspace/analysis/Cells.csv");
        assert_eq!(
            obj.parsed_timestamp(),
            NaiveDate::from_ymd_opt(2021, 11, 2).and_then(|d| d.and_hms_opt(18, 36, 12))
        );
    }

    #[test]
    fn test_path_keeps_blanks_and_collapses_slashes() {
        let obj =
            S3Object::parse("2022-01-14 11:41:28 10 jump//source_2///images/My Batch/x.tif")
                .unwrap();
        assert_eq!(obj.path, "jump/source_2/images/My Batch/x.tif");
        assert_eq!(obj.path.split('/').nth(3), Some("My Batch"));
    }

    #[test]
    fn test_parse_rejects_short_and_bad_size() {
        let err = S3Object::parse("2021-12-06 15:38:47 11").unwrap_err();
        assert!(matches!(err, Error::PathFormat(_)));

        let err = S3Object::parse("2021-12-06 15:38:47 PRE jump/source_8/").unwrap_err();
        assert_eq!(err.to_string(), "Invalid object size: PRE");
    }

    #[test]
    fn test_extract_date() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(extract_date("2021_05_31_U2OS_48_hr_run1"), ymd(2021, 5, 31));
        assert_eq!(extract_date("20210607_Batch_2"), ymd(2021, 6, 7));
        assert_eq!(
            extract_date("JUMPCPE-20210623-Run01_20210624_003152"),
            ymd(2021, 6, 24)
        );
        assert_eq!(extract_date("p210830CPU2OS48hw384exp023JUMP"), ymd(2021, 8, 30));
        assert_eq!(extract_date("Batch2"), None);
        assert_eq!(extract_date("CP_25_all_Phenix1"), None);
    }
}
