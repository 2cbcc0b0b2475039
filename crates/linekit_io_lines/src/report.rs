//! Line-copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Counters and diagnostics for one successful copy run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportLineCopy {
    /// Lines fetched from the source.
    pub cnt_lines_read: u64,
    /// Lines committed to the destination (line text plus terminator).
    pub cnt_lines_written: u64,
    /// Bytes handed to the destination, terminators included.
    pub cnt_bytes_written: u64,
    /// Copy was skipped by the destination conflict policy.
    pub if_skipped: bool,
    /// Non-fatal warnings (metadata preservation, etc.).
    pub warnings: Vec<String>,
}

impl ReportLineCopy {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_lines_read".to_string(), self.cnt_lines_read);
        dict_counts.insert("cnt_lines_written".to_string(), self.cnt_lines_written);
        dict_counts.insert("cnt_bytes_written".to_string(), self.cnt_bytes_written);
        dict_counts.insert("cnt_skipped".to_string(), u64::from(self.if_skipped));
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} lines_read={} lines_written={} bytes_written={} skipped={} warnings={}",
            dict_counts["cnt_lines_read"],
            dict_counts["cnt_lines_written"],
            dict_counts["cnt_bytes_written"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportLineCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for line-copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportLineCopyBuilder {
    /// See [`ReportLineCopy::cnt_lines_read`].
    pub cnt_lines_read: u64,
    /// See [`ReportLineCopy::cnt_lines_written`].
    pub cnt_lines_written: u64,
    /// See [`ReportLineCopy::cnt_bytes_written`].
    pub cnt_bytes_written: u64,
    /// See [`ReportLineCopy::if_skipped`].
    pub if_skipped: bool,
}

impl ReportLineCopyBuilder {
    /// Increment read count by one.
    pub fn add_read(&mut self) {
        self.cnt_lines_read += 1;
    }

    /// Record one committed line of `n_bytes` bytes.
    pub fn add_written(&mut self, n_bytes: usize) {
        self.cnt_lines_written += 1;
        self.cnt_bytes_written += n_bytes as u64;
    }

    /// Mark the run as skipped.
    pub fn set_skipped(&mut self) {
        self.if_skipped = true;
    }

    /// Finalize builder into immutable report.
    ///
    /// Warnings start empty; the file-level entry points append metadata
    /// warnings after the copy.
    pub fn build(self) -> ReportLineCopy {
        ReportLineCopy {
            cnt_lines_read: self.cnt_lines_read,
            cnt_lines_written: self.cnt_lines_written,
            cnt_bytes_written: self.cnt_bytes_written,
            if_skipped: self.if_skipped,
            warnings: Vec::new(),
        }
    }
}
