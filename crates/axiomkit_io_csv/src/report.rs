//! Normalization report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one normalization run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportGrid {
    /// Row slots read by the row pass, absent rows included.
    ///
    /// Rows skipped as invisible are not read and land in `cnt_rows_hidden`.
    pub cnt_rows_scanned: u64,
    /// Row slots that held no row and were read as blank.
    pub cnt_rows_absent: u64,
    /// Rows skipped because the source flagged them invisible.
    pub cnt_rows_hidden: u64,
    /// Blank rows skipped by row pruning.
    pub cnt_rows_blank_skipped: u64,
    /// Blank rows trimmed from the end of the matrix.
    pub cnt_rows_trailing_trimmed: u64,
    /// Apparent trailing columns discarded by width discovery.
    pub cnt_cols_phantom: u64,
    /// Columns skipped because the source flagged them invisible.
    pub cnt_cols_hidden: u64,
    /// Blank columns removed by column pruning.
    pub cnt_cols_blank_pruned: u64,
    /// Final matrix height.
    pub n_rows_out: u64,
    /// Final matrix width.
    pub n_cols_out: u64,
    /// Non-fatal warnings collected during normalization.
    pub warnings: Vec<String>,
}

impl ReportGrid {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_scanned".to_string(), self.cnt_rows_scanned);
        dict_counts.insert("cnt_rows_absent".to_string(), self.cnt_rows_absent);
        dict_counts.insert("cnt_rows_hidden".to_string(), self.cnt_rows_hidden);
        dict_counts.insert(
            "cnt_rows_blank_skipped".to_string(),
            self.cnt_rows_blank_skipped,
        );
        dict_counts.insert(
            "cnt_rows_trailing_trimmed".to_string(),
            self.cnt_rows_trailing_trimmed,
        );
        dict_counts.insert("cnt_cols_phantom".to_string(), self.cnt_cols_phantom);
        dict_counts.insert("cnt_cols_hidden".to_string(), self.cnt_cols_hidden);
        dict_counts.insert(
            "cnt_cols_blank_pruned".to_string(),
            self.cnt_cols_blank_pruned,
        );
        dict_counts.insert("n_rows_out".to_string(), self.n_rows_out);
        dict_counts.insert("n_cols_out".to_string(), self.n_cols_out);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} shape={}x{} scanned={} absent={} hidden_rows={} blank_rows={} trailing={} phantom_cols={} hidden_cols={} blank_cols={} warnings={}",
            self.n_rows_out,
            self.n_cols_out,
            self.cnt_rows_scanned,
            self.cnt_rows_absent,
            self.cnt_rows_hidden,
            self.cnt_rows_blank_skipped,
            self.cnt_rows_trailing_trimmed,
            self.cnt_cols_phantom,
            self.cnt_cols_hidden,
            self.cnt_cols_blank_pruned,
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[GRID]"))
    }
}

/// Mutable accumulator for normalization statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportGridBuilder {
    report: ReportGrid,
}

impl ReportGridBuilder {
    pub fn add_scanned(&mut self) {
        self.report.cnt_rows_scanned += 1;
    }

    pub fn add_absent(&mut self) {
        self.report.cnt_rows_absent += 1;
    }

    pub fn add_hidden_rows(&mut self, value: u64) {
        self.report.cnt_rows_hidden += value;
    }

    pub fn add_blank_skipped(&mut self) {
        self.report.cnt_rows_blank_skipped += 1;
    }

    pub fn add_trailing_trimmed(&mut self) {
        self.report.cnt_rows_trailing_trimmed += 1;
    }

    pub fn add_phantom_cols(&mut self, value: u64) {
        self.report.cnt_cols_phantom += value;
    }

    pub fn add_hidden_cols(&mut self, value: u64) {
        self.report.cnt_cols_hidden += value;
    }

    pub fn add_blank_cols_pruned(&mut self, value: u64) {
        self.report.cnt_cols_blank_pruned += value;
    }

    /// Add warning message (mirrored to the `tracing` warn level).
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!(target: "axiomkit_io_csv", "{warning}");
        self.report.warnings.push(warning);
    }

    /// Finalize builder into immutable report with the output shape.
    pub fn build(mut self, matrix: &[Vec<String>]) -> ReportGrid {
        self.report.n_rows_out = matrix.len() as u64;
        self.report.n_cols_out = matrix.first().map_or(0, |row| row.len() as u64);
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportGrid, ReportGridBuilder};

    #[test]
    fn report_grid_to_dict_and_format() {
        let report = ReportGrid {
            cnt_rows_scanned: 6,
            cnt_rows_absent: 1,
            cnt_rows_hidden: 1,
            cnt_rows_blank_skipped: 2,
            cnt_rows_trailing_trimmed: 0,
            cnt_cols_phantom: 3,
            cnt_cols_hidden: 0,
            cnt_cols_blank_pruned: 1,
            n_rows_out: 3,
            n_cols_out: 2,
            warnings: vec!["w".to_string()],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_rows_scanned"], 6);
        assert_eq!(dict_counts["cnt_cols_phantom"], 3);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[GRID]");
        assert_eq!(
            txt,
            "[GRID] shape=3x2 scanned=6 absent=1 hidden_rows=1 blank_rows=2 trailing=0 phantom_cols=3 hidden_cols=0 blank_cols=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn report_grid_builder_records_output_shape() {
        let mut builder = ReportGridBuilder::default();
        builder.add_scanned();
        builder.add_scanned();
        builder.add_absent();
        builder.add_warning("careful");

        let matrix = vec![vec!["a".to_string(), "b".to_string()]];
        let report = builder.build(&matrix);
        assert_eq!(report.cnt_rows_scanned, 2);
        assert_eq!(report.cnt_rows_absent, 1);
        assert_eq!((report.n_rows_out, report.n_cols_out), (1, 2));
        assert_eq!(report.warnings, vec!["careful".to_string()]);
    }
}
