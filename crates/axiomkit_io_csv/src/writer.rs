//! CSV writer kernel: normalized matrices into CSV text.

use std::io::Write;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::debug;

use crate::conf::{C_CSV_FIELD_SEPARATOR, C_CSV_LINE_ENDING};
use crate::normalizer::normalize_grid_with_report;
use crate::report::ReportGrid;
use crate::source::SheetSource;
use crate::spec::{EnumQuoteMode, GridCsvError, SpecCsvConvertOptions};
use crate::util::{calculate_worker_limit, format_csv_field};

////////////////////////////////////////////////////////////////////////////////
// #region Rendering

/// Render `matrix` as CSV text.
///
/// Cells are separated by `,`, rows by the platform line ending, with no line
/// ending after the last row. An empty matrix (no rows, or a zero-width first
/// row) renders as `""`.
pub fn render_csv_text<T: AsRef<str>>(matrix: &[Vec<T>], rule_quote: EnumQuoteMode) -> String {
    if is_matrix_empty(matrix) {
        return String::new();
    }

    let n_len_hint = matrix
        .iter()
        .map(|row| row.iter().map(|cell| cell.as_ref().len() + 1).sum::<usize>() + 1)
        .sum::<usize>();
    let mut c_csv = String::with_capacity(n_len_hint);
    for (n_idx_row, row) in matrix.iter().enumerate() {
        if n_idx_row > 0 {
            c_csv.push_str(C_CSV_LINE_ENDING);
        }
        for (n_idx_col, cell) in row.iter().enumerate() {
            if n_idx_col > 0 {
                c_csv.push(C_CSV_FIELD_SEPARATOR);
            }
            c_csv.push_str(&format_csv_field(cell.as_ref(), rule_quote));
        }
    }
    c_csv
}

/// Stream the same bytes as [`render_csv_text`] into `writer`.
///
/// Returns the number of bytes written.
pub fn write_csv<W: Write, T: AsRef<str>>(
    mut writer: W,
    matrix: &[Vec<T>],
    rule_quote: EnumQuoteMode,
) -> Result<usize, GridCsvError> {
    if is_matrix_empty(matrix) {
        return Ok(0);
    }

    let mut n_bytes = 0usize;
    let mut buf_sep = [0u8; 4];
    let v_field_sep = C_CSV_FIELD_SEPARATOR.encode_utf8(&mut buf_sep).as_bytes();
    for (n_idx_row, row) in matrix.iter().enumerate() {
        if n_idx_row > 0 {
            writer.write_all(C_CSV_LINE_ENDING.as_bytes())?;
            n_bytes += C_CSV_LINE_ENDING.len();
        }
        for (n_idx_col, cell) in row.iter().enumerate() {
            if n_idx_col > 0 {
                writer.write_all(v_field_sep)?;
                n_bytes += v_field_sep.len();
            }
            let c_field = format_csv_field(cell.as_ref(), rule_quote);
            writer.write_all(c_field.as_bytes())?;
            n_bytes += c_field.len();
        }
    }
    writer.flush()?;
    Ok(n_bytes)
}

fn is_matrix_empty<T>(matrix: &[Vec<T>]) -> bool {
    matrix.first().is_none_or(|row| row.is_empty())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Conversion

/// Normalize `sheet` with `options` and return the matrix.
pub fn convert_sheet_to_matrix<S: SheetSource>(
    sheet: Option<&S>,
    options: &SpecCsvConvertOptions,
) -> Result<Vec<Vec<String>>, GridCsvError> {
    convert_sheet_with_report(sheet, options).map(|(matrix, _)| matrix)
}

/// Normalize `sheet` with `options` and render it as CSV text.
pub fn convert_sheet_to_csv<S: SheetSource>(
    sheet: Option<&S>,
    options: &SpecCsvConvertOptions,
) -> Result<String, GridCsvError> {
    let (matrix, _) = convert_sheet_with_report(sheet, options)?;
    Ok(render_csv_text(&matrix, options.rule_quote))
}

fn convert_sheet_with_report<S: SheetSource>(
    sheet: Option<&S>,
    options: &SpecCsvConvertOptions,
) -> Result<(Vec<Vec<String>>, ReportGrid), GridCsvError> {
    normalize_grid_with_report(
        sheet,
        options.rule_blank_removal(),
        options.if_remove_invisible_cells,
    )
}

/// Convert independent sheets to CSV text, in input order.
///
/// Runs on a rayon pool sized by `options.num_workers_max`; one worker (or a
/// pool that fails to start) converts serially. A failing sheet does not affect
/// the others.
pub fn convert_sheets_to_csv<S>(
    sheets: &[S],
    options: &SpecCsvConvertOptions,
) -> Vec<Result<String, GridCsvError>>
where
    S: SheetSource + Sync,
{
    let n_workers_max = calculate_worker_limit(options.num_workers_max);
    let convert_one = |sheet: &S| convert_sheet_to_csv(Some(sheet), options);

    if n_workers_max <= 1 || sheets.len() <= 1 {
        return sheets.iter().map(convert_one).collect();
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(n_workers_max).build();
    let Ok(thread_pool) = thread_pool else {
        tracing::warn!(
            n_workers_max,
            "Failed to initialize thread pool; fallback to serial conversion."
        );
        return sheets.iter().map(convert_one).collect();
    };

    debug!(n_sheets = sheets.len(), n_workers_max, "converting sheets in parallel");
    thread_pool.install(|| sheets.par_iter().map(convert_one).collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Converter

/// Stateful converter bound to one set of options.
///
/// Keeps one [`ReportGrid`] per successful conversion call.
#[derive(Debug, Clone, Default)]
pub struct CsvConverter {
    options: SpecCsvConvertOptions,
    l_reports: Vec<ReportGrid>,
}

impl CsvConverter {
    /// Create converter bound to validated options.
    pub fn new(options: SpecCsvConvertOptions) -> Self {
        Self {
            options,
            l_reports: Vec::new(),
        }
    }

    pub fn options(&self) -> &SpecCsvConvertOptions {
        &self.options
    }

    /// Return immutable snapshot of per-call reports.
    pub fn report(&self) -> Vec<ReportGrid> {
        self.l_reports.clone()
    }

    /// Normalize one sheet into a rectangular matrix.
    pub fn convert_to_matrix<S: SheetSource>(
        &mut self,
        sheet: Option<&S>,
    ) -> Result<Vec<Vec<String>>, GridCsvError> {
        let (matrix, report) = convert_sheet_with_report(sheet, &self.options)?;
        self.l_reports.push(report);
        Ok(matrix)
    }

    /// Normalize one sheet and render CSV text.
    pub fn convert_to_csv<S: SheetSource>(
        &mut self,
        sheet: Option<&S>,
    ) -> Result<String, GridCsvError> {
        let matrix = self.convert_to_matrix(sheet)?;
        Ok(render_csv_text(&matrix, self.options.rule_quote))
    }

    /// Normalize one sheet and stream CSV into `writer`.
    pub fn convert_to_writer<S: SheetSource, W: Write>(
        &mut self,
        sheet: Option<&S>,
        writer: W,
    ) -> Result<usize, GridCsvError> {
        let matrix = self.convert_to_matrix(sheet)?;
        write_csv(writer, &matrix, self.options.rule_quote)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::derive_default_csv_convert_options;
    use crate::source::SpecRowGrid;

    fn nl() -> &'static str {
        C_CSV_LINE_ENDING
    }

    #[test]
    fn test_render_empty_matrix() {
        let empty: Vec<Vec<String>> = vec![];
        assert_eq!(render_csv_text(&empty, EnumQuoteMode::Always), "");
        assert_eq!(render_csv_text(&[Vec::<String>::new()], EnumQuoteMode::Always), "");
    }

    #[test]
    fn test_render_lenient_and_never() {
        let matrix = vec![vec!["x,y"]];
        assert_eq!(render_csv_text(&matrix, EnumQuoteMode::Lenient), "\"x,y\"");
        assert_eq!(render_csv_text(&matrix, EnumQuoteMode::Never), "x,y");
    }

    #[test]
    fn test_render_separators_without_trailing_newline() {
        let matrix = vec![vec!["a", "b"], vec!["c", ""]];
        assert_eq!(
            render_csv_text(&matrix, EnumQuoteMode::Normal),
            format!("a,b{}c,", nl())
        );
    }

    #[test]
    fn test_render_always_escapes_quotes_but_skips_blanks() {
        let matrix = vec![vec!["he said \"no\"", "", "1"]];
        assert_eq!(
            render_csv_text(&matrix, EnumQuoteMode::Always),
            "\"he said \"\"no\"\"\",,\"1\""
        );
    }

    #[test]
    fn test_render_normal_mode() {
        let matrix = vec![vec!["plain", "two words", "a-b", "50%"]];
        assert_eq!(
            render_csv_text(&matrix, EnumQuoteMode::Normal),
            "plain,\"two words\",a-b,\"50%\""
        );
    }

    #[test]
    fn test_write_csv_matches_render() {
        let matrix = vec![vec!["a\"b", "c"], vec!["d", "e\nf"]];
        for rule in [
            EnumQuoteMode::Always,
            EnumQuoteMode::Normal,
            EnumQuoteMode::Lenient,
            EnumQuoteMode::Never,
        ] {
            let mut v_buf = Vec::new();
            let n_bytes = write_csv(&mut v_buf, &matrix, rule).unwrap();
            let c_text = render_csv_text(&matrix, rule);
            assert_eq!(String::from_utf8(v_buf).unwrap(), c_text);
            assert_eq!(n_bytes, c_text.len());
        }
    }

    #[test]
    fn test_convert_empty_sheet_to_empty_text() {
        let grid = SpecRowGrid::default();
        let c_csv = convert_sheet_to_csv(Some(&grid), &SpecCsvConvertOptions::default()).unwrap();
        assert_eq!(c_csv, "");
    }

    #[test]
    fn test_convert_sheet_with_options() {
        let grid = SpecRowGrid::from_rows([vec!["a", "", "b c"], vec![], vec!["d", "", "e"]]);
        let options = SpecCsvConvertOptions::builder()
            .remove_blank_rows(true)
            .remove_blank_columns(true)
            .quote_mode_str("lenient")
            .build()
            .unwrap();
        let c_csv = convert_sheet_to_csv(Some(&grid), &options).unwrap();
        assert_eq!(c_csv, format!("a,b c{}d,e", nl()));
    }

    #[test]
    fn test_convert_missing_sheet_fails() {
        let res = convert_sheet_to_csv::<SpecRowGrid>(None, &SpecCsvConvertOptions::default());
        assert!(matches!(res, Err(GridCsvError::InvalidInput(_))));
    }

    #[test]
    fn test_convert_sheets_keeps_input_order() {
        let sheets: Vec<SpecRowGrid> = (0..6)
            .map(|n_idx| SpecRowGrid::from_rows([vec![n_idx.to_string()]]))
            .collect();
        let options = SpecCsvConvertOptions {
            num_workers_max: Some(4),
            ..Default::default()
        };
        let l_csv: Vec<String> = convert_sheets_to_csv(&sheets, &options)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(l_csv, vec!["0", "1", "2", "3", "4", "5"]);

        let options_serial = SpecCsvConvertOptions {
            num_workers_max: Some(1),
            ..Default::default()
        };
        let l_csv_serial: Vec<String> = convert_sheets_to_csv(&sheets, &options_serial)
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(l_csv_serial, l_csv);
    }

    #[test]
    fn test_converter_collects_reports() {
        let mut converter = CsvConverter::new(derive_default_csv_convert_options());
        let grid = SpecRowGrid::from_rows([vec!["a", "", ""], vec!["", "", ""]]);

        let c_csv = converter.convert_to_csv(Some(&grid)).unwrap();
        assert_eq!(c_csv, "a");
        assert!(converter.convert_to_csv::<SpecRowGrid>(None).is_err());

        let mut v_buf = Vec::new();
        converter.convert_to_writer(Some(&grid), &mut v_buf).unwrap();
        assert_eq!(v_buf, b"a");

        let l_reports = converter.report();
        assert_eq!(l_reports.len(), 2);
        assert_eq!(l_reports[0].cnt_rows_trailing_trimmed, 1);
        assert_eq!(l_reports[0].cnt_cols_phantom, 2);
    }
}
