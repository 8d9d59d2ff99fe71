//! Grid normalizer: ragged, sparse sheet rows into a rectangular string matrix.

use tracing::debug;

use crate::report::{ReportGrid, ReportGridBuilder};
use crate::source::{SheetRow, SheetSource, derive_row_sequence, derive_visible_column_indices};
use crate::spec::{EnumBlankRemovalMode, GridCsvError};
use crate::util::{is_blank, is_row_blank, prune_columns};

/// Normalize `sheet` into a rectangular matrix.
///
/// See [`normalize_grid_with_report`] for the full contract.
pub fn normalize_grid<S: SheetSource>(
    sheet: Option<&S>,
    rule_blank_removal: EnumBlankRemovalMode,
    if_remove_invisible_cells: bool,
) -> Result<Vec<Vec<String>>, GridCsvError> {
    normalize_grid_with_report(sheet, rule_blank_removal, if_remove_invisible_cells)
        .map(|(matrix, _)| matrix)
}

/// Normalize `sheet` into a rectangular matrix and report what was dropped.
///
/// This function performs:
/// 1. Width discovery: one pass over rows, trusting each row's apparent width
///    only as far as its last non-blank cell (see [`SheetRow::derive_content_width`]).
/// 2. Column selection over `[0, width)`, skipping invisible columns on request.
/// 3. Row materialization of the selected columns; absent rows become blank rows.
/// 4. Blank-row skipping and incremental column usage tracking.
/// 5. Trailing blank-row trimming (always) and blank-column pruning (on request).
///
/// Every output row has the same length and the last row, if any, holds at
/// least one non-blank cell. Returns [`GridCsvError::InvalidInput`] only when
/// `sheet` is `None`; ragged, absent or hidden rows are never errors.
pub fn normalize_grid_with_report<S: SheetSource>(
    sheet: Option<&S>,
    rule_blank_removal: EnumBlankRemovalMode,
    if_remove_invisible_cells: bool,
) -> Result<(Vec<Vec<String>>, ReportGrid), GridCsvError> {
    let Some(sheet) = sheet else {
        return Err(GridCsvError::InvalidInput(
            "Sheet reference is missing.".to_string(),
        ));
    };
    let mut builder_report = ReportGridBuilder::default();

    let (n_col_max, n_col_apparent_max) = discover_width(sheet, if_remove_invisible_cells);
    builder_report.add_phantom_cols(n_col_apparent_max.saturating_sub(n_col_max) as u64);

    let l_cols_idx = derive_visible_column_indices(sheet, n_col_max, if_remove_invisible_cells);
    builder_report.add_hidden_cols((n_col_max - l_cols_idx.len()) as u64);
    debug!(
        n_rows = sheet.n_rows(),
        n_col_max,
        n_col_apparent_max,
        n_cols_selected = l_cols_idx.len(),
        "grid width discovered"
    );

    if l_cols_idx.is_empty() && n_col_max > 0 {
        builder_report.add_warning(format!(
            "All {n_col_max} columns are hidden; sheet normalizes to an empty matrix."
        ));
    }

    let n_width = l_cols_idx.len();
    let if_track_cols = rule_blank_removal.if_remove_columns();
    let mut l_if_col_has_data = vec![false; if if_track_cols { n_width } else { 0 }];
    let mut n_cols_with_data = 0usize;

    let mut matrix: Vec<Vec<String>> = Vec::new();
    let mut n_rows_yielded = 0usize;
    for row in derive_row_sequence(sheet, if_remove_invisible_cells) {
        n_rows_yielded += 1;
        builder_report.add_scanned();
        let row_out = match row {
            Some(row) => materialize_row(&row, &l_cols_idx),
            None => {
                builder_report.add_absent();
                vec![String::new(); n_width]
            }
        };

        if rule_blank_removal.if_remove_rows() && is_row_blank(&row_out) {
            builder_report.add_blank_skipped();
            continue;
        }

        if if_track_cols && n_cols_with_data < n_width {
            for (if_has_data, cell) in l_if_col_has_data.iter_mut().zip(&row_out) {
                if !*if_has_data && !is_blank(cell) {
                    *if_has_data = true;
                    n_cols_with_data += 1;
                }
            }
        }

        matrix.push(row_out);
    }
    builder_report.add_hidden_rows(sheet.n_rows().saturating_sub(n_rows_yielded) as u64);

    while matrix.last().is_some_and(|row| is_row_blank(row)) {
        matrix.pop();
        builder_report.add_trailing_trimmed();
    }

    if if_track_cols && n_cols_with_data < n_width && !matrix.is_empty() {
        let n_cols_dropped = prune_columns(&mut matrix, &l_if_col_has_data);
        builder_report.add_blank_cols_pruned(n_cols_dropped as u64);
    }

    let report = builder_report.build(&matrix);
    debug!(
        n_rows_out = report.n_rows_out,
        n_cols_out = report.n_cols_out,
        "grid normalized"
    );
    Ok((matrix, report))
}

/// Width discovery pass.
///
/// Returns `(content width, largest apparent width)`. The content width only
/// grows, and only as far as a row's last non-blank cell.
fn discover_width<S: SheetSource>(sheet: &S, if_remove_invisible_cells: bool) -> (usize, usize) {
    let mut n_col_max = 0usize;
    let mut n_col_apparent_max = 0usize;
    for row in derive_row_sequence(sheet, if_remove_invisible_cells).flatten() {
        let n_cells_apparent = row.n_cells_apparent();
        n_col_apparent_max = usize::max(n_col_apparent_max, n_cells_apparent);
        if n_cells_apparent > n_col_max {
            n_col_max = row.derive_content_width(n_col_max);
        }
    }
    (n_col_max, n_col_apparent_max)
}

/// Read the selected columns of one row; indices past its extent are blank.
fn materialize_row<R: SheetRow>(row: &R, l_cols_idx: &[usize]) -> Vec<String> {
    let n_cells_apparent = row.n_cells_apparent();
    l_cols_idx
        .iter()
        .map(|&col_idx| {
            if col_idx < n_cells_apparent {
                row.get_cell_text(col_idx).into_owned()
            } else {
                String::new()
            }
        })
        .collect()
}
