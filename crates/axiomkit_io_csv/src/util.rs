//! Stateless helper utilities shared by the normalizer and the CSV writer.

use std::borrow::Cow;

use crate::conf::{
    C_CSV_QUOTE, C_CSV_QUOTE_ESCAPED, C_QUOTE_NORMAL_THRESHOLD, TUP_CSV_LENIENT_TRIGGERS,
};
use crate::spec::EnumQuoteMode;

////////////////////////////////////////////////////////////////////////////////
// #region BlankDetection

/// Single blank predicate used for usage tracking, pruning and quoting.
#[inline]
pub fn is_blank(value: &str) -> bool {
    value.is_empty()
}

/// Whether every cell of `row` is blank (an empty row counts as blank).
pub fn is_row_blank<T: AsRef<str>>(row: &[T]) -> bool {
    row.iter().all(|cell| is_blank(cell.as_ref()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Quoting

/// Decide whether `value` must be wrapped in quotes under `rule_quote`.
///
/// Blank values are never quoted, not even under [`EnumQuoteMode::Always`].
pub fn should_quote(value: &str, rule_quote: EnumQuoteMode) -> bool {
    if rule_quote == EnumQuoteMode::Never || is_blank(value) {
        return false;
    }
    match rule_quote {
        EnumQuoteMode::Always => true,
        EnumQuoteMode::Normal => value.chars().any(|chr| chr < C_QUOTE_NORMAL_THRESHOLD),
        EnumQuoteMode::Lenient => value.contains(TUP_CSV_LENIENT_TRIGGERS),
        EnumQuoteMode::Never => false,
    }
}

/// Double embedded quote characters. Borrows when there is nothing to escape.
pub fn escape_csv_quotes(value: &str) -> Cow<'_, str> {
    if value.contains(C_CSV_QUOTE) {
        Cow::Owned(value.replace(C_CSV_QUOTE, C_CSV_QUOTE_ESCAPED))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render one field: quoted+escaped when the policy asks for it, raw otherwise.
pub fn format_csv_field(value: &str, rule_quote: EnumQuoteMode) -> Cow<'_, str> {
    if !should_quote(value, rule_quote) {
        return Cow::Borrowed(value);
    }
    let c_escaped = escape_csv_quotes(value);
    let mut c_field = String::with_capacity(c_escaped.len() + 2);
    c_field.push(C_CSV_QUOTE);
    c_field.push_str(&c_escaped);
    c_field.push(C_CSV_QUOTE);
    Cow::Owned(c_field)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnPruning

/// Keep only columns flagged in `l_if_col_keep`, preserving left-to-right order.
///
/// Returns the number of dropped columns. Rows shorter than the flag vector
/// only lose the cells they actually have.
pub fn prune_columns(matrix: &mut [Vec<String>], l_if_col_keep: &[bool]) -> usize {
    let n_cols_dropped = l_if_col_keep.iter().filter(|if_keep| !**if_keep).count();
    if n_cols_dropped == 0 {
        return 0;
    }
    for row in matrix.iter_mut() {
        let mut n_idx_col = 0usize;
        row.retain(|_| {
            let if_keep = l_if_col_keep.get(n_idx_col).copied().unwrap_or(true);
            n_idx_col += 1;
            if_keep
        });
    }
    n_cols_dropped
}

/// Drop every all-blank column of a rectangular matrix.
///
/// Returns the number of dropped columns.
pub fn prune_blank_columns(matrix: &mut [Vec<String>]) -> usize {
    let Some(n_width) = matrix.first().map(Vec::len) else {
        return 0;
    };
    let mut l_if_col_has_data = vec![false; n_width];
    for row in matrix.iter() {
        for (n_idx_col, cell) in row.iter().enumerate().take(n_width) {
            if !is_blank(cell) {
                l_if_col_has_data[n_idx_col] = true;
            }
        }
    }
    prune_columns(matrix, &l_if_col_has_data)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Clamp requested worker count to `[1, available_parallelism]`.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
