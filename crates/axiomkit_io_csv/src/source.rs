//! Row/cell source abstractions consumed by the grid normalizer.
//!
//! A sheet is read through two traits:
//! - [`SheetSource`] : indexed row access plus column visibility flags
//! - [`SheetRow`]    : one row handle (apparent width, cell text, visibility)
//!
//! [`SpecRowGrid`] is the bundled in-memory implementation.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::util::is_blank;

////////////////////////////////////////////////////////////////////////////////
// #region SourceTraits

/// One row handle yielded by a [`SheetSource`].
pub trait SheetRow {
    /// Apparent cell count reported by the source (last used column + 1).
    ///
    /// Treated as a hint only: trailing cells inside this extent may be blank.
    fn n_cells_apparent(&self) -> usize;

    /// Raw display text at `col_idx`; `""` for absent cells or indices past the extent.
    fn get_cell_text(&self, col_idx: usize) -> Cow<'_, str>;

    /// Whether the row is visible in the source sheet.
    fn is_visible(&self) -> bool {
        true
    }

    /// Real content width of this row, never below `n_width_floor`.
    ///
    /// When the apparent width exceeds `n_width_floor`, walk backward from the
    /// apparent end and stop at the first non-blank cell. Sources whose
    /// reported extents are exact may override this with `n_cells_apparent()`.
    fn derive_content_width(&self, n_width_floor: usize) -> usize {
        let mut n_width = self.n_cells_apparent();
        while n_width > n_width_floor && is_blank(&self.get_cell_text(n_width - 1)) {
            n_width -= 1;
        }
        usize::max(n_width, n_width_floor)
    }
}

/// Indexed row provider for one sheet.
pub trait SheetSource {
    /// Row handle type.
    type Row<'a>: SheetRow
    where
        Self: 'a;

    /// Number of row slots (absent rows included).
    fn n_rows(&self) -> usize;

    /// Row at zero-based `row_idx`, or `None` when the slot holds no row.
    fn get_row(&self, row_idx: usize) -> Option<Self::Row<'_>>;

    /// Whether column `col_idx` is visible in the source sheet.
    fn is_column_visible(&self, _col_idx: usize) -> bool {
        true
    }
}

/// Ordered row sequence, optionally skipping rows flagged invisible.
///
/// Absent rows are always yielded (as `None`); they normalize to blank rows.
pub fn derive_row_sequence<S: SheetSource>(
    sheet: &S,
    if_remove_invisible: bool,
) -> impl Iterator<Item = Option<S::Row<'_>>> + '_ {
    (0..sheet.n_rows())
        .map(move |row_idx| sheet.get_row(row_idx))
        .filter(move |row| match row {
            Some(row) if if_remove_invisible => row.is_visible(),
            _ => true,
        })
}

/// Ordered column indices within `[0, n_col_bound)` to materialize.
///
/// Identity range unless `if_remove_invisible` is set.
pub fn derive_visible_column_indices<S: SheetSource>(
    sheet: &S,
    n_col_bound: usize,
    if_remove_invisible: bool,
) -> Vec<usize> {
    if !if_remove_invisible {
        return (0..n_col_bound).collect();
    }
    (0..n_col_bound)
        .filter(|col_idx| sheet.is_column_visible(*col_idx))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region InMemoryGrid

/// In-memory ragged grid: absent rows, absent cells and hidden flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecRowGrid {
    /// Row slots; `None` marks an absent row, `None` cells are absent cells.
    pub rows: Vec<Option<Vec<Option<String>>>>,
    /// Zero-based row indices flagged invisible.
    pub rows_hidden: BTreeSet<usize>,
    /// Zero-based column indices flagged invisible.
    pub cols_hidden: BTreeSet<usize>,
}

impl SpecRowGrid {
    /// Build from raw row slots.
    pub fn new(rows: Vec<Option<Vec<Option<String>>>>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Build from dense string rows (every row and cell present).
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| Some(row.into_iter().map(|cell| Some(cell.into())).collect()))
                .collect(),
        )
    }

    /// Flag rows as invisible.
    pub fn with_hidden_rows(mut self, rows_hidden: impl IntoIterator<Item = usize>) -> Self {
        self.rows_hidden.extend(rows_hidden);
        self
    }

    /// Flag columns as invisible.
    pub fn with_hidden_columns(mut self, cols_hidden: impl IntoIterator<Item = usize>) -> Self {
        self.cols_hidden.extend(cols_hidden);
        self
    }
}

/// Borrowed row handle into a [`SpecRowGrid`].
#[derive(Debug, Clone, Copy)]
pub struct SpecRowGridRow<'a> {
    cells: &'a [Option<String>],
    if_visible: bool,
}

impl SheetRow for SpecRowGridRow<'_> {
    fn n_cells_apparent(&self) -> usize {
        self.cells.len()
    }

    fn get_cell_text(&self, col_idx: usize) -> Cow<'_, str> {
        match self.cells.get(col_idx) {
            Some(Some(text)) => Cow::Borrowed(text.as_str()),
            _ => Cow::Borrowed(""),
        }
    }

    fn is_visible(&self) -> bool {
        self.if_visible
    }
}

impl SheetSource for SpecRowGrid {
    type Row<'a> = SpecRowGridRow<'a>;

    fn n_rows(&self) -> usize {
        self.rows.len()
    }

    fn get_row(&self, row_idx: usize) -> Option<Self::Row<'_>> {
        let cells = self.rows.get(row_idx)?.as_deref()?;
        Some(SpecRowGridRow {
            cells,
            if_visible: !self.rows_hidden.contains(&row_idx),
        })
    }

    fn is_column_visible(&self, col_idx: usize) -> bool {
        !self.cols_hidden.contains(&col_idx)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
