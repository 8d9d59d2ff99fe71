//! Polars `DataFrame` as a [`SheetSource`].
//!
//! Every frame row is present and visible, every column is visible, and the
//! apparent row width is the frame width. Nulls read as blank cells.

use std::borrow::Cow;
use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::source::{SheetRow, SheetSource};
use crate::spec::GridCsvError;

/// Borrowed row handle into a [`DataFrame`].
#[derive(Debug, Clone, Copy)]
pub struct SpecFrameRow<'a> {
    df: &'a DataFrame,
    row_idx: usize,
}

impl SheetRow for SpecFrameRow<'_> {
    fn n_cells_apparent(&self) -> usize {
        self.df.width()
    }

    fn get_cell_text(&self, col_idx: usize) -> Cow<'_, str> {
        let Some(col) = self.df.get_columns().get(col_idx) else {
            return Cow::Borrowed("");
        };
        match col.get(self.row_idx) {
            Ok(value) => derive_cell_text_from_any_value(value),
            Err(_) => Cow::Borrowed(""),
        }
    }
}

impl SheetSource for DataFrame {
    type Row<'a> = SpecFrameRow<'a>;

    fn n_rows(&self) -> usize {
        self.height()
    }

    fn get_row(&self, row_idx: usize) -> Option<Self::Row<'_>> {
        (row_idx < self.height()).then_some(SpecFrameRow { df: self, row_idx })
    }
}

/// Decode Polars IPC bytes into a [`DataFrame`].
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, GridCsvError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| GridCsvError::Frame(format!("Failed to read IPC DataFrame bytes: {err}")))
}

/// Display text of one frame value.
///
/// String values are returned verbatim (no debug quoting), nulls are blank and
/// booleans follow the Python spelling used by the rest of the toolkit.
pub fn derive_cell_text_from_any_value(value: AnyValue<'_>) -> Cow<'static, str> {
    match value {
        AnyValue::Null => Cow::Borrowed(""),
        AnyValue::String(val) => Cow::Owned(val.to_string()),
        AnyValue::StringOwned(val) => Cow::Owned(val.to_string()),
        AnyValue::Boolean(val) => Cow::Borrowed(if val { "True" } else { "False" }),
        AnyValue::UInt8(val) => Cow::Owned(val.to_string()),
        AnyValue::UInt16(val) => Cow::Owned(val.to_string()),
        AnyValue::UInt32(val) => Cow::Owned(val.to_string()),
        AnyValue::UInt64(val) => Cow::Owned(val.to_string()),
        AnyValue::Int8(val) => Cow::Owned(val.to_string()),
        AnyValue::Int16(val) => Cow::Owned(val.to_string()),
        AnyValue::Int32(val) => Cow::Owned(val.to_string()),
        AnyValue::Int64(val) => Cow::Owned(val.to_string()),
        AnyValue::Float32(val) => Cow::Owned(val.to_string()),
        AnyValue::Float64(val) => Cow::Owned(val.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IpcWriter, SerWriter};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::normalizer::normalize_grid;
    use crate::spec::{EnumBlankRemovalMode, EnumQuoteMode};
    use crate::writer::render_csv_text;

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("name".into(), &[Some("a,b"), None, Some("c")]),
            Column::new("empty".into(), &[None::<&str>, None, None]),
            Column::new("n".into(), &[Some(1i64), None, Some(3)]),
            Column::new("flag".into(), &[Some(true), None, Some(false)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_frame_cells_read_as_display_text() {
        let df = sample_frame();
        let row = df.get_row(0).unwrap();
        assert_eq!(row.n_cells_apparent(), 4);
        assert_eq!(row.get_cell_text(0), "a,b");
        assert_eq!(row.get_cell_text(1), "");
        assert_eq!(row.get_cell_text(2), "1");
        assert_eq!(row.get_cell_text(3), "True");
        assert_eq!(row.get_cell_text(9), "");
        assert!(df.get_row(3).is_none());
    }

    #[test]
    fn test_frame_normalizes_like_any_sheet() {
        let df = sample_frame();
        let matrix =
            normalize_grid(Some(&df), EnumBlankRemovalMode::RowsAndColumns, false).unwrap();
        assert_eq!(
            matrix,
            vec![
                vec!["a,b".to_string(), "1".to_string(), "True".to_string()],
                vec!["c".to_string(), "3".to_string(), "False".to_string()],
            ]
        );
        assert_eq!(
            render_csv_text(&matrix, EnumQuoteMode::Lenient).lines().next(),
            Some("\"a,b\",1,True")
        );
    }

    #[test]
    fn test_ipc_bytes_roundtrip_into_frame() {
        let mut df = sample_frame();
        let mut v_ipc = Vec::new();
        IpcWriter::new(&mut v_ipc).finish(&mut df).unwrap();

        let df_decoded = derive_dataframe_from_ipc_bytes(&v_ipc).unwrap();
        assert_eq!(df_decoded.shape(), (3, 4));
        assert!(matches!(
            derive_dataframe_from_ipc_bytes(b"not ipc"),
            Err(GridCsvError::Frame(_))
        ));
    }
}
