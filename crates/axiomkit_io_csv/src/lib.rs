//! `axiomkit_io_csv` v1:
//! Rust-side sheet-to-CSV kernel.
//!
//! Data flows `source`/`frame` -> `normalizer` -> `writer`; the Python bridge
//! lives in the sibling `axiomkit_io_csv_py` crate.
//!
//! Modules:
//! - `conf`       : constants and default presets
//! - `spec`       : enums/options/errors
//! - `source`     : row/cell source traits and the in-memory grid
//! - `frame`      : Polars `DataFrame` source
//! - `normalizer` : ragged rows into a rectangular matrix
//! - `report`     : run-time report model
//! - `util`       : pure helper functions (blank test, quoting, pruning)
//! - `writer`     : CSV rendering and conversion entry points
pub mod conf;
pub mod frame;
pub mod normalizer;
pub mod report;
pub mod source;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_CSV_FIELD_SEPARATOR, C_CSV_LINE_ENDING, C_QUOTE_NORMAL_THRESHOLD, TUP_CSV_LENIENT_TRIGGERS,
};
pub use frame::{SpecFrameRow, derive_dataframe_from_ipc_bytes};
pub use normalizer::{normalize_grid, normalize_grid_with_report};
pub use report::{ReportGrid, ReportGridBuilder};
pub use source::{
    SheetRow, SheetSource, SpecRowGrid, SpecRowGridRow, derive_row_sequence,
    derive_visible_column_indices,
};
pub use spec::{
    EnumBlankRemovalMode, EnumQuoteMode, GridCsvError, SpecCsvConvertOptions,
    SpecCsvConvertOptionsBuilder,
};
pub use util::{is_blank, prune_blank_columns, should_quote};
pub use writer::{
    CsvConverter, convert_sheet_to_csv, convert_sheet_to_matrix, convert_sheets_to_csv,
    render_csv_text, write_csv,
};
