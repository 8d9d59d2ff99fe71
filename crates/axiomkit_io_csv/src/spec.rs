//! Grid/CSV specification models and top-level error types.

use std::fmt;
use std::str::FromStr;

use crate::conf::{ENUM_QUOTE_MODE_DEFAULT, TUP_QUOTE_MODE_NAMES};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// CSV field quoting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumQuoteMode {
    /// Quote every non-blank value.
    Always,
    /// Quote values containing any character that sorts below `'-'`.
    #[default]
    Normal,
    /// Quote only values containing `"`, `,`, tab, CR or LF.
    Lenient,
    /// Never quote (values are emitted raw).
    Never,
}

impl EnumQuoteMode {
    /// Lowercase rule name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Normal => "normal",
            Self::Lenient => "lenient",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for EnumQuoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumQuoteMode {
    type Err = GridCsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "normal" => Ok(Self::Normal),
            "lenient" => Ok(Self::Lenient),
            "never" => Ok(Self::Never),
            _ => Err(GridCsvError::Configuration(format!(
                "quote mode must be one of: {}; got {s:?}.",
                TUP_QUOTE_MODE_NAMES.join(", ")
            ))),
        }
    }
}

/// Which fully-blank lines are dropped during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumBlankRemovalMode {
    /// Keep blank rows and columns (trailing blank rows are still trimmed).
    #[default]
    None,
    /// Drop all-blank rows.
    Rows,
    /// Drop all-blank columns.
    Columns,
    /// Drop both.
    RowsAndColumns,
}

impl EnumBlankRemovalMode {
    /// Combine the two independent toggles into one mode.
    pub fn from_flags(if_remove_rows: bool, if_remove_columns: bool) -> Self {
        match (if_remove_rows, if_remove_columns) {
            (false, false) => Self::None,
            (true, false) => Self::Rows,
            (false, true) => Self::Columns,
            (true, true) => Self::RowsAndColumns,
        }
    }

    pub fn if_remove_rows(&self) -> bool {
        matches!(self, Self::Rows | Self::RowsAndColumns)
    }

    pub fn if_remove_columns(&self) -> bool {
        matches!(self, Self::Columns | Self::RowsAndColumns)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConvertOptions

/// Options for one grid-to-CSV conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCsvConvertOptions {
    /// Drop rows whose cells are all blank.
    pub if_remove_blank_rows: bool,
    /// Drop columns whose cells are all blank.
    pub if_remove_blank_columns: bool,
    /// Skip rows and columns the source flags as invisible.
    pub if_remove_invisible_cells: bool,
    /// Field quoting policy used by the renderer.
    pub rule_quote: EnumQuoteMode,
    /// Maximum worker threads for multi-sheet conversion.
    pub num_workers_max: Option<usize>,
}

impl Default for SpecCsvConvertOptions {
    fn default() -> Self {
        Self {
            if_remove_blank_rows: false,
            if_remove_blank_columns: false,
            if_remove_invisible_cells: false,
            rule_quote: ENUM_QUOTE_MODE_DEFAULT,
            num_workers_max: None,
        }
    }
}

impl SpecCsvConvertOptions {
    /// Start a validating builder seeded with defaults.
    pub fn builder() -> SpecCsvConvertOptionsBuilder {
        SpecCsvConvertOptionsBuilder::default()
    }

    /// Blank-removal mode derived from the row/column toggles.
    pub fn rule_blank_removal(&self) -> EnumBlankRemovalMode {
        EnumBlankRemovalMode::from_flags(self.if_remove_blank_rows, self.if_remove_blank_columns)
    }
}

/// Builder for [`SpecCsvConvertOptions`].
///
/// Invalid values are recorded as they are set and reported by [`Self::build`],
/// so configuration errors never reach conversion time. The last quote-mode
/// setter wins, including over an earlier bad name.
#[derive(Debug, Clone)]
pub struct SpecCsvConvertOptionsBuilder {
    if_remove_blank_rows: bool,
    if_remove_blank_columns: bool,
    if_remove_invisible_cells: bool,
    rule_quote: Result<EnumQuoteMode, String>,
    num_workers_max: Option<usize>,
}

impl Default for SpecCsvConvertOptionsBuilder {
    fn default() -> Self {
        Self {
            if_remove_blank_rows: false,
            if_remove_blank_columns: false,
            if_remove_invisible_cells: false,
            rule_quote: Ok(ENUM_QUOTE_MODE_DEFAULT),
            num_workers_max: None,
        }
    }
}

impl SpecCsvConvertOptionsBuilder {
    pub fn remove_blank_rows(mut self, value: bool) -> Self {
        self.if_remove_blank_rows = value;
        self
    }

    pub fn remove_blank_columns(mut self, value: bool) -> Self {
        self.if_remove_blank_columns = value;
        self
    }

    pub fn remove_invisible_cells(mut self, value: bool) -> Self {
        self.if_remove_invisible_cells = value;
        self
    }

    /// Set the quote mode; `None` leaves it unset and fails at build time.
    pub fn quote_mode(mut self, value: Option<EnumQuoteMode>) -> Self {
        self.rule_quote = value.ok_or_else(|| "quote mode must be set.".to_string());
        self
    }

    /// Set the quote mode by name (`always`, `normal`, `lenient`, `never`).
    pub fn quote_mode_str(mut self, value: &str) -> Self {
        self.rule_quote = value.parse::<EnumQuoteMode>().map_err(|err| match err {
            GridCsvError::Configuration(msg) => msg,
            other => other.to_string(),
        });
        self
    }

    pub fn num_workers_max(mut self, value: Option<usize>) -> Self {
        self.num_workers_max = value;
        self
    }

    /// Validate and finalize.
    pub fn build(self) -> Result<SpecCsvConvertOptions, GridCsvError> {
        let rule_quote = self.rule_quote.map_err(GridCsvError::Configuration)?;
        if self.num_workers_max == Some(0) {
            return Err(GridCsvError::Configuration(
                "num_workers_max must be >= 1 or None.".to_string(),
            ));
        }

        Ok(SpecCsvConvertOptions {
            if_remove_blank_rows: self.if_remove_blank_rows,
            if_remove_blank_columns: self.if_remove_blank_columns,
            if_remove_invisible_cells: self.if_remove_invisible_cells,
            rule_quote,
            num_workers_max: self.num_workers_max,
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// "Conversion call failed" errors.
#[derive(Debug, thiserror::Error)]
pub enum GridCsvError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Missing or unusable input reference.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Output writer failed.
    #[error("csv write error: {0}")]
    Io(#[from] std::io::Error),
    /// Polars failed to decode a frame.
    #[error("dataframe error: {0}")]
    Frame(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_mode_parses_case_insensitively() {
        assert_eq!(" Lenient ".parse::<EnumQuoteMode>().ok(), Some(EnumQuoteMode::Lenient));
        assert_eq!("NEVER".parse::<EnumQuoteMode>().ok(), Some(EnumQuoteMode::Never));
        assert!(matches!(
            "sometimes".parse::<EnumQuoteMode>(),
            Err(GridCsvError::Configuration(_))
        ));
    }

    #[test]
    fn test_blank_removal_mode_from_flags() {
        let rule = EnumBlankRemovalMode::from_flags(true, true);
        assert_eq!(rule, EnumBlankRemovalMode::RowsAndColumns);
        assert!(rule.if_remove_rows() && rule.if_remove_columns());
        assert!(!EnumBlankRemovalMode::Columns.if_remove_rows());
        assert!(!EnumBlankRemovalMode::None.if_remove_columns());
    }

    #[test]
    fn test_builder_defaults_match_default_options() {
        let options = SpecCsvConvertOptions::builder().build().unwrap();
        assert_eq!(options, SpecCsvConvertOptions::default());
        assert_eq!(options.rule_quote, EnumQuoteMode::Normal);
    }

    #[test]
    fn test_builder_reports_bad_quote_mode_at_build_time() {
        let res = SpecCsvConvertOptions::builder()
            .remove_blank_rows(true)
            .quote_mode_str("loose")
            .build();
        let Err(GridCsvError::Configuration(msg)) = res else {
            panic!("expected configuration error");
        };
        assert!(msg.contains("loose"));
    }

    #[test]
    fn test_builder_rejects_unset_quote_mode_and_zero_workers() {
        assert!(matches!(
            SpecCsvConvertOptions::builder().quote_mode(None).build(),
            Err(GridCsvError::Configuration(_))
        ));
        assert!(matches!(
            SpecCsvConvertOptions::builder().num_workers_max(Some(0)).build(),
            Err(GridCsvError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_last_quote_mode_setter_wins() {
        let options = SpecCsvConvertOptions::builder()
            .quote_mode_str("bad")
            .quote_mode(Some(EnumQuoteMode::Always))
            .build()
            .unwrap();
        assert_eq!(options.rule_quote, EnumQuoteMode::Always);

        let options = SpecCsvConvertOptions::builder()
            .quote_mode(None)
            .quote_mode_str("never")
            .build()
            .unwrap();
        assert_eq!(options.rule_quote, EnumQuoteMode::Never);

        assert!(matches!(
            SpecCsvConvertOptions::builder()
                .quote_mode(Some(EnumQuoteMode::Lenient))
                .quote_mode_str("bad")
                .build(),
            Err(GridCsvError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_sets_every_toggle() {
        let options = SpecCsvConvertOptions::builder()
            .remove_blank_rows(true)
            .remove_blank_columns(true)
            .remove_invisible_cells(true)
            .quote_mode_str("always")
            .num_workers_max(Some(2))
            .build()
            .unwrap();
        assert_eq!(options.rule_blank_removal(), EnumBlankRemovalMode::RowsAndColumns);
        assert!(options.if_remove_invisible_cells);
        assert_eq!(options.rule_quote, EnumQuoteMode::Always);
        assert_eq!(options.num_workers_max, Some(2));
    }
}
