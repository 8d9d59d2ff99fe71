//! CSV constants and default preset factories.

use crate::spec::{EnumQuoteMode, SpecCsvConvertOptions};

/// Field separator emitted between cells.
pub const C_CSV_FIELD_SEPARATOR: char = ',';
/// Quote character wrapped around quoted cells.
pub const C_CSV_QUOTE: char = '"';
/// Escaped form of an embedded quote inside a quoted cell.
pub const C_CSV_QUOTE_ESCAPED: &str = "\"\"";

/// Row separator (platform line ending).
#[cfg(windows)]
pub const C_CSV_LINE_ENDING: &str = "\r\n";
/// Row separator (platform line ending).
#[cfg(not(windows))]
pub const C_CSV_LINE_ENDING: &str = "\n";

/// `Normal` quoting triggers on any character whose code point is below this one.
///
/// Exactly `'-'` (U+002D); space, tab, `!`, `"`, `#`, `,` and the like all trigger.
pub const C_QUOTE_NORMAL_THRESHOLD: char = '-';

/// Characters that force quoting under `Lenient` mode.
pub const TUP_CSV_LENIENT_TRIGGERS: [char; 5] = ['"', ',', '\t', '\r', '\n'];

/// Recognized quote mode names (lowercase), in declaration order.
pub const TUP_QUOTE_MODE_NAMES: [&str; 4] = ["always", "normal", "lenient", "never"];

/// Default quote mode.
pub const ENUM_QUOTE_MODE_DEFAULT: EnumQuoteMode = EnumQuoteMode::Normal;

/// Build default conversion options.
pub fn derive_default_csv_convert_options() -> SpecCsvConvertOptions {
    SpecCsvConvertOptions::default()
}
