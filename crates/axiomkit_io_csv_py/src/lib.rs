use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{StructArray, TryExtend};
use arrow::datatypes::{ArrowDataType, ArrowSchema};
use arrow::record_batch::RecordBatchT;
use axiomkit_io_csv::spec::{EnumQuoteMode, GridCsvError, SpecCsvConvertOptions};
use axiomkit_io_csv::{CsvConverter, SpecRowGrid, render_csv_text};
use polars::prelude::DataFrame;
use pyo3::exceptions::PyValueError;
use pyo3::ffi as pyffi;
use pyo3::prelude::*;
use pyo3::types::PyAny;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "axiomkit.csv.converter.v1";
const C_BRIDGE_TRANSPORT: &str = "arrow_c_data";
const C_ARROW_ARRAY_STREAM_CAPSULE_NAME: &[u8] = b"arrow_array_stream\0";

type RawRows = Vec<Option<Vec<Option<String>>>>;

fn convert_grid_error(err: GridCsvError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn derive_convert_options(
    remove_blank_rows: bool,
    remove_blank_columns: bool,
    remove_invisible_cells: bool,
    quote_mode: Option<&str>,
    num_workers_max: Option<usize>,
) -> PyResult<SpecCsvConvertOptions> {
    let builder = SpecCsvConvertOptions::builder()
        .remove_blank_rows(remove_blank_rows)
        .remove_blank_columns(remove_blank_columns)
        .remove_invisible_cells(remove_invisible_cells)
        .num_workers_max(num_workers_max);
    let builder = match quote_mode {
        Some(c_mode) => builder.quote_mode_str(c_mode),
        None => builder.quote_mode(None),
    };
    builder.build().map_err(convert_grid_error)
}

fn parse_quote_mode(quote_mode: Option<&str>) -> PyResult<EnumQuoteMode> {
    let Some(c_mode) = quote_mode else {
        return Err(PyValueError::new_err("quote_mode must not be None."));
    };
    c_mode.parse::<EnumQuoteMode>().map_err(convert_grid_error)
}

fn create_row_grid(
    rows: RawRows,
    hidden_rows: Option<Vec<usize>>,
    hidden_cols: Option<Vec<usize>>,
) -> SpecRowGrid {
    SpecRowGrid::new(rows)
        .with_hidden_rows(hidden_rows.unwrap_or_default())
        .with_hidden_columns(hidden_cols.unwrap_or_default())
}

/// Normalize ragged rows into a rectangular matrix.
///
/// `rows=None` stands for a missing sheet and raises `ValueError`.
#[pyfunction]
#[pyo3(signature = (
    rows,
    hidden_rows = None,
    hidden_cols = None,
    remove_blank_rows = false,
    remove_blank_columns = false,
    remove_invisible_cells = false
))]
fn normalize_rows(
    py: Python<'_>,
    rows: Option<RawRows>,
    hidden_rows: Option<Vec<usize>>,
    hidden_cols: Option<Vec<usize>>,
    remove_blank_rows: bool,
    remove_blank_columns: bool,
    remove_invisible_cells: bool,
) -> PyResult<Vec<Vec<String>>> {
    let cfg_options = derive_convert_options(
        remove_blank_rows,
        remove_blank_columns,
        remove_invisible_cells,
        Some(EnumQuoteMode::default().as_str()),
        None,
    )?;
    let grid = rows.map(|rows| create_row_grid(rows, hidden_rows, hidden_cols));

    py.allow_threads(|| CsvConverter::new(cfg_options).convert_to_matrix(grid.as_ref()))
        .map_err(convert_grid_error)
}

/// Render a rectangular matrix as CSV text.
#[pyfunction]
#[pyo3(signature = (matrix, quote_mode = Some("normal")))]
fn render_csv(matrix: Vec<Vec<String>>, quote_mode: Option<&str>) -> PyResult<String> {
    let rule_quote = parse_quote_mode(quote_mode)?;
    Ok(render_csv_text(&matrix, rule_quote))
}

/// Normalize ragged rows and render CSV text.
///
/// Returns `(csv_text, report_counts)`.
#[pyfunction]
#[pyo3(signature = (
    rows,
    hidden_rows = None,
    hidden_cols = None,
    remove_blank_rows = false,
    remove_blank_columns = false,
    remove_invisible_cells = false,
    quote_mode = Some("normal")
))]
#[allow(clippy::too_many_arguments)]
fn convert_rows_to_csv(
    py: Python<'_>,
    rows: Option<RawRows>,
    hidden_rows: Option<Vec<usize>>,
    hidden_cols: Option<Vec<usize>>,
    remove_blank_rows: bool,
    remove_blank_columns: bool,
    remove_invisible_cells: bool,
    quote_mode: Option<&str>,
) -> PyResult<(String, BTreeMap<String, u64>)> {
    let cfg_options = derive_convert_options(
        remove_blank_rows,
        remove_blank_columns,
        remove_invisible_cells,
        quote_mode,
        None,
    )?;
    let grid = rows.map(|rows| create_row_grid(rows, hidden_rows, hidden_cols));

    py.allow_threads(|| {
        let mut converter = CsvConverter::new(cfg_options);
        let c_csv = converter.convert_to_csv(grid.as_ref())?;
        let dict_counts = converter
            .report()
            .last()
            .map(|report| report.to_dict())
            .unwrap_or_default();
        Ok::<_, GridCsvError>((c_csv, dict_counts))
    })
    .map_err(convert_grid_error)
}

/// Convert any DataFrame-like object to CSV text through the Arrow C stream.
///
/// The header row is not emitted; only frame values are rendered.
#[pyfunction]
#[pyo3(signature = (
    df,
    remove_blank_rows = false,
    remove_blank_columns = false,
    quote_mode = Some("normal")
))]
fn convert_dataframe_to_csv(
    py: Python<'_>,
    df: &Bound<'_, PyAny>,
    remove_blank_rows: bool,
    remove_blank_columns: bool,
    quote_mode: Option<&str>,
) -> PyResult<String> {
    let cfg_options = derive_convert_options(
        remove_blank_rows,
        remove_blank_columns,
        false,
        quote_mode,
        None,
    )?;
    let df_data = derive_dataframe_from_py(py, df)?;

    py.allow_threads(|| CsvConverter::new(cfg_options).convert_to_csv(Some(&df_data)))
        .map_err(convert_grid_error)
}

/// Whether `value` would be quoted under `quote_mode`.
#[pyfunction]
#[pyo3(signature = (value, quote_mode = Some("normal")))]
fn should_quote(value: &str, quote_mode: Option<&str>) -> PyResult<bool> {
    let rule_quote = parse_quote_mode(quote_mode)?;
    Ok(axiomkit_io_csv::should_quote(value, rule_quote))
}

/// Import any DataFrame-like object through its Arrow C stream.
///
/// Non-Polars inputs are first passed to `polars.DataFrame(...)`.
fn derive_dataframe_from_py(py: Python<'_>, df: &Bound<'_, PyAny>) -> PyResult<DataFrame> {
    let cls_dataframe = py.import("polars")?.getattr("DataFrame")?;
    let df_polars = if df.is_instance(&cls_dataframe)? {
        df.clone()
    } else {
        cls_dataframe.call1((df,))?
    };
    let obj_capsule = df_polars.call_method0("__arrow_c_stream__")?;

    let ptr_capsule = obj_capsule.as_ptr();
    let ptr_stream_name = C_ARROW_ARRAY_STREAM_CAPSULE_NAME
        .as_ptr()
        .cast::<std::os::raw::c_char>();
    // Safety: the capsule is alive for this scope and its name is checked first.
    let ptr_stream = unsafe {
        if pyffi::PyCapsule_IsValid(ptr_capsule, ptr_stream_name) == 0 {
            return Err(PyValueError::new_err(
                "`__arrow_c_stream__` did not return an `arrow_array_stream` capsule.",
            ));
        }
        pyffi::PyCapsule_GetPointer(ptr_capsule, ptr_stream_name)
    };
    if ptr_stream.is_null() {
        return Err(PyValueError::new_err("Arrow C stream capsule is empty."));
    }

    let stream = ptr_stream.cast::<arrow::ffi::ArrowArrayStream>();
    // Safety: `stream` is owned by the live capsule.
    let mut reader = unsafe { arrow::ffi::ArrowArrayStreamReader::try_new(&mut *stream) }
        .map_err(|err| PyValueError::new_err(format!("Cannot open Arrow C stream: {err}")))?;

    let ArrowDataType::Struct(l_fields) = reader.field().dtype() else {
        return Err(PyValueError::new_err(
            "Arrow C stream of a frame must carry Struct batches.",
        ));
    };
    let schema_arrow: ArrowSchema = l_fields
        .iter()
        .map(|field| (field.name.clone(), field.clone()))
        .collect();
    let schema_ref = Arc::new(schema_arrow.clone());
    let mut df_out = DataFrame::empty_with_arrow_schema(&schema_arrow);

    // Safety: the reader was built from a validated stream.
    while let Some(res_batch) = unsafe { reader.next() } {
        let array_struct = res_batch
            .map_err(|err| PyValueError::new_err(format!("Bad Arrow batch: {err}")))?
            .as_any()
            .downcast_ref::<StructArray>()
            .cloned()
            .ok_or_else(|| PyValueError::new_err("Arrow batch is not a StructArray."))?;
        RecordBatchT::try_new(
            array_struct.len(),
            schema_ref.clone(),
            array_struct.values().to_vec(),
        )
        .and_then(|batch| df_out.try_extend(std::iter::once(batch)))
        .map_err(|err| PyValueError::new_err(format!("Cannot load Arrow batch: {err}")))?;
    }

    Ok(df_out)
}

#[pymodule]
fn _axiomkit_io_csv_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(normalize_rows, module)?)?;
    module.add_function(wrap_pyfunction!(render_csv, module)?)?;
    module.add_function(wrap_pyfunction!(convert_rows_to_csv, module)?)?;
    module.add_function(wrap_pyfunction!(convert_dataframe_to_csv, module)?)?;
    module.add_function(wrap_pyfunction!(should_quote, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}

