//! Python bindings for the MESA output reader
//!
//! This crate provides PyO3 bindings to expose mesa-core to Python as the
//! `mesa_reader` module.

use mesa_core::{
    self, Column, FileKind, IndexLayout, LogDir, LogDirConfig, LogLayout, MesaData, MesaError,
    ProfileIndex, ReadOptions, Value,
};
use numpy::ndarray::Array1;
use numpy::IntoPyArray;
use pyo3::exceptions::{PyAttributeError, PyKeyError, PyLookupError, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple, PyType};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Python Classes
// ============================================================================

/// Python wrapper for MesaData
#[pyclass(name = "MesaData")]
#[derive(Clone)]
pub struct PyMesaData {
    inner: Arc<MesaData>,
}

#[pymethods]
impl PyMesaData {
    /// Read a history, profile or model file
    ///
    /// Args:
    ///     file_name: Path to the file
    ///     file_type: "log" or "model"; detected from the extension if omitted
    ///     header_names_line: 1-based line holding header names (default 2)
    ///     bulk_names_line: 1-based line holding column names (default 6)
    #[new]
    #[pyo3(signature = (
        file_name="./LOGS/history.data",
        file_type=None,
        header_names_line=None,
        bulk_names_line=None
    ))]
    fn new(
        file_name: &str,
        file_type: Option<&str>,
        header_names_line: Option<usize>,
        bulk_names_line: Option<usize>,
    ) -> PyResult<Self> {
        let mut layout = LogLayout::default();
        if let Some(line) = header_names_line {
            layout = layout.with_header_names_line(line);
        }
        if let Some(line) = bulk_names_line {
            layout = layout.with_bulk_names_line(line);
        }
        let mut options = ReadOptions::default().with_layout(layout);
        if let Some(kind) = file_type {
            options = options.with_kind(parse_kind(kind)?);
        }
        let data = MesaData::open_with(file_name, &options).map_err(to_py_err)?;
        Ok(data.into())
    }

    /// Path of the file this data was read from
    #[getter]
    fn file_name(&self) -> String {
        self.inner.file_name().display().to_string()
    }

    /// "log" or "model"
    #[getter]
    fn file_type(&self) -> String {
        self.inner.kind().to_string()
    }

    #[getter]
    fn header_names(&self) -> Vec<String> {
        self.inner.header_names().to_vec()
    }

    #[getter]
    fn bulk_names(&self) -> Vec<String> {
        self.inner.bulk_names().to_vec()
    }

    /// Data column, derived from a log/linear counterpart if necessary
    fn data(&self, py: Python<'_>, key: &str) -> PyResult<Py<PyAny>> {
        let column = self.inner.data(key).map_err(to_py_err)?;
        column_to_python(py, &column)
    }

    /// Header value
    fn header(&self, py: Python<'_>, key: &str) -> PyResult<Py<PyAny>> {
        let value = self.inner.header(key).map_err(to_py_err)?;
        value_to_python(py, value)
    }

    fn in_data(&self, key: &str) -> bool {
        self.inner.in_data(key)
    }

    fn in_header(&self, key: &str) -> bool {
        self.inner.in_header(key)
    }

    fn is_history(&self) -> bool {
        self.inner.is_history()
    }

    fn index_of_model_number(&self, m_num: i64) -> PyResult<usize> {
        self.inner.index_of_model_number(m_num).map_err(to_py_err)
    }

    fn data_at_model_number(&self, py: Python<'_>, key: &str, m_num: i64) -> PyResult<Py<PyAny>> {
        let value = self
            .inner
            .data_at_model_number(key, m_num)
            .map_err(to_py_err)?;
        value_to_python(py, &value)
    }

    /// Drop history rows superseded by backups or restarts
    fn remove_backups(&mut self) -> usize {
        Arc::make_mut(&mut self.inner).remove_backups()
    }

    /// Re-read the file
    fn read_data(&mut self) -> PyResult<()> {
        Arc::make_mut(&mut self.inner).reload().map_err(to_py_err)
    }

    fn __getattr__(&self, py: Python<'_>, name: &str) -> PyResult<Py<PyAny>> {
        match self.inner.attribute(name).map_err(to_py_err)? {
            mesa_core::Field::Data(column) => column_to_python(py, &column),
            mesa_core::Field::Header(value) => value_to_python(py, value),
        }
    }

    /// Pickle by re-reading the file with the same kind and layout
    fn __reduce__<'py>(
        slf: &Bound<'py, Self>,
    ) -> PyResult<(Bound<'py, PyType>, (String, String, usize, usize))> {
        let this = slf.borrow();
        let layout = this.inner.layout();
        Ok((
            slf.get_type(),
            (
                this.file_name(),
                this.file_type(),
                layout.header_names_line,
                layout.bulk_names_line,
            ),
        ))
    }

    fn __lt__(&self, other: &PyMesaData) -> bool {
        self.inner.cmp_by_age(&other.inner).is_lt()
    }

    fn __len__(&self) -> usize {
        self.inner.num_rows()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "MesaData(file_name='{}', rows={}, columns={})",
            self.inner.file_name().display(),
            self.inner.num_rows(),
            self.inner.bulk_names().len()
        )
    }
}

impl From<MesaData> for PyMesaData {
    fn from(data: MesaData) -> Self {
        PyMesaData {
            inner: Arc::new(data),
        }
    }
}

/// Python wrapper for ProfileIndex
#[pyclass(name = "MesaProfileIndex")]
pub struct PyMesaProfileIndex {
    inner: ProfileIndex,
}

#[pymethods]
impl PyMesaProfileIndex {
    /// Read a profiles.index file
    ///
    /// Args:
    ///     file_name: Path to the index
    ///     start_line: 1-based first line of entries (default 2)
    ///     end_line: 1-based last line of entries, to end of file if omitted
    ///     names: Names of the model number, priority and profile number columns
    #[new]
    #[pyo3(signature = (
        file_name="./LOGS/profiles.index",
        start_line=2,
        end_line=None,
        names=None
    ))]
    fn new(
        file_name: &str,
        start_line: usize,
        end_line: Option<usize>,
        names: Option<[String; 3]>,
    ) -> PyResult<Self> {
        let mut layout = IndexLayout::default().with_rows(start_line, end_line);
        if let Some(names) = names {
            layout = layout.with_names(names);
        }
        let inner = ProfileIndex::open_with(file_name, layout).map_err(to_py_err)?;
        Ok(PyMesaProfileIndex { inner })
    }

    #[getter]
    fn file_name(&self) -> String {
        self.inner.file_name().display().to_string()
    }

    /// Model numbers, ascending
    #[getter]
    fn model_numbers(&self, py: Python<'_>) -> Py<PyAny> {
        ints_to_numpy(py, self.inner.model_numbers())
    }

    /// Profile numbers, in order of their model numbers
    #[getter]
    fn profile_numbers(&self, py: Python<'_>) -> Py<PyAny> {
        ints_to_numpy(py, self.inner.profile_numbers())
    }

    #[getter]
    fn priorities(&self, py: Python<'_>) -> Py<PyAny> {
        ints_to_numpy(py, self.inner.priorities())
    }

    fn data(&self, py: Python<'_>, key: &str) -> PyResult<Py<PyAny>> {
        let values = self.inner.data(key).map_err(to_py_err)?;
        Ok(ints_to_numpy(py, values))
    }

    fn have_profile_with_model_number(&self, model_number: i64) -> bool {
        self.inner.have_profile_with_model_number(model_number)
    }

    fn have_profile_with_profile_number(&self, profile_number: i64) -> bool {
        self.inner.have_profile_with_profile_number(profile_number)
    }

    fn profile_with_model_number(&self, model_number: i64) -> PyResult<i64> {
        self.inner
            .profile_with_model_number(model_number)
            .map_err(to_py_err)
    }

    fn model_with_profile_number(&self, profile_number: i64) -> PyResult<i64> {
        self.inner
            .model_with_profile_number(profile_number)
            .map_err(to_py_err)
    }

    fn read_index(&mut self) -> PyResult<()> {
        self.inner.reload().map_err(to_py_err)
    }

    /// Index columns under their configured names
    fn __getattr__(&self, py: Python<'_>, name: &str) -> PyResult<Py<PyAny>> {
        match self.inner.data(name) {
            Ok(values) => Ok(ints_to_numpy(py, values)),
            Err(e @ MesaError::KeyNotFound { .. }) => {
                Err(PyAttributeError::new_err(e.to_string()))
            }
            Err(e) => Err(to_py_err(e)),
        }
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "MesaProfileIndex(file_name='{}', profiles={})",
            self.inner.file_name().display(),
            self.inner.len()
        )
    }
}

/// Python wrapper for LogDir
///
/// Hands out one Python object for the history and one per memoized
/// profile, so repeated lookups return the same object.
#[pyclass(name = "MesaLogDir")]
pub struct PyMesaLogDir {
    inner: LogDir,
    history: Py<PyMesaData>,
    profiles: HashMap<i64, Py<PyMesaData>>,
}

#[pymethods]
impl PyMesaLogDir {
    #[new]
    #[pyo3(signature = (
        log_path="LOGS",
        profile_prefix="profile",
        profile_suffix="data",
        history_file="history.data",
        index_file="profiles.index",
        memoize_profiles=true
    ))]
    fn new(
        py: Python<'_>,
        log_path: &str,
        profile_prefix: &str,
        profile_suffix: &str,
        history_file: &str,
        index_file: &str,
        memoize_profiles: bool,
    ) -> PyResult<Self> {
        let config = LogDirConfig::new(log_path)
            .with_profile_prefix(profile_prefix)
            .with_profile_suffix(profile_suffix)
            .with_history_file(history_file)
            .with_index_file(index_file)
            .with_memoize_profiles(memoize_profiles);
        let inner = LogDir::open_with(config).map_err(to_py_err)?;
        let history = history_handle(py, &inner)?;
        Ok(PyMesaLogDir {
            inner,
            history,
            profiles: HashMap::new(),
        })
    }

    #[getter]
    fn log_path(&self) -> String {
        self.inner.log_path().display().to_string()
    }

    #[getter]
    fn history(&self, py: Python<'_>) -> Py<PyMesaData> {
        self.history.clone_ref(py)
    }

    #[getter]
    fn index(&self) -> PyMesaProfileIndex {
        PyMesaProfileIndex {
            inner: self.inner.index().clone(),
        }
    }

    #[getter]
    fn model_numbers(&self, py: Python<'_>) -> Py<PyAny> {
        ints_to_numpy(py, self.inner.model_numbers())
    }

    #[getter]
    fn profile_numbers(&self, py: Python<'_>) -> Py<PyAny> {
        ints_to_numpy(py, self.inner.profile_numbers())
    }

    #[getter]
    fn get_memoize_profiles(&self) -> bool {
        self.inner.memoize_profiles()
    }

    #[setter]
    fn set_memoize_profiles(&mut self, memoize: bool) {
        self.inner.set_memoize_profiles(memoize);
    }

    /// Re-read history and index, forgetting memoized profiles
    fn read_logs(&mut self, py: Python<'_>) -> PyResult<()> {
        self.inner.read_logs().map_err(to_py_err)?;
        self.history = history_handle(py, &self.inner)?;
        self.profiles.clear();
        Ok(())
    }

    fn have_profile_with_model_number(&self, model_number: i64) -> bool {
        self.inner.have_profile_with_model_number(model_number)
    }

    fn have_profile_with_profile_number(&self, profile_number: i64) -> bool {
        self.inner.have_profile_with_profile_number(profile_number)
    }

    fn profile_with_model_number(&self, model_number: i64) -> PyResult<i64> {
        self.inner
            .profile_with_model_number(model_number)
            .map_err(to_py_err)
    }

    /// Profile by model number (preferred) or profile number; the last
    /// profile if neither is given
    #[pyo3(signature = (model_number=None, profile_number=None))]
    fn profile_data(
        &mut self,
        py: Python<'_>,
        model_number: Option<i64>,
        profile_number: Option<i64>,
    ) -> PyResult<Py<PyMesaData>> {
        let p_num = self
            .inner
            .profile_number_for(model_number, profile_number)
            .map_err(to_py_err)?;
        let memoize = self.inner.memoize_profiles();
        if memoize {
            if let Some(profile) = self.profiles.get(&p_num) {
                return Ok(profile.clone_ref(py));
            }
        }

        let inner = self
            .inner
            .profile_data(None, Some(p_num))
            .map_err(to_py_err)?;
        let profile = Py::new(py, PyMesaData { inner })?;
        if memoize {
            self.profiles.insert(p_num, profile.clone_ref(py));
        }
        Ok(profile)
    }

    /// Model numbers whose history values make `f(*values)` truthy
    #[pyo3(signature = (f, *keys))]
    fn select_models(
        &self,
        py: Python<'_>,
        f: &Bound<'_, PyAny>,
        keys: &Bound<'_, PyTuple>,
    ) -> PyResult<Py<PyAny>> {
        let keys: Vec<String> = keys.extract()?;
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        let mut failure: Option<PyErr> = None;
        let selected = self
            .inner
            .select_models(
                |values| {
                    if failure.is_some() {
                        return false;
                    }
                    match call_predicate(py, f, values) {
                        Ok(keep) => keep,
                        Err(e) => {
                            failure = Some(e);
                            false
                        }
                    }
                },
                &key_refs,
            )
            .map_err(to_py_err)?;

        if let Some(e) = failure {
            return Err(e);
        }
        Ok(ints_to_numpy(py, selected))
    }

    fn __repr__(&self) -> String {
        format!(
            "MesaLogDir(log_path='{}', profiles={})",
            self.inner.log_path().display(),
            self.inner.index().len()
        )
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn history_handle(py: Python<'_>, logs: &LogDir) -> PyResult<Py<PyMesaData>> {
    Py::new(py, PyMesaData::from(logs.history().clone()))
}

fn parse_kind(kind: &str) -> PyResult<FileKind> {
    match kind {
        "log" => Ok(FileKind::Log),
        "model" => Ok(FileKind::Model),
        other => Err(PyValueError::new_err(format!(
            "file_type must be 'log' or 'model', got '{}'",
            other
        ))),
    }
}

fn to_py_err(err: MesaError) -> PyErr {
    let msg = err.to_string();
    match err {
        MesaError::KeyNotFound { .. } | MesaError::HeaderKeyNotFound { .. } => {
            PyKeyError::new_err(msg)
        }
        MesaError::UnknownAttribute { .. } => PyAttributeError::new_err(msg),
        MesaError::Io(_) | MesaError::BadPath { .. } => PyOSError::new_err(msg),
        MesaError::ModelNumberNotFound { .. }
        | MesaError::ProfileNotFound { .. }
        | MesaError::ProfileNumberNotFound { .. }
        | MesaError::EmptyIndex { .. } => PyLookupError::new_err(msg),
        _ => PyValueError::new_err(msg),
    }
}

fn call_predicate(py: Python<'_>, f: &Bound<'_, PyAny>, values: &[Value]) -> PyResult<bool> {
    let args = values
        .iter()
        .map(|v| value_to_python(py, v))
        .collect::<PyResult<Vec<_>>>()?;
    f.call1(PyTuple::new(py, args)?)?.is_truthy()
}

fn ints_to_numpy(py: Python, values: Vec<i64>) -> Py<PyAny> {
    Array1::from_vec(values).into_pyarray(py).into_any().unbind()
}

fn column_to_python(py: Python, column: &Column) -> PyResult<Py<PyAny>> {
    if let Some(text) = column.as_text() {
        return Ok(PyList::new(py, text)?.into_any().unbind());
    }
    Ok(match column.as_int() {
        Some(v) => ints_to_numpy(py, v.to_vec()),
        None => Array1::from_vec(column.to_f64_vec().unwrap_or_default())
            .into_pyarray(py)
            .into_any()
            .unbind(),
    })
}

fn value_to_python(py: Python, value: &Value) -> PyResult<Py<PyAny>> {
    Ok(match value {
        Value::Int(v) => v.into_pyobject(py)?.into_any().unbind(),
        Value::Float(v) => v.into_pyobject(py)?.into_any().unbind(),
        Value::Text(v) => v.into_pyobject(py)?.into_any().unbind(),
    })
}

// ============================================================================
// Python Functions
// ============================================================================

/// Read a history, profile or model file
#[pyfunction]
pub fn read(filename: &str) -> PyResult<PyMesaData> {
    let data = mesa_core::read(filename).map_err(to_py_err)?;
    Ok(data.into())
}

/// Send library logs to stderr
///
/// Args:
///     level: Filter directive such as "info" or "mesa_core=debug".
///         RUST_LOG takes precedence when set.
///
/// Returns:
///     False if a subscriber was already installed
#[pyfunction]
#[pyo3(signature = (level="info"))]
pub fn init_logging(level: &str) -> PyResult<bool> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}

// ============================================================================
// Module Definition
// ============================================================================

#[pymodule]
pub fn mesa_reader(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Functions
    m.add_function(wrap_pyfunction!(read, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Classes
    m.add_class::<PyMesaData>()?;
    m.add_class::<PyMesaProfileIndex>()?;
    m.add_class::<PyMesaLogDir>()?;

    Ok(())
}
