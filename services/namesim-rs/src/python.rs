//! Python bindings, built with the `python` feature.

use std::sync::Arc;

use namesim_phonetic::{levenshtein, nysiis, refined_soundex, soundex, DmSoundex, EncodeError, DEFAULT_MAX_CODE_LEN};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::config::EngineConfig;
use crate::engine::NameEngine;
use crate::error::NameSimError;
use crate::features::FeatureVector;
use crate::graph::{GraphStats, SimilarNameGraph};

fn to_py_err(err: NameSimError) -> PyErr {
    match err {
        NameSimError::Io { .. } | NameSimError::Stream(_) => PyIOError::new_err(err.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

fn encode_err(err: EncodeError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// ENCODERS
// ============================================================================

#[pyfunction]
fn py_soundex(name: &str) -> PyResult<String> {
    soundex(name).map_err(encode_err)
}

#[pyfunction]
fn py_refined_soundex(name: &str) -> PyResult<String> {
    refined_soundex(name).map_err(encode_err)
}

#[pyfunction]
fn py_nysiis(name: &str) -> PyResult<String> {
    Ok(nysiis(name))
}

#[pyfunction]
#[pyo3(signature = (name, max_code_len = DEFAULT_MAX_CODE_LEN))]
fn py_dm_soundex(name: &str, max_code_len: usize) -> PyResult<String> {
    Ok(DmSoundex::new(max_code_len).encode(name))
}

#[pyfunction]
fn py_levenshtein(a: &str, b: &str) -> PyResult<usize> {
    Ok(levenshtein(a, b))
}

// ============================================================================
// TABLES
// ============================================================================

#[pyfunction]
fn py_graph_stats(path: &str) -> PyResult<PyGraphStats> {
    let graph = SimilarNameGraph::from_file(path).map_err(to_py_err)?;
    Ok(PyGraphStats::from(graph.stats()))
}

// ============================================================================
// PYTHON WRAPPER TYPES
// ============================================================================

/// A loaded engine for one name type.
#[pyclass(name = "NameEngine")]
struct PyNameEngine {
    inner: Arc<NameEngine>,
}

#[pymethods]
impl PyNameEngine {
    #[new]
    fn new(config_path: &str) -> PyResult<Self> {
        let config = EngineConfig::from_file(config_path).map_err(to_py_err)?;
        let inner = NameEngine::from_config(&config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    fn name_type(&self) -> &'static str {
        self.inner.name_type().as_str()
    }

    fn score(&self, py: Python<'_>, name1: &str, name2: &str) -> f64 {
        py.allow_threads(|| self.inner.score(name1, name2))
    }

    fn features(&self, name1: &str, name2: &str) -> Vec<(&'static str, f64)> {
        let scorer = self.inner.scorer();
        let features = scorer
            .features()
            .features(name1, &scorer.codes(name1), name2, &scorer.codes(name2));
        FeatureVector::NAMES
            .into_iter()
            .zip(features.as_array())
            .collect()
    }

    fn generate(&self, py: Python<'_>, name: &str) -> Vec<(String, f64)> {
        py.allow_threads(|| {
            self.inner
                .generate(name)
                .into_iter()
                .map(|s| (s.name, s.score.into_inner()))
                .collect()
        })
    }

    fn similar_names(&self, py: Python<'_>, name: &str) -> Vec<String> {
        py.allow_threads(|| self.inner.similar_names(name))
    }
}

#[pyclass]
struct PyGraphStats {
    #[pyo3(get)]
    num_nodes: usize,
    #[pyo3(get)]
    num_edges: usize,
    #[pyo3(get)]
    avg_degree: f64,
    #[pyo3(get)]
    max_degree: usize,
    #[pyo3(get)]
    asymmetric_edges: usize,
    #[pyo3(get)]
    num_components: usize,
}

impl From<GraphStats> for PyGraphStats {
    fn from(stats: GraphStats) -> Self {
        Self {
            num_nodes: stats.num_nodes,
            num_edges: stats.num_edges,
            avg_degree: stats.avg_degree,
            max_degree: stats.max_degree,
            asymmetric_edges: stats.asymmetric_edges,
            num_components: stats.num_components,
        }
    }
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn namesim_core(_py: Python, m: &PyModule) -> PyResult<()> {
    // Encoders
    m.add_function(wrap_pyfunction!(py_soundex, m)?)?;
    m.add_function(wrap_pyfunction!(py_refined_soundex, m)?)?;
    m.add_function(wrap_pyfunction!(py_nysiis, m)?)?;
    m.add_function(wrap_pyfunction!(py_dm_soundex, m)?)?;
    m.add_function(wrap_pyfunction!(py_levenshtein, m)?)?;

    // Tables
    m.add_function(wrap_pyfunction!(py_graph_stats, m)?)?;

    // Classes
    m.add_class::<PyNameEngine>()?;
    m.add_class::<PyGraphStats>()?;

    Ok(())
}
