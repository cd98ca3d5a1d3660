/*!
# Force Gauge - Python Bindings

Python extension module exposing the serial force gauge reader to
measurement scripts.

## Usage

```python
import force_gauge_py

gauge = force_gauge_py.ForceGauge(port="/dev/ttyUSB0", baudrate=9600)

value, unit, age = gauge.read_gauge()
newtons, age = gauge.read_force()

gauge.stop()
```
*/

use force_gauge::protocol::{DEFAULT_BAUD_RATE, DEFAULT_PORT};
use force_gauge::ForceGauge as RustForceGauge;
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3::Bound;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::warn;

/// Python wrapper for a background force gauge reader
#[pyclass(name = "ForceGauge")]
pub struct PyForceGauge {
    inner: Option<RustForceGauge>,
}

impl PyForceGauge {
    fn gauge(&self) -> PyResult<&RustForceGauge> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("force gauge has been stopped"))
    }
}

#[pymethods]
impl PyForceGauge {
    /// Open the serial port and start reading frames in the background
    ///
    /// Args:
    ///     port: Serial device of the RS-232 adapter
    ///     baudrate: Baud rate set on the gauge
    ///     timeout: Per-byte read timeout in seconds; bounds how long stop() waits
    #[new]
    #[pyo3(signature = (port=DEFAULT_PORT, baudrate=DEFAULT_BAUD_RATE, timeout=0.1))]
    fn new(port: &str, baudrate: u32, timeout: f64) -> PyResult<Self> {
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(PyValueError::new_err("timeout must be a positive number of seconds"));
        }

        let gauge = RustForceGauge::open_serial(port, baudrate, Duration::from_secs_f64(timeout))
            .map_err(|e| PyIOError::new_err(format!("Failed to open force gauge: {}", e)))?;

        Ok(PyForceGauge { inner: Some(gauge) })
    }

    /// Latest reading: (value, unit, seconds since update)
    ///
    /// unit is None until the first frame has been decoded.
    fn read_gauge(&self) -> PyResult<(f64, Option<String>, f64)> {
        let snapshot = self.gauge()?.read_gauge();
        Ok((
            snapshot.value,
            snapshot.unit.map(|unit| unit.label().to_string()),
            snapshot.age_secs(),
        ))
    }

    /// Latest reading converted to newtons: (newtons, seconds since update)
    fn read_force(&self) -> PyResult<(f64, f64)> {
        let force = self.gauge()?.read_force();
        Ok((force.newtons, force.age_secs()))
    }

    /// Number of frames decoded so far
    #[getter]
    fn frames_received(&self) -> PyResult<u64> {
        Ok(self.gauge()?.frames_received())
    }

    /// Whether the background reader is still running
    #[getter]
    fn running(&self) -> bool {
        self.inner.as_ref().is_some_and(|gauge| !gauge.is_finished())
    }

    /// Stop the background reader and wait for it to exit
    fn stop(&mut self, py: Python<'_>) -> PyResult<()> {
        let Some(gauge) = self.inner.take() else {
            return Ok(());
        };

        py.allow_threads(move || gauge.stop())
            .map(|_| ())
            .map_err(|e| PyIOError::new_err(format!("Force gauge reader failed: {}", e)))
    }
}

impl Drop for PyForceGauge {
    fn drop(&mut self) {
        // The reader exits on its next read timeout; nothing waits for it here
        if let Some(gauge) = &self.inner {
            warn!("ForceGauge dropped without stop(); signalling reader");
            gauge.get_running_flag().store(false, Ordering::SeqCst);
        }
    }
}

/// Python module definition
#[pymodule]
fn force_gauge_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyForceGauge>()?;
    m.add("__version__", force_gauge::VERSION)?;

    // Add module docstring
    m.add("__doc__", "Serial force gauge reader with thread-safe readings")?;

    Ok(())
}
