//! NPZ persistence for datasets.

use std::fs::File;
use std::path::Path;

use log::info;
use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError, ReadableElement};

use super::{Dataset, Sample};
use crate::error::{DesignError, Result};
use crate::filters::{FilterSpec, Topology};
use crate::solver::FrequencySweep;

const RESPONSES: &str = "responses";
const PARAMS: &str = "params";
const FILTER_TYPES: &str = "filter_types";
const FREQS: &str = "freqs";

impl Dataset {
    /// Write the dataset as an NPZ archive.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let npz_err = |source| DesignError::NpzWrite {
            path: path.display().to_string(),
            source,
        };

        let n = self.len();
        let f = self.sweep.len();
        let responses = Array2::from_shape_fn((n, f), |(i, j)| self.samples[i].response[j]);
        let params = Array2::from_shape_fn((n, 3), |(i, j)| self.samples[i].spec.params()[j]);
        let filter_types: Array1<i64> = self.samples.iter().map(|s| s.topology_index() as i64).collect();
        let freqs = Array1::from_vec(self.sweep.points().to_vec());

        let file = File::create(path).map_err(|e| DesignError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut npz = NpzWriter::new(file);
        npz.add_array(RESPONSES, &responses).map_err(npz_err)?;
        npz.add_array(PARAMS, &params).map_err(npz_err)?;
        npz.add_array(FILTER_TYPES, &filter_types).map_err(npz_err)?;
        npz.add_array(FREQS, &freqs).map_err(npz_err)?;
        npz.finish().map_err(npz_err)?;

        info!("Saved {} samples to {}", n, path.display());
        Ok(())
    }

    /// Read a dataset written by [`Dataset::save`] (or by NumPy's `savez`).
    ///
    /// Every array shape is checked against the others, and every response
    /// magnitude must be finite and non-negative, before any sample is built.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DesignError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut archive = Archive {
            npz: NpzReader::new(file).map_err(|source| DesignError::NpzRead {
                path: path.display().to_string(),
                source,
            })?,
            path,
        };

        let responses: Array2<f64> = archive.read(RESPONSES)?;
        let params: Array2<f64> = archive.read(PARAMS)?;
        let filter_types: Array1<i64> = archive.read(FILTER_TYPES)?;
        let freqs: Array1<f64> = archive.read(FREQS)?;

        let n = filter_types.len();
        let f = freqs.len();
        if responses.nrows() != n {
            return Err(DesignError::dimension_mismatch("responses rows", n, responses.nrows()));
        }
        if responses.ncols() != f {
            return Err(DesignError::dimension_mismatch("responses columns", f, responses.ncols()));
        }
        if params.nrows() != n {
            return Err(DesignError::dimension_mismatch("params rows", n, params.nrows()));
        }
        if params.ncols() != 3 {
            return Err(DesignError::dimension_mismatch("params columns", 3, params.ncols()));
        }

        if let Some(((row, col), value)) = responses.indexed_iter().find(|(_, m)| !m.is_finite() || **m < 0.0) {
            return Err(DesignError::CorruptDataset {
                path: path.display().to_string(),
                message: format!("response[{}][{}] = {} is not a finite, non-negative magnitude", row, col, value),
            });
        }

        let sweep = FrequencySweep::from_points(freqs.to_vec())?;
        let samples = filter_types
            .iter()
            .zip(params.rows())
            .zip(responses.rows())
            .map(|((&kind, p), response)| {
                let spec = FilterSpec::from_params(Topology::from_index(kind)?, [p[0], p[1], p[2]])?;
                Ok(Sample {
                    spec,
                    response: response.to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Loaded {} samples ({} frequencies) from {}", n, f, path.display());
        Dataset::new(sweep, samples)
    }
}

struct Archive<'a> {
    npz: NpzReader<File>,
    path: &'a Path,
}

impl Archive<'_> {
    /// Read an entry stored either as `name` or `name.npy`.
    fn read<A, D>(&mut self, name: &str) -> Result<ndarray::Array<A, D>>
    where
        A: ReadableElement,
        D: ndarray::Dimension,
    {
        let wrap = |source: ReadNpzError| DesignError::NpzRead {
            path: self.path.display().to_string(),
            source,
        };
        let names = self.npz.names().map_err(wrap)?;
        let with_ext = format!("{}.npy", name);
        let entry = names
            .iter()
            .find(|n| n.as_str() == name || *n == &with_ext)
            .ok_or_else(|| DesignError::MissingArray {
                path: self.path.display().to_string(),
                name: name.to_string(),
            })?
            .clone();
        self.npz.by_name(&entry).map_err(wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ComponentValues;
    use tempfile::NamedTempFile;

    fn toy_dataset() -> Dataset {
        let sweep = FrequencySweep::from_points(vec![10.0, 1e3, 1e5]).unwrap();
        let samples = vec![
            Sample {
                spec: FilterSpec::new(Topology::Lowpass, &ComponentValues::rc(1.5e3, 2.2e-9)).unwrap(),
                response: vec![1.0, 0.75, 0.01],
            },
            Sample {
                spec: FilterSpec::new(Topology::Highpass, &ComponentValues::rc(9.1e3, 4.7e-7)).unwrap(),
                response: vec![0.02, 0.9, 1.0],
            },
            Sample {
                spec: FilterSpec::new(Topology::Bandpass, &ComponentValues::rlc(3.3e3, 6.8e-5, 1e-8)).unwrap(),
                response: vec![1.0, 0.99, 0.3],
            },
        ];
        Dataset::new(sweep, samples).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let dataset = toy_dataset();
        let tmpfile = NamedTempFile::new().unwrap();

        dataset.save(tmpfile.path()).unwrap();
        let loaded = Dataset::load(tmpfile.path()).unwrap();

        assert_eq!(loaded, dataset);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Dataset::load(dir.path().join("absent.npz")),
            Err(DesignError::FileReadError { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch_detected() {
        let tmpfile = NamedTempFile::new().unwrap();
        {
            let file = File::create(tmpfile.path()).unwrap();
            let mut npz = NpzWriter::new(file);
            npz.add_array(RESPONSES, &Array2::<f64>::zeros((2, 4))).unwrap();
            npz.add_array(PARAMS, &Array2::<f64>::ones((2, 3))).unwrap();
            npz.add_array(FILTER_TYPES, &Array1::<i64>::zeros(2)).unwrap();
            npz.add_array(FREQS, &Array1::from_vec(vec![10.0, 100.0, 1000.0])).unwrap();
            npz.finish().unwrap();
        }
        assert!(matches!(
            Dataset::load(tmpfile.path()),
            Err(DesignError::DimensionMismatch { expected: 3, got: 4, .. })
        ));
    }

    fn write_archive(path: &Path, responses: Array2<f64>, with_freqs: bool) {
        let n = responses.nrows();
        let f = responses.ncols();
        let file = File::create(path).unwrap();
        let mut npz = NpzWriter::new(file);
        npz.add_array(RESPONSES, &responses).unwrap();
        npz.add_array(PARAMS, &Array2::<f64>::ones((n, 3))).unwrap();
        npz.add_array(FILTER_TYPES, &Array1::<i64>::zeros(n)).unwrap();
        if with_freqs {
            let freqs: Array1<f64> = (0..f).map(|i| 10.0 * (i + 1) as f64).collect();
            npz.add_array(FREQS, &freqs).unwrap();
        }
        npz.finish().unwrap();
    }

    #[test]
    fn test_missing_array_reported_by_name() {
        let tmpfile = NamedTempFile::new().unwrap();
        write_archive(tmpfile.path(), Array2::<f64>::ones((2, 3)), false);
        assert!(matches!(
            Dataset::load(tmpfile.path()),
            Err(DesignError::MissingArray { ref name, .. }) if name == FREQS
        ));
    }

    #[test]
    fn test_non_finite_response_rejected() {
        let tmpfile = NamedTempFile::new().unwrap();
        let mut responses = Array2::<f64>::ones((2, 3));
        responses[[1, 2]] = f64::NAN;
        write_archive(tmpfile.path(), responses, true);
        assert!(matches!(
            Dataset::load(tmpfile.path()),
            Err(DesignError::CorruptDataset { .. })
        ));
    }

    #[test]
    fn test_negative_response_rejected() {
        let tmpfile = NamedTempFile::new().unwrap();
        let mut responses = Array2::<f64>::ones((2, 3));
        responses[[0, 1]] = -0.5;
        write_archive(tmpfile.path(), responses, true);
        assert!(matches!(
            Dataset::load(tmpfile.path()),
            Err(DesignError::CorruptDataset { ref message, .. }) if message.contains("response[0][1]")
        ));
    }

    #[test]
    fn test_unknown_filter_type() {
        let tmpfile = NamedTempFile::new().unwrap();
        {
            let file = File::create(tmpfile.path()).unwrap();
            let mut npz = NpzWriter::new(file);
            npz.add_array(RESPONSES, &Array2::<f64>::ones((1, 2))).unwrap();
            npz.add_array(PARAMS, &Array2::<f64>::ones((1, 3))).unwrap();
            npz.add_array(FILTER_TYPES, &Array1::from_vec(vec![3i64])).unwrap();
            npz.add_array(FREQS, &Array1::from_vec(vec![10.0, 100.0])).unwrap();
            npz.finish().unwrap();
        }
        assert!(matches!(
            Dataset::load(tmpfile.path()),
            Err(DesignError::InvalidTopology { .. })
        ));
    }
}
