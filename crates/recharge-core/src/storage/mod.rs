//! Persistence of computed ESP records.
//!
//! Records are stored in an append-only JSON-lines file, one record per
//! line, keyed by the SMILES string the calculation was run for. The format
//! is deliberately simple: it survives partial writes (a truncated trailing
//! line is reported with its line number), appends are cheap, and the files
//! diff and merge cleanly.
//!
//! Records are matched by exact SMILES string; callers are expected to use a
//! consistent form when storing and retrieving.

use crate::esp::{EspResult, EspSettings};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed record on line {line} of '{path}': {source}", path = path.display())]
    Json {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// A stored ESP calculation: the molecule, the geometry, the level of theory
/// and the computed surface data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EspRecord {
    /// The SMILES string of the molecule the ESP was computed for.
    pub smiles: String,
    /// The conformer coordinates in Angstroms.
    pub conformer: Vec<[f64; 3]>,
    /// The grid the ESP was evaluated on, in Angstroms.
    pub grid: Vec<[f64; 3]>,
    /// The ESP at each grid point in Hartree / e.
    pub esp: Option<Vec<f64>>,
    /// The electric field at each grid point in Hartree / (e * a0).
    pub field: Option<Vec<[f64; 3]>>,
    /// The settings the calculation was run with.
    pub esp_settings: EspSettings,
}

impl EspRecord {
    /// Builds a record from the output of an ESP generation run.
    pub fn from_result(smiles: &str, result: &EspResult, settings: &EspSettings) -> Self {
        Self {
            smiles: smiles.to_string(),
            conformer: result.conformer.iter().map(point_to_array).collect(),
            grid: result.grid.iter().map(point_to_array).collect(),
            esp: result.esp.clone(),
            field: result
                .field
                .as_ref()
                .map(|field| field.iter().map(vector_to_array).collect()),
            esp_settings: settings.clone(),
        }
    }

    /// The conformer as geometry points.
    pub fn conformer_points(&self) -> Vec<Point3<f64>> {
        self.conformer.iter().map(array_to_point).collect()
    }

    /// The grid as geometry points.
    pub fn grid_points(&self) -> Vec<Point3<f64>> {
        self.grid.iter().map(array_to_point).collect()
    }

    /// The field as vectors, when present.
    pub fn field_vectors(&self) -> Option<Vec<Vector3<f64>>> {
        self.field
            .as_ref()
            .map(|field| field.iter().map(|v| Vector3::new(v[0], v[1], v[2])).collect())
    }
}

fn point_to_array(point: &Point3<f64>) -> [f64; 3] {
    [point.x, point.y, point.z]
}

fn vector_to_array(vector: &Vector3<f64>) -> [f64; 3] {
    [vector.x, vector.y, vector.z]
}

fn array_to_point(array: &[f64; 3]) -> Point3<f64> {
    Point3::new(array[0], array[1], array[2])
}

/// An append-only store of [`EspRecord`]s backed by a JSON-lines file.
#[derive(Debug, Clone)]
pub struct MoleculeEspStore {
    path: PathBuf,
}

impl MoleculeEspStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record to the store, creating the file if needed.
    pub fn store(&self, record: &EspRecord) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        // serde_json never emits raw newlines inside a compact record, so
        // one line per record holds.
        let line = serde_json::to_string(record).map_err(|e| StorageError::Json {
            path: self.path.clone(),
            line: 0,
            source: e,
        })?;
        writeln!(file, "{line}").map_err(|e| StorageError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// Reads every record in the store. A missing file is an empty store.
    pub fn records(&self) -> Result<Vec<EspRecord>, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| StorageError::Io {
                path: self.path.clone(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| StorageError::Json {
                path: self.path.clone(),
                line: index + 1,
                source: e,
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Reads the records stored for a given SMILES string.
    pub fn retrieve(&self, smiles: &str) -> Result<Vec<EspRecord>, StorageError> {
        Ok(self
            .records()?
            .into_iter()
            .filter(|record| record.smiles == smiles)
            .collect())
    }

    /// The distinct SMILES strings in the store, in first-seen order.
    pub fn list_smiles(&self) -> Result<Vec<String>, StorageError> {
        let mut seen = Vec::new();
        for record in self.records()? {
            if !seen.contains(&record.smiles) {
                seen.push(record.smiles);
            }
        }
        Ok(seen)
    }
}
