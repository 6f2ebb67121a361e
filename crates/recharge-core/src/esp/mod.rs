//! Electrostatic potential (ESP) generation.
//!
//! This module defines the settings an ESP calculation is described by and
//! the [`EspGenerator`] seam behind which concrete quantum chemistry
//! packages sit. The only backend currently provided is [`psi4`].
//!
//! Units follow the conventions of the QM packages: conformers and grids are
//! in Angstroms, ESP values in Hartree / e, and electric fields in
//! Hartree / (e * a0).

pub mod psi4;

use crate::grids::{GridError, GridGenerator, GridSettings};
use crate::models::Molecule;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The DFT integration grids to request when computing properties with Psi4.
///
/// `Medium` and `Fine` pin the spherical and radial point counts with robust
/// pruning; `Default` leaves the choice to Psi4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DftGridSettings {
    #[default]
    Default,
    Medium,
    Fine,
}

impl DftGridSettings {
    pub fn spherical_points(&self) -> Option<u32> {
        match self {
            DftGridSettings::Default => None,
            DftGridSettings::Medium => Some(434),
            DftGridSettings::Fine => Some(590),
        }
    }

    pub fn radial_points(&self) -> Option<u32> {
        match self {
            DftGridSettings::Default => None,
            DftGridSettings::Medium => Some(85),
            DftGridSettings::Fine => Some(99),
        }
    }

    pub fn pruning_scheme(&self) -> Option<&'static str> {
        match self {
            DftGridSettings::Default => None,
            DftGridSettings::Medium | DftGridSettings::Fine => Some("robust"),
        }
    }
}

/// The polarizable continuum solvers supported by the PCM module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PcmSolver {
    #[default]
    Cpcm,
    Iefpcm,
}

impl PcmSolver {
    pub fn keyword(&self) -> &'static str {
        match self {
            PcmSolver::Cpcm => "CPCM",
            PcmSolver::Iefpcm => "IEFPCM",
        }
    }
}

/// The solvents the PCM module can simulate. The solvent fixes the
/// dielectric constant of the continuum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PcmSolvent {
    #[default]
    Water,
}

impl PcmSolvent {
    pub fn keyword(&self) -> &'static str {
        match self {
            PcmSolvent::Water => "Water",
        }
    }
}

/// The atomic radii sets used to build the molecular cavity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PcmRadiiModel {
    #[default]
    Bondi,
    #[serde(rename = "UFF")]
    Uff,
    Allinger,
}

impl PcmRadiiModel {
    pub fn keyword(&self) -> &'static str {
        match self {
            PcmRadiiModel::Bondi => "Bondi",
            PcmRadiiModel::Uff => "UFF",
            PcmRadiiModel::Allinger => "Allinger",
        }
    }
}

/// Settings for including a polarizable continuum model (PCM) in the
/// calculation of an ESP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PcmSettings {
    /// The solver to use.
    pub solver: PcmSolver,
    /// The solvent to simulate.
    pub solvent: PcmSolvent,
    /// The type of atomic radii to use when computing the molecular cavity.
    pub radii_model: PcmRadiiModel,
    /// Whether to scale the atomic radii by a factor of 1.2.
    pub radii_scaling: bool,
    /// The average area of the surface partition for the cavity.
    pub cavity_area: f64,
}

impl Default for PcmSettings {
    fn default() -> Self {
        Self {
            solver: PcmSolver::default(),
            solvent: PcmSolvent::default(),
            radii_model: PcmRadiiModel::default(),
            radii_scaling: true,
            cavity_area: 0.3,
        }
    }
}

/// The settings to use in an ESP calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EspSettings {
    /// The basis set to use in the ESP calculation.
    pub basis: String,
    /// The method to use in the ESP calculation.
    pub method: String,
    /// The settings to use when generating the grid to compute the
    /// electrostatic potential on.
    pub grid_settings: GridSettings,
    /// The settings to use if including a polarizable continuum model in the
    /// calculation.
    pub pcm_settings: Option<PcmSettings>,
    /// The DFT integration grid to request when performing computations with
    /// Psi4.
    pub dft_grid_settings: DftGridSettings,
}

impl Default for EspSettings {
    fn default() -> Self {
        Self {
            basis: "6-31g*".to_string(),
            method: "hf".to_string(),
            grid_settings: GridSettings::default(),
            pcm_settings: None,
            dft_grid_settings: DftGridSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EspSettingsError {
    #[error("failed to read settings file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse settings file '{path}': {source}", path = path.display())]
    Toml {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },

    #[error("pcm cavity_area must be positive, got {0}")]
    NonPositiveCavityArea(f64),
}

impl EspSettings {
    /// Loads settings from a TOML file.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, EspSettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EspSettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: EspSettings =
            toml::from_str(&content).map_err(|e| EspSettingsError::Toml {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), EspSettingsError> {
        if let Some(pcm) = &self.pcm_settings {
            if !(pcm.cavity_area > 0.0) {
                return Err(EspSettingsError::NonPositiveCavityArea(pcm.cavity_area));
            }
        }
        Ok(())
    }
}

/// Options controlling a single ESP generation run, as opposed to the level
/// of theory captured by [`EspSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EspOptions {
    /// Whether to energy minimize the conformer prior to computing the ESP,
    /// at the same level of theory the ESP is computed at.
    pub minimize: bool,
    /// Whether to compute the ESP at each grid point.
    pub compute_esp: bool,
    /// Whether to compute the electric field at each grid point.
    pub compute_field: bool,
    /// The number of threads the QM package may use.
    pub n_threads: usize,
}

impl Default for EspOptions {
    fn default() -> Self {
        Self {
            minimize: false,
            compute_esp: true,
            compute_field: true,
            n_threads: 1,
        }
    }
}

/// The output of an ESP generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EspResult {
    /// The final conformer in Angstroms. Identical to the input conformer
    /// unless minimization was requested.
    pub conformer: Vec<Point3<f64>>,
    /// The grid the ESP was generated on, in Angstroms.
    pub grid: Vec<Point3<f64>>,
    /// The ESP at each grid point in Hartree / e, when requested.
    pub esp: Option<Vec<f64>>,
    /// The electric field at each grid point in Hartree / (e * a0), when
    /// requested.
    pub field: Option<Vec<Vector3<f64>>>,
}

/// The interface for backends able to generate the electrostatic potential
/// of a molecule on a grid.
///
/// Implementors provide [`generate_in_directory`](Self::generate_in_directory)
/// and receive a pre-generated grid; the provided
/// [`generate`](Self::generate) entry point builds the grid from the settings
/// and manages the working directory, creating a temporary one when none is
/// given.
pub trait EspGenerator {
    type Error: std::error::Error + From<GridError> + From<io::Error>;

    /// Runs the calculation in an existing directory with an already
    /// generated grid, returning the final conformer, the ESP and the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the calculation cannot be set up, fails to run,
    /// or produces unparseable output.
    fn generate_in_directory(
        molecule: &Molecule,
        conformer: &[Point3<f64>],
        grid: &[Point3<f64>],
        settings: &EspSettings,
        options: &EspOptions,
        directory: &Path,
    ) -> Result<(Vec<Point3<f64>>, Option<Vec<f64>>, Option<Vec<Vector3<f64>>>), Self::Error>;

    /// Generates the ESP of a molecule on a grid defined by the settings.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to generate the ESP for.
    /// * `conformer` - The conformer to generate the ESP of, in Angstroms.
    /// * `settings` - The settings to use in the calculation.
    /// * `options` - Per-run options (minimization, outputs, threads).
    /// * `directory` - The directory to run the calculation in. A temporary
    ///   directory is created and cleaned up when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conformer is invalid, grid generation fails,
    /// or the backend calculation fails.
    fn generate(
        molecule: &Molecule,
        conformer: &[Point3<f64>],
        settings: &EspSettings,
        options: &EspOptions,
        directory: Option<&Path>,
    ) -> Result<EspResult, Self::Error> {
        // Grid generation validates the conformer before any points are laid
        // down, so a broken geometry never reaches the QM package.
        let grid = GridGenerator::generate(molecule, conformer, &settings.grid_settings)?;

        let (final_conformer, esp, field) = match directory {
            Some(directory) => {
                std::fs::create_dir_all(directory)?;
                Self::generate_in_directory(
                    molecule, conformer, &grid, settings, options, directory,
                )?
            }
            None => {
                let scratch = tempfile::tempdir()?;
                Self::generate_in_directory(
                    molecule,
                    conformer,
                    &grid,
                    settings,
                    options,
                    scratch.path(),
                )?
            }
        };

        Ok(EspResult {
            conformer: final_conformer,
            grid,
            esp,
            field,
        })
    }
}
