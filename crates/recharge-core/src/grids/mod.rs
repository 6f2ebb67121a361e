//! Generation of the grids that electrostatic potentials are evaluated on.
//!
//! Grid points are drawn from a face-centered cubic lattice and retained only
//! inside a shell around the molecule: outside every atom's inner van der
//! Waals sphere, but inside at least one atom's outer sphere. The inner
//! cutoff keeps points out of the region where the ESP diverges near nuclei;
//! the outer cutoff bounds the fit region to where the potential still
//! carries charge information.

use crate::conformers::{validate_conformer, ConformerError};
use crate::models::Molecule;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid setting '{0}' must be positive")]
    NonPositiveSetting(&'static str),

    #[error(transparent)]
    Conformer(#[from] ConformerError),
}

/// The settings controlling FCC shell grid generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSettings {
    /// The lattice spacing in Angstroms.
    pub spacing: f64,
    /// Scales each atom's van der Waals radius to give the inner boundary of
    /// the retained shell.
    pub inner_vdw_scale: f64,
    /// Scales each atom's van der Waals radius to give the outer boundary of
    /// the retained shell.
    pub outer_vdw_scale: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            spacing: 0.5,
            inner_vdw_scale: 1.4,
            outer_vdw_scale: 2.0,
        }
    }
}

impl GridSettings {
    fn validate(&self) -> Result<(), GridError> {
        if !(self.spacing > 0.0) {
            return Err(GridError::NonPositiveSetting("spacing"));
        }
        if !(self.inner_vdw_scale > 0.0) {
            return Err(GridError::NonPositiveSetting("inner_vdw_scale"));
        }
        if !(self.outer_vdw_scale > 0.0) {
            return Err(GridError::NonPositiveSetting("outer_vdw_scale"));
        }
        Ok(())
    }
}

/// Generates the grids upon which the electrostatic potential of a molecule
/// is computed.
pub struct GridGenerator;

impl GridGenerator {
    /// Generates a grid of points in a shell around a molecule in a given
    /// conformer.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The molecule to generate the grid around.
    /// * `conformer` - The conformer of the molecule, one point per atom, in
    ///   Angstroms.
    /// * `settings` - The settings which describe how the grid should be
    ///   generated.
    ///
    /// # Errors
    ///
    /// Returns an error if a setting is non-positive or the conformer fails
    /// validation against the molecule.
    pub fn generate(
        molecule: &Molecule,
        conformer: &[Point3<f64>],
        settings: &GridSettings,
    ) -> Result<Vec<Point3<f64>>, GridError> {
        settings.validate()?;
        validate_conformer(molecule, conformer)?;

        let radii: Vec<f64> = molecule
            .atoms()
            .iter()
            .map(|atom| atom.element.bondi_radius())
            .collect();

        let center = conformer
            .iter()
            .fold(Vector3::zeros(), |sum, point| sum + point.coords)
            / conformer.len() as f64;

        // The bounding box the grid should roughly fit inside of.
        let mut extent = f64::MIN;
        for axis in 0..3 {
            let minimum = conformer
                .iter()
                .zip(&radii)
                .map(|(point, radius)| point[axis] - radius * settings.outer_vdw_scale)
                .fold(f64::MAX, f64::min);
            let maximum = conformer
                .iter()
                .zip(&radii)
                .map(|(point, radius)| point[axis] + radius * settings.outer_vdw_scale)
                .fold(f64::MIN, f64::max);
            extent = extent.max(maximum - minimum);
        }

        let n_cells = (extent / settings.spacing).ceil() as i64;

        let mut coordinates = Vec::new();

        for x in 0..=(n_cells * 2) {
            for y in 0..=(n_cells * 2) {
                for z in 0..=(n_cells * 2) {
                    let (a, b, c) = (x % 2 == 1, y % 2 == 1, z % 2 == 1);

                    // FCC lattice: corner sites plus the three face centers.
                    let is_lattice_site = (!a && !b && !c)
                        || (a && b && !c)
                        || (!a && b && c)
                        || (a && !b && c);
                    if !is_lattice_site {
                        continue;
                    }

                    let offset = Vector3::new(
                        (x - n_cells) as f64,
                        (y - n_cells) as f64,
                        (z - n_cells) as f64,
                    ) * 0.5
                        * settings.spacing;
                    let coordinate = Point3::from(center + offset);

                    let mut inside_inner = false;
                    let mut inside_outer = false;

                    for (point, radius) in conformer.iter().zip(&radii) {
                        let distance = (coordinate - point).norm();
                        if distance < radius * settings.inner_vdw_scale {
                            inside_inner = true;
                            break;
                        }
                        if distance <= radius * settings.outer_vdw_scale {
                            inside_outer = true;
                        }
                    }

                    if inside_inner || !inside_outer {
                        continue;
                    }

                    coordinates.push(coordinate);
                }
            }
        }

        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn default_settings_match_the_reference_values() {
        let settings = GridSettings::default();
        assert_eq!(settings.spacing, 0.5);
        assert_eq!(settings.inner_vdw_scale, 1.4);
        assert_eq!(settings.outer_vdw_scale, 2.0);
    }

    #[test]
    fn settings_deserialize_from_toml_with_defaults() {
        let settings: GridSettings = toml::from_str("spacing = 0.7").unwrap();
        assert_eq!(settings.spacing, 0.7);
        assert_eq!(settings.inner_vdw_scale, 1.4);
    }

    #[test]
    fn non_positive_settings_are_rejected() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let settings = GridSettings {
            spacing: 0.0,
            ..GridSettings::default()
        };
        assert_eq!(
            GridGenerator::generate(&molecule, &conformer, &settings),
            Err(GridError::NonPositiveSetting("spacing"))
        );
    }

    #[test]
    fn conformer_length_must_match_the_molecule() {
        let molecule = parse_smiles("C").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        assert_eq!(
            GridGenerator::generate(&molecule, &conformer, &GridSettings::default()),
            Err(GridError::Conformer(ConformerError::AtomCountMismatch {
                expected: 5,
                actual: 1
            }))
        );
    }

    #[test]
    fn grid_points_lie_within_the_shell() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];
        let settings = GridSettings::default();

        let grid = GridGenerator::generate(&molecule, &conformer, &settings).unwrap();
        assert!(!grid.is_empty());

        let radius = crate::models::Element::Cl.bondi_radius();
        for point in &grid {
            let distance = (point - conformer[0]).norm();
            assert!(distance >= radius * settings.inner_vdw_scale - 1e-12);
            assert!(distance <= radius * settings.outer_vdw_scale + 1e-12);
        }
    }

    #[test]
    fn multi_atom_grids_respect_every_atom_shell() {
        // A bent water geometry, oxygen first to match the parsed atom order.
        let molecule = parse_smiles("O").unwrap();
        let conformer = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.9572, 0.0, 0.0),
            Point3::new(-0.24, 0.9266, 0.0),
        ];
        let settings = GridSettings::default();

        let grid = GridGenerator::generate(&molecule, &conformer, &settings).unwrap();
        assert!(!grid.is_empty());

        let radii: Vec<f64> = molecule
            .atoms()
            .iter()
            .map(|atom| atom.element.bondi_radius())
            .collect();

        for point in &grid {
            let mut within_outer = false;
            for (atom_point, radius) in conformer.iter().zip(&radii) {
                let distance = (point - atom_point).norm();
                // Outside the inner sphere of every atom, not just the
                // nearest one.
                assert!(distance >= radius * settings.inner_vdw_scale - 1e-12);
                if distance <= radius * settings.outer_vdw_scale + 1e-12 {
                    within_outer = true;
                }
            }
            assert!(within_outer);
        }
    }

    #[test]
    fn coarser_spacing_yields_fewer_points() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let fine = GridGenerator::generate(&molecule, &conformer, &GridSettings::default())
            .unwrap()
            .len();
        let coarse = GridGenerator::generate(
            &molecule,
            &conformer,
            &GridSettings {
                spacing: 1.0,
                ..GridSettings::default()
            },
        )
        .unwrap()
        .len();

        assert!(coarse < fine);
        assert!(coarse > 0);
    }

    #[test]
    fn grid_is_centered_on_the_molecule() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let offset = Point3::new(10.0, -5.0, 2.5);
        let conformer = vec![offset];

        let grid =
            GridGenerator::generate(&molecule, &conformer, &GridSettings::default()).unwrap();

        let mean = grid
            .iter()
            .fold(Vector3::zeros(), |sum, point| sum + point.coords)
            / grid.len() as f64;

        // A symmetric shell around a single atom averages back to the atom.
        assert!((mean - offset.coords).norm() < 0.3);
    }
}
