//! Conformer validation.
//!
//! Conformers enter the framework from trajectory files rather than being
//! generated internally, so before any grid or QM work starts they are
//! checked for the failure modes that would otherwise surface as cryptic
//! numerical errors: a coordinate count that does not match the topology,
//! non-finite coordinates, and atom pairs that sit essentially on top of each
//! other.

use crate::models::Molecule;
use nalgebra::Point3;
use thiserror::Error;

/// The minimum separation, in Angstroms, below which two atoms are treated
/// as overlapping.
const MIN_ATOM_SEPARATION: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum ConformerError {
    #[error("conformer has {actual} coordinates but the molecule has {expected} atoms")]
    AtomCountMismatch { expected: usize, actual: usize },

    #[error("coordinate of atom {index} is not finite")]
    NonFiniteCoordinate { index: usize },

    #[error(
        "atoms {first} and {second} are separated by {distance:.3} A, below the \
         {minimum:.3} A minimum"
    )]
    AtomsOverlap {
        first: usize,
        second: usize,
        distance: f64,
        minimum: f64,
    },
}

/// Validates a conformer against its parent molecule.
///
/// Single-atom conformers are always geometrically valid; the overlap check
/// only applies to systems with at least two atoms.
pub fn validate_conformer(
    molecule: &Molecule,
    conformer: &[Point3<f64>],
) -> Result<(), ConformerError> {
    if conformer.len() != molecule.n_atoms() {
        return Err(ConformerError::AtomCountMismatch {
            expected: molecule.n_atoms(),
            actual: conformer.len(),
        });
    }

    for (index, point) in conformer.iter().enumerate() {
        if !point.coords.iter().all(|value| value.is_finite()) {
            return Err(ConformerError::NonFiniteCoordinate { index });
        }
    }

    for first in 0..conformer.len() {
        for second in (first + 1)..conformer.len() {
            let distance = (conformer[first] - conformer[second]).norm();
            if distance < MIN_ATOM_SEPARATION {
                return Err(ConformerError::AtomsOverlap {
                    first,
                    second,
                    distance,
                    minimum: MIN_ATOM_SEPARATION,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn a_valid_conformer_passes() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        assert_eq!(validate_conformer(&molecule, &conformer), Ok(()));
    }

    #[test]
    fn atom_count_mismatch_is_reported() {
        let molecule = parse_smiles("C").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        assert_eq!(
            validate_conformer(&molecule, &conformer),
            Err(ConformerError::AtomCountMismatch {
                expected: 5,
                actual: 1
            })
        );
    }

    #[test]
    fn non_finite_coordinates_are_reported() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(f64::NAN, 0.0, 0.0)];

        assert_eq!(
            validate_conformer(&molecule, &conformer),
            Err(ConformerError::NonFiniteCoordinate { index: 0 })
        );
    }

    #[test]
    fn overlapping_atoms_are_reported() {
        let molecule = parse_smiles("O").unwrap();
        let conformer = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.96, 0.0),
        ];

        assert!(matches!(
            validate_conformer(&molecule, &conformer),
            Err(ConformerError::AtomsOverlap {
                first: 0,
                second: 1,
                ..
            })
        ));
    }
}
