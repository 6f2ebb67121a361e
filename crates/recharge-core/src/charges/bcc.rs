//! Bond charge corrections (BCCs).
//!
//! A BCC moves a fixed amount of charge across a bond whose two ends match a
//! pair of atom environment codes. Each atom is assigned a two-digit code
//! from its element and bonding environment; a correction is identified by
//! the six-digit string `<first><bond><second>`, e.g. `110141` for an
//! sp3-carbon / hydrogen single bond. Because every correction adds `value`
//! to one end and subtracts it from the other, applying a correction set
//! conserves the total molecular charge.

use super::ChargeAssignmentError;
use crate::models::{BondOrder, Element, Molecule};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// The elements the correction scheme assigns environment codes to.
const COVERED_ELEMENTS: &[Element] = &[
    Element::H,
    Element::C,
    Element::N,
    Element::O,
    Element::F,
    Element::P,
    Element::S,
    Element::Cl,
    Element::Br,
];

/// A single bond charge correction parameter.
///
/// `value` is the charge, in elementary charge units, moved from the atom
/// matching `second` onto the atom matching `first`.
#[derive(Debug, Clone, PartialEq)]
pub struct BccParameter {
    pub first: u8,
    pub second: u8,
    pub bond: BondOrder,
    pub value: f64,
}

impl BccParameter {
    /// The six-digit provenance code identifying this correction.
    pub fn code(&self) -> String {
        format!("{:02}{:02}{:02}", self.first, self.bond.order(), self.second)
    }
}

/// A set of bond charge correction parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BccCollection {
    pub parameters: Vec<BccParameter>,
}

#[derive(Debug, Error)]
pub enum BccLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },

    #[error("'{path}' row {row}: '{value}' is not a valid bond order (1, 2 or 3)")]
    InvalidBondOrder {
        path: String,
        row: usize,
        value: u8,
    },
}

#[derive(Debug, Deserialize)]
struct BccRecord {
    first: u8,
    second: u8,
    bond: u8,
    value: f64,
}

impl BccCollection {
    /// Loads a correction set from a CSV file with columns
    /// `first,second,bond,value`, where `bond` is the integral bond order.
    pub fn from_csv_path(path: &Path) -> Result<Self, BccLoadError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| BccLoadError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut parameters = Vec::new();
        for (row, result) in reader.deserialize::<BccRecord>().enumerate() {
            let record = result.map_err(|e| BccLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

            let bond = match record.bond {
                1 => BondOrder::Single,
                2 => BondOrder::Double,
                3 => BondOrder::Triple,
                other => {
                    return Err(BccLoadError::InvalidBondOrder {
                        path: path.to_string_lossy().to_string(),
                        row: row + 1,
                        value: other,
                    });
                }
            };

            parameters.push(BccParameter {
                first: record.first,
                second: record.second,
                bond,
                value: record.value,
            });
        }

        Ok(Self { parameters })
    }

    /// Finds the parameter matching a bond between two atom codes.
    ///
    /// Returns the parameter together with the sign the correction should be
    /// applied with: `1.0` when `(code_a, code_b)` matches `(first, second)`
    /// directly and `-1.0` when it matches reversed.
    fn find(&self, code_a: u8, code_b: u8, bond: BondOrder) -> Option<(&BccParameter, f64)> {
        self.parameters
            .iter()
            .find_map(|parameter| {
                if parameter.bond != bond {
                    return None;
                }
                if parameter.first == code_a && parameter.second == code_b {
                    Some((parameter, 1.0))
                } else if parameter.first == code_b && parameter.second == code_a {
                    Some((parameter, -1.0))
                } else {
                    None
                }
            })
    }
}

/// Applies bond charge corrections to molecules.
pub struct BccGenerator;

impl BccGenerator {
    /// The corrections from `collection` that a molecule exercises, one per
    /// bond, in bond order.
    ///
    /// # Errors
    ///
    /// Returns an error if an atom's element is outside the covered set or a
    /// bond has no matching parameter.
    pub fn applied_corrections<'c>(
        molecule: &Molecule,
        collection: &'c BccCollection,
    ) -> Result<Vec<&'c BccParameter>, ChargeAssignmentError> {
        let codes = assign_atom_codes(molecule)?;

        let mut applied = Vec::with_capacity(molecule.bonds().len());
        for bond in molecule.bonds() {
            let code_a = codes[bond.atom_a];
            let code_b = codes[bond.atom_b];

            let (parameter, _) = collection.find(code_a, code_b, bond.order).ok_or_else(|| {
                ChargeAssignmentError::MissingParameter {
                    code: format!("{:02}{:02}{:02}", code_a, bond.order.order(), code_b),
                }
            })?;
            applied.push(parameter);
        }
        Ok(applied)
    }

    /// Applies the corrections in `collection` on top of `base_charges`,
    /// returning the corrected per-atom charges.
    ///
    /// The total charge is conserved: each correction moves charge between
    /// the two ends of a bond.
    ///
    /// # Errors
    ///
    /// Returns an error if the base charge count does not match the
    /// molecule, an element is uncovered, or a bond has no parameter.
    pub fn generate(
        molecule: &Molecule,
        base_charges: &[f64],
        collection: &BccCollection,
    ) -> Result<Vec<f64>, ChargeAssignmentError> {
        if base_charges.len() != molecule.n_atoms() {
            return Err(ChargeAssignmentError::ChargeCountMismatch {
                expected: molecule.n_atoms(),
                actual: base_charges.len(),
            });
        }

        let codes = assign_atom_codes(molecule)?;
        let mut charges = base_charges.to_vec();

        for bond in molecule.bonds() {
            let code_a = codes[bond.atom_a];
            let code_b = codes[bond.atom_b];

            let (parameter, sign) =
                collection.find(code_a, code_b, bond.order).ok_or_else(|| {
                    ChargeAssignmentError::MissingParameter {
                        code: format!("{:02}{:02}{:02}", code_a, bond.order.order(), code_b),
                    }
                })?;

            charges[bond.atom_a] += sign * parameter.value;
            charges[bond.atom_b] -= sign * parameter.value;
        }

        Ok(charges)
    }
}

/// Assigns the two-digit environment code of every atom in a molecule.
fn assign_atom_codes(molecule: &Molecule) -> Result<Vec<u8>, ChargeAssignmentError> {
    (0..molecule.n_atoms())
        .map(|index| atom_code(molecule, index))
        .collect()
}

fn atom_code(molecule: &Molecule, index: usize) -> Result<u8, ChargeAssignmentError> {
    let atom = &molecule.atoms()[index];
    let element = atom.element;

    if !COVERED_ELEMENTS.contains(&element) {
        return Err(ChargeAssignmentError::UnsupportedElement { element, index });
    }

    let max_order = molecule
        .bonds()
        .iter()
        .filter(|bond| bond.atom_a == index || bond.atom_b == index)
        .map(|bond| bond.order)
        .max();

    let code = match element {
        Element::H => {
            // Hydrogens are typed by the heavy atom they sit on.
            let neighbor = molecule
                .neighbors(index)
                .first()
                .map(|&n| molecule.atoms()[n].element);
            match neighbor {
                Some(Element::C) => 41,
                Some(Element::N) => 42,
                Some(Element::O) => 43,
                Some(Element::S) | Some(Element::P) => 44,
                _ => 40,
            }
        }
        Element::C => {
            let carbonyl = molecule.bonds().iter().any(|bond| {
                bond.order == BondOrder::Double
                    && ((bond.atom_a == index
                        && molecule.atoms()[bond.atom_b].element == Element::O)
                        || (bond.atom_b == index
                            && molecule.atoms()[bond.atom_a].element == Element::O))
            });
            if carbonyl {
                14
            } else {
                match max_order {
                    Some(BondOrder::Triple) => 13,
                    Some(BondOrder::Double) => 12,
                    _ => 11,
                }
            }
        }
        Element::N => {
            if atom.formal_charge > 0 {
                24
            } else {
                match max_order {
                    Some(BondOrder::Triple) => 23,
                    Some(BondOrder::Double) => 22,
                    _ => 21,
                }
            }
        }
        Element::O => {
            if atom.formal_charge < 0 {
                33
            } else if max_order == Some(BondOrder::Double) {
                32
            } else {
                31
            }
        }
        Element::F => 51,
        Element::Cl => 52,
        Element::Br => 53,
        Element::S => {
            if molecule.bond_order_sum(index) > 2 {
                62
            } else {
                61
            }
        }
        Element::P => 71,
        Element::B | Element::I => unreachable!("filtered by the covered-element check"),
    };

    Ok(code)
}

/// A compact built-in correction set covering common organic bonding
/// patterns.
///
/// Production charge models should load a complete, validated parameter
/// table with [`BccCollection::from_csv_path`]; this set exists so the
/// tooling works out of the box on small molecules.
pub fn default_corrections() -> BccCollection {
    let entries: &[(u8, u8, u8, f64)] = &[
        // carbon - hydrogen
        (11, 1, 41, 0.0140),
        (12, 1, 41, 0.0320),
        (13, 1, 41, 0.0470),
        (14, 1, 41, 0.0490),
        // carbon - carbon
        (11, 1, 11, 0.0),
        (11, 1, 12, -0.0024),
        (11, 1, 13, -0.0160),
        (11, 1, 14, -0.0102),
        (12, 1, 12, 0.0),
        (12, 2, 12, 0.0),
        (13, 3, 13, 0.0),
        // carbon - nitrogen
        (11, 1, 21, 0.0080),
        (11, 1, 24, 0.0290),
        (12, 2, 22, 0.0180),
        (13, 3, 23, 0.0320),
        // carbon - oxygen
        (11, 1, 31, 0.0310),
        (14, 1, 31, -0.0170),
        (14, 2, 32, 0.0210),
        (14, 1, 33, -0.0330),
        // carbon - halogen / sulfur
        (11, 1, 51, 0.0020),
        (11, 1, 52, -0.0060),
        (11, 1, 53, -0.0100),
        (11, 1, 61, -0.0041),
        // heteroatom - hydrogen
        (21, 1, 42, -0.0100),
        (22, 1, 42, -0.0090),
        (24, 1, 42, -0.0110),
        (31, 1, 43, -0.0150),
        (61, 1, 44, 0.0090),
        // nitrogen - oxygen
        (21, 1, 33, -0.0430),
        (22, 2, 32, 0.0260),
    ];

    BccCollection {
        parameters: entries
            .iter()
            .map(|&(first, bond, second, value)| BccParameter {
                first,
                second,
                bond: match bond {
                    2 => BondOrder::Double,
                    3 => BondOrder::Triple,
                    _ => BondOrder::Single,
                },
                value,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn methane_matches_four_identical_corrections() {
        let molecule = parse_smiles("C").unwrap();
        let collection = default_corrections();

        let applied = BccGenerator::applied_corrections(&molecule, &collection).unwrap();
        assert_eq!(applied.len(), 4);
        for parameter in applied {
            assert_eq!(parameter.code(), "110141");
        }
    }

    #[test]
    fn corrections_conserve_the_total_charge() {
        let molecule = parse_smiles("CO").unwrap();
        let collection = default_corrections();

        let base = vec![0.0; molecule.n_atoms()];
        let charges = BccGenerator::generate(&molecule, &base, &collection).unwrap();

        let total: f64 = charges.iter().sum();
        assert!(total.abs() < 1e-12);
        assert!(charges.iter().any(|&charge| charge != 0.0));
    }

    #[test]
    fn corrections_apply_antisymmetrically() {
        // A single C-H bond in methane moves +value onto the carbon and
        // -value onto each hydrogen.
        let molecule = parse_smiles("C").unwrap();
        let collection = default_corrections();

        let base = vec![0.0; 5];
        let charges = BccGenerator::generate(&molecule, &base, &collection).unwrap();

        assert!((charges[0] - 4.0 * 0.0140).abs() < 1e-12);
        for &charge in &charges[1..] {
            assert!((charge + 0.0140).abs() < 1e-12);
        }
    }

    #[test]
    fn reversed_parameter_order_flips_the_sign() {
        let molecule = parse_smiles("C").unwrap();

        let forward = BccCollection {
            parameters: vec![BccParameter {
                first: 11,
                second: 41,
                bond: BondOrder::Single,
                value: 0.05,
            }],
        };
        let reversed = BccCollection {
            parameters: vec![BccParameter {
                first: 41,
                second: 11,
                bond: BondOrder::Single,
                value: -0.05,
            }],
        };

        let base = vec![0.0; 5];
        let a = BccGenerator::generate(&molecule, &base, &forward).unwrap();
        let b = BccGenerator::generate(&molecule, &base, &reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_parameters_name_the_code() {
        let molecule = parse_smiles("C").unwrap();
        let empty = BccCollection::default();

        let error = BccGenerator::applied_corrections(&molecule, &empty).unwrap_err();
        assert_eq!(
            error,
            ChargeAssignmentError::MissingParameter {
                code: "110141".to_string()
            }
        );
    }

    #[test]
    fn uncovered_elements_are_rejected() {
        let molecule = parse_smiles("[B]").unwrap();
        let collection = default_corrections();

        assert_eq!(
            BccGenerator::applied_corrections(&molecule, &collection).unwrap_err(),
            ChargeAssignmentError::UnsupportedElement {
                element: Element::B,
                index: 0
            }
        );
    }

    #[test]
    fn base_charge_count_must_match() {
        let molecule = parse_smiles("C").unwrap();
        let collection = default_corrections();

        assert_eq!(
            BccGenerator::generate(&molecule, &[0.0], &collection).unwrap_err(),
            ChargeAssignmentError::ChargeCountMismatch {
                expected: 5,
                actual: 1
            }
        );
    }

    #[test]
    fn hydroxylamine_anion_is_covered_by_the_default_set() {
        let molecule = parse_smiles("N[O-]").unwrap();
        let collection = default_corrections();

        let applied = BccGenerator::applied_corrections(&molecule, &collection).unwrap();
        let codes: Vec<String> = applied.iter().map(|p| p.code()).collect();
        assert!(codes.contains(&"210133".to_string()));
    }

    #[test]
    fn environment_codes_distinguish_carbonyl_carbons() {
        // Acetic acid: the carboxyl carbon types as 14, the methyl as 11.
        let molecule = parse_smiles("CC(=O)O").unwrap();
        let collection = default_corrections();

        let applied = BccGenerator::applied_corrections(&molecule, &collection).unwrap();
        let codes: Vec<String> = applied.iter().map(|p| p.code()).collect();
        assert!(codes.contains(&"110114".to_string()));
        assert!(codes.contains(&"140232".to_string()));
        assert!(codes.contains(&"140131".to_string()));
    }

    #[test]
    fn collections_load_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bcc.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "first,second,bond,value").unwrap();
        writeln!(file, "11,41,1,0.0140").unwrap();
        writeln!(file, "12,12,2,0.0").unwrap();

        let collection = BccCollection::from_csv_path(&path).unwrap();
        assert_eq!(collection.parameters.len(), 2);
        assert_eq!(collection.parameters[0].code(), "110141");
        assert_eq!(collection.parameters[1].bond, BondOrder::Double);
    }

    #[test]
    fn invalid_bond_orders_in_csv_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bcc.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "first,second,bond,value").unwrap();
        writeln!(file, "11,41,7,0.0140").unwrap();

        assert!(matches!(
            BccCollection::from_csv_path(&path),
            Err(BccLoadError::InvalidBondOrder { row: 1, value: 7, .. })
        ));
    }
}
