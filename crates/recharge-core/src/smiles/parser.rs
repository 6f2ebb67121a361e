use super::SmilesError;
use crate::models::{Atom, BondOrder, Element, Molecule};
use std::collections::HashMap;

const ORGANIC_SUBSET: &[Element] = &[
    Element::B,
    Element::C,
    Element::N,
    Element::O,
    Element::P,
    Element::S,
    Element::F,
    Element::Cl,
    Element::Br,
    Element::I,
];

/// Parses a kekulized SMILES string into a [`Molecule`].
///
/// Implicit hydrogens are materialized as explicit atoms appended after the
/// heavy atoms, each bonded to its parent by a single bond.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    Parser::new(smiles).run()
}

/// The per-atom state accumulated before hydrogens are materialized.
struct ParsedAtom {
    atom: Atom,
    /// `Some` for bracket atoms, which carry their hydrogen count explicitly.
    explicit_h: Option<u8>,
}

struct PendingBond {
    order: BondOrder,
    position: usize,
}

struct Parser {
    input: Vec<char>,
    pos: usize,
    atoms: Vec<ParsedAtom>,
    molecule: Molecule,
    prev: Option<usize>,
    branch_stack: Vec<Option<usize>>,
    pending_bond: Option<PendingBond>,
    ring_bonds: HashMap<u16, (usize, Option<BondOrder>)>,
}

impl Parser {
    fn new(smiles: &str) -> Self {
        Self {
            input: smiles.chars().collect(),
            pos: 0,
            atoms: Vec::new(),
            molecule: Molecule::new(),
            prev: None,
            branch_stack: Vec::new(),
            pending_bond: None,
            ring_bonds: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn run(mut self) -> Result<Molecule, SmilesError> {
        while let Some(c) = self.peek() {
            let position = self.pos;
            match c {
                '(' => {
                    self.bump();
                    if self.prev.is_none() {
                        return Err(SmilesError::UnexpectedCharacter {
                            character: c,
                            position,
                        });
                    }
                    self.branch_stack.push(self.prev);
                }
                ')' => {
                    self.bump();
                    match self.branch_stack.pop() {
                        Some(restored) => self.prev = restored,
                        None => {
                            return Err(SmilesError::UnmatchedBranchClose { position });
                        }
                    }
                }
                '-' | '=' | '#' | '/' | '\\' => {
                    self.bump();
                    if self.prev.is_none() {
                        return Err(SmilesError::DanglingBond { position });
                    }
                    // Directional bonds only carry stereochemistry, which the
                    // charge tooling does not consume.
                    let order = match c {
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        _ => BondOrder::Single,
                    };
                    self.pending_bond = Some(PendingBond { order, position });
                }
                '.' => {
                    self.bump();
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond { position });
                    }
                    self.prev = None;
                }
                '0'..='9' => {
                    self.bump();
                    let label = c.to_digit(10).unwrap_or(0) as u16;
                    self.close_or_open_ring(label)?;
                }
                '%' => {
                    self.bump();
                    let label = self.parse_two_digit_ring_label(position)?;
                    self.close_or_open_ring(label)?;
                }
                '[' => {
                    self.parse_bracket_atom()?;
                }
                'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                    return Err(SmilesError::AromaticInput {
                        character: c,
                        position,
                    });
                }
                'A'..='Z' => {
                    self.parse_organic_atom()?;
                }
                _ => {
                    return Err(SmilesError::UnexpectedCharacter {
                        character: c,
                        position,
                    });
                }
            }
        }

        if let Some(pending) = &self.pending_bond {
            return Err(SmilesError::DanglingBond {
                position: pending.position,
            });
        }
        if !self.branch_stack.is_empty() {
            return Err(SmilesError::UnclosedBranch {
                count: self.branch_stack.len(),
            });
        }
        if let Some(label) = self.ring_bonds.keys().min().copied() {
            return Err(SmilesError::UnclosedRingBond { label });
        }
        if self.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        self.materialize_hydrogens()
    }

    fn parse_two_digit_ring_label(&mut self, position: usize) -> Result<u16, SmilesError> {
        let mut label = 0u16;
        for _ in 0..2 {
            match self.bump() {
                Some(d) if d.is_ascii_digit() => {
                    label = label * 10 + d.to_digit(10).unwrap_or(0) as u16;
                }
                other => {
                    return Err(SmilesError::UnexpectedCharacter {
                        character: other.unwrap_or('%'),
                        position,
                    });
                }
            }
        }
        Ok(label)
    }

    fn close_or_open_ring(&mut self, label: u16) -> Result<(), SmilesError> {
        let current = match self.prev {
            Some(index) => index,
            None => {
                return Err(SmilesError::DanglingBond { position: self.pos });
            }
        };
        let pending = self.pending_bond.take().map(|bond| bond.order);

        match self.ring_bonds.remove(&label) {
            Some((partner, opened_order)) => {
                if partner == current {
                    return Err(SmilesError::SelfRingBond { label });
                }
                let order = match (opened_order, pending) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::ConflictingRingBond { label });
                    }
                    (Some(order), _) | (_, Some(order)) => order,
                    (None, None) => BondOrder::Single,
                };
                self.molecule.add_bond(partner, current, order);
            }
            None => {
                self.ring_bonds.insert(label, (current, pending));
            }
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<(), SmilesError> {
        let position = self.pos;
        let first = self.bump().unwrap_or(' ');

        // Two-letter organic-subset symbols are Cl and Br only.
        let symbol = match (first, self.peek()) {
            ('C', Some('l')) => {
                self.bump();
                "Cl".to_string()
            }
            ('B', Some('r')) => {
                self.bump();
                "Br".to_string()
            }
            _ => first.to_string(),
        };

        let element = Element::from_symbol(&symbol)
            .filter(|element| ORGANIC_SUBSET.contains(element))
            .ok_or(SmilesError::UnknownElement {
                symbol: symbol.clone(),
                position,
            })?;

        self.finish_atom(ParsedAtom {
            atom: Atom::new(element),
            explicit_h: None,
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<(), SmilesError> {
        let open_position = self.pos;
        self.bump(); // consume '['

        // Isotope labels are accepted and discarded; isotopes do not affect
        // the electron count or the electrostatics.
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        let element_position = self.pos;
        let element = match self.peek() {
            Some(c @ ('b' | 'c' | 'n' | 'o' | 'p' | 's')) => {
                return Err(SmilesError::AromaticInput {
                    character: c,
                    position: element_position,
                });
            }
            Some(c) if c.is_ascii_uppercase() => {
                self.bump();
                let mut symbol = c.to_string();
                // A lowercase letter after the first can only belong to a
                // two-letter element symbol.
                if let Some(next) = self.peek() {
                    if next.is_ascii_lowercase() {
                        self.bump();
                        symbol.push(next);
                    }
                }
                Element::from_symbol(&symbol).ok_or(SmilesError::UnknownElement {
                    symbol,
                    position: element_position,
                })?
            }
            Some(c) => {
                return Err(SmilesError::UnexpectedCharacter {
                    character: c,
                    position: element_position,
                });
            }
            None => {
                return Err(SmilesError::UnclosedBracket {
                    position: open_position,
                });
            }
        };

        // Chirality markers are accepted and discarded.
        while self.peek() == Some('@') {
            self.bump();
        }

        let mut hydrogen_count = 0u8;
        if self.peek() == Some('H') {
            self.bump();
            hydrogen_count = 1;
            if let Some(d) = self.peek().filter(|c| c.is_ascii_digit()) {
                self.bump();
                hydrogen_count = d.to_digit(10).unwrap_or(0) as u8;
            }
        }

        let mut formal_charge = 0i8;
        match self.peek() {
            Some(sign @ ('+' | '-')) => {
                self.bump();
                let unit: i8 = if sign == '+' { 1 } else { -1 };
                let mut magnitude = 1i8;
                if let Some(d) = self.peek().filter(|c| c.is_ascii_digit()) {
                    self.bump();
                    magnitude = d.to_digit(10).unwrap_or(0) as i8;
                } else {
                    while self.peek() == Some(sign) {
                        self.bump();
                        magnitude += 1;
                    }
                }
                formal_charge = unit * magnitude;
            }
            _ => {}
        }

        // Atom-class labels are accepted and discarded.
        if self.peek() == Some(':') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }

        if self.bump() != Some(']') {
            return Err(SmilesError::UnclosedBracket {
                position: open_position,
            });
        }

        self.finish_atom(ParsedAtom {
            atom: Atom::charged(element, formal_charge),
            explicit_h: Some(hydrogen_count),
        })
    }

    fn finish_atom(&mut self, parsed: ParsedAtom) -> Result<(), SmilesError> {
        let index = self.molecule.add_atom(parsed.atom);
        self.atoms.push(parsed);

        if let Some(previous) = self.prev {
            let order = self
                .pending_bond
                .take()
                .map(|bond| bond.order)
                .unwrap_or(BondOrder::Single);
            self.molecule.add_bond(previous, index, order);
        }
        self.prev = Some(index);
        Ok(())
    }

    fn materialize_hydrogens(mut self) -> Result<Molecule, SmilesError> {
        let mut hydrogen_counts = Vec::with_capacity(self.atoms.len());

        for (index, parsed) in self.atoms.iter().enumerate() {
            let count = match parsed.explicit_h {
                Some(count) => count,
                None => {
                    let bond_order_sum = self.molecule.bond_order_sum(index);
                    let valence = parsed
                        .atom
                        .element
                        .default_valences()
                        .iter()
                        .copied()
                        .find(|&v| v >= bond_order_sum)
                        .ok_or(SmilesError::ValenceExceeded {
                            index,
                            element: parsed.atom.element,
                            bond_order_sum,
                        })?;
                    valence - bond_order_sum
                }
            };
            hydrogen_counts.push(count);
        }

        for (index, count) in hydrogen_counts.into_iter().enumerate() {
            for _ in 0..count {
                let hydrogen = self.molecule.add_atom(Atom::new(Element::H));
                self.molecule.add_bond(index, hydrogen, BondOrder::Single);
            }
        }

        Ok(self.molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methane_gains_four_implicit_hydrogens() {
        let molecule = parse_smiles("C").unwrap();

        assert_eq!(molecule.n_atoms(), 5);
        assert_eq!(molecule.atoms()[0].element, Element::C);
        for atom in &molecule.atoms()[1..] {
            assert_eq!(atom.element, Element::H);
        }
        assert_eq!(molecule.bonds().len(), 4);
        assert_eq!(molecule.net_charge(), 0);
    }

    #[test]
    fn chloride_anion_parses_as_a_single_charged_atom() {
        let molecule = parse_smiles("[Cl-]").unwrap();

        assert_eq!(molecule.n_atoms(), 1);
        assert_eq!(molecule.atoms()[0].element, Element::Cl);
        assert_eq!(molecule.atoms()[0].formal_charge, -1);
        assert_eq!(molecule.multiplicity(), 1);
    }

    #[test]
    fn bare_boron_is_an_open_shell_atom() {
        let molecule = parse_smiles("[B]").unwrap();

        assert_eq!(molecule.n_atoms(), 1);
        assert_eq!(molecule.multiplicity(), 2);
    }

    #[test]
    fn hydroxylamine_anion_resolves_mixed_hydrogens() {
        // N gets two implicit hydrogens; the bracket oxygen gets none.
        let molecule = parse_smiles("N[O-]").unwrap();

        assert_eq!(molecule.n_atoms(), 4);
        assert_eq!(molecule.atoms()[0].element, Element::N);
        assert_eq!(molecule.atoms()[1].element, Element::O);
        assert_eq!(molecule.atoms()[1].formal_charge, -1);
        assert_eq!(molecule.net_charge(), -1);
    }

    #[test]
    fn double_bonds_reduce_the_hydrogen_count() {
        // Ethene: two carbons, two hydrogens each.
        let molecule = parse_smiles("C=C").unwrap();

        assert_eq!(molecule.n_atoms(), 6);
        assert_eq!(molecule.bond_order_sum(0), 4);
        assert_eq!(molecule.bond_order_sum(1), 4);
    }

    #[test]
    fn branches_attach_to_the_correct_atom() {
        // Isobutane: central carbon bonded to three methyls.
        let molecule = parse_smiles("CC(C)C").unwrap();

        assert_eq!(molecule.neighbors(1).len(), 4);
        assert_eq!(molecule.bond_order_sum(1), 4);
    }

    #[test]
    fn ring_closures_form_a_cycle() {
        // Cyclohexane: every carbon has exactly two carbon neighbors.
        let molecule = parse_smiles("C1CCCCC1").unwrap();

        let heavy_bonds = molecule
            .bonds()
            .iter()
            .filter(|bond| {
                molecule.atoms()[bond.atom_a].element == Element::C
                    && molecule.atoms()[bond.atom_b].element == Element::C
            })
            .count();
        assert_eq!(heavy_bonds, 6);
    }

    #[test]
    fn kekulized_benzene_parses_without_aromatic_atoms() {
        let molecule = parse_smiles("C1=CC=CC=C1").unwrap();

        let carbons = molecule
            .atoms()
            .iter()
            .filter(|atom| atom.element == Element::C)
            .count();
        let hydrogens = molecule
            .atoms()
            .iter()
            .filter(|atom| atom.element == Element::H)
            .count();
        assert_eq!(carbons, 6);
        assert_eq!(hydrogens, 6);
    }

    #[test]
    fn aromatic_smiles_are_rejected() {
        let error = parse_smiles("c1ccccc1").unwrap_err();
        assert!(matches!(error, SmilesError::AromaticInput { .. }));
    }

    #[test]
    fn explicit_bracket_hydrogens_are_honored() {
        let molecule = parse_smiles("[NH4+]").unwrap();

        assert_eq!(molecule.n_atoms(), 5);
        assert_eq!(molecule.net_charge(), 1);
    }

    #[test]
    fn multi_character_charges_parse() {
        let molecule = parse_smiles("[O-2]").unwrap();
        assert_eq!(molecule.atoms()[0].formal_charge, -2);

        let molecule = parse_smiles("[O--]").unwrap();
        assert_eq!(molecule.atoms()[0].formal_charge, -2);
    }

    #[test]
    fn dot_separates_disconnected_fragments() {
        let molecule = parse_smiles("[Na+].[Cl-]");
        // Sodium is outside the supported element set.
        assert!(matches!(
            molecule,
            Err(SmilesError::UnknownElement { .. })
        ));

        let molecule = parse_smiles("O.O").unwrap();
        assert_eq!(molecule.n_atoms(), 6);
        assert_eq!(molecule.bonds().len(), 4);
    }

    #[test]
    fn structural_errors_are_reported() {
        assert_eq!(parse_smiles(""), Err(SmilesError::Empty));
        assert!(matches!(
            parse_smiles("C(C"),
            Err(SmilesError::UnclosedBranch { count: 1 })
        ));
        assert!(matches!(
            parse_smiles("CC)"),
            Err(SmilesError::UnmatchedBranchClose { .. })
        ));
        assert!(matches!(
            parse_smiles("C1CC"),
            Err(SmilesError::UnclosedRingBond { label: 1 })
        ));
        assert!(matches!(
            parse_smiles("C="),
            Err(SmilesError::DanglingBond { .. })
        ));
        assert!(matches!(
            parse_smiles("[CH4"),
            Err(SmilesError::UnclosedBracket { .. })
        ));
    }

    #[test]
    fn conflicting_ring_bond_orders_are_rejected() {
        let error = parse_smiles("C=1CCCCC#1").unwrap_err();
        assert_eq!(error, SmilesError::ConflictingRingBond { label: 1 });
    }

    #[test]
    fn valence_overflow_is_reported() {
        let error = parse_smiles("O(C)(C)C").unwrap_err();
        assert!(matches!(error, SmilesError::ValenceExceeded { .. }));
    }

    #[test]
    fn percent_ring_labels_are_supported() {
        let molecule = parse_smiles("C%12CCCCC%12").unwrap();
        let ring_bonds = molecule
            .bonds()
            .iter()
            .filter(|bond| {
                molecule.atoms()[bond.atom_a].element == Element::C
                    && molecule.atoms()[bond.atom_b].element == Element::C
            })
            .count();
        assert_eq!(ring_bonds, 6);
    }
}
