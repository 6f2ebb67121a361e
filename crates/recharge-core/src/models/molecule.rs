use super::atom::Atom;
use super::element::Element;

/// The order of a covalent bond.
///
/// Aromatic bond types are deliberately absent: molecules enter the framework
/// in kekulized form, so every bond carries an integral order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
}

impl BondOrder {
    /// The integral order used when summing an atom's bonded valence.
    pub fn order(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// A bond between two atoms, referenced by their indices in the parent
/// [`Molecule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub atom_a: usize,
    pub atom_b: usize,
    pub order: BondOrder,
}

/// A molecular graph: atoms plus the bonds connecting them.
///
/// Atom indices are stable for the lifetime of the molecule; there is no
/// removal API. Hydrogens are explicit atoms like any other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an atom and returns its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Appends a bond between two existing atoms.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds; bonds are only ever created
    /// by builders that already hold valid indices.
    pub fn add_bond(&mut self, atom_a: usize, atom_b: usize, order: BondOrder) {
        assert!(atom_a < self.atoms.len() && atom_b < self.atoms.len());
        self.bonds.push(Bond {
            atom_a,
            atom_b,
            order,
        });
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// The indices of all atoms bonded to `index`.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        self.bonds
            .iter()
            .filter_map(|bond| {
                if bond.atom_a == index {
                    Some(bond.atom_b)
                } else if bond.atom_b == index {
                    Some(bond.atom_a)
                } else {
                    None
                }
            })
            .collect()
    }

    /// The sum of bond orders at an atom, i.e. its bonded valence.
    pub fn bond_order_sum(&self, index: usize) -> u8 {
        self.bonds
            .iter()
            .filter(|bond| bond.atom_a == index || bond.atom_b == index)
            .map(|bond| bond.order.order())
            .sum()
    }

    /// The net formal charge of the molecule.
    pub fn net_charge(&self) -> i32 {
        self.atoms
            .iter()
            .map(|atom| i32::from(atom.formal_charge))
            .sum()
    }

    /// The total electron count, i.e. the sum of atomic numbers minus the net
    /// charge.
    pub fn n_electrons(&self) -> i32 {
        let protons: i32 = self
            .atoms
            .iter()
            .map(|atom| i32::from(atom.element.atomic_number()))
            .sum();
        protons - self.net_charge()
    }

    /// The spin multiplicity assumed for QM calculations: singlet for an even
    /// electron count, doublet otherwise.
    pub fn multiplicity(&self) -> u8 {
        if self.n_electrons() % 2 == 0 { 1 } else { 2 }
    }

    /// Whether every atom belongs to the given allowed-element set.
    pub fn contains_only(&self, allowed: &[Element]) -> bool {
        self.atoms.iter().all(|atom| allowed.contains(&atom.element))
    }
}
