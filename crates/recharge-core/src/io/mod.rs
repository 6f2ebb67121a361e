//! Structure file I/O.

pub mod traits;
pub mod xyz;

pub use traits::TrajectoryFile;
pub use xyz::{XyzError, XyzFile};

use crate::models::{Element, Molecule};
use nalgebra::Point3;

/// A single geometry frame read from (or written to) a trajectory file.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The free-form comment line associated with the frame.
    pub comment: String,
    /// The element of each atom, in file order.
    pub elements: Vec<Element>,
    /// The coordinates of each atom in Angstroms.
    pub coordinates: Vec<Point3<f64>>,
}

impl Frame {
    /// Whether the frame's atom ordering matches the molecule's, element by
    /// element.
    pub fn matches(&self, molecule: &Molecule) -> bool {
        self.elements.len() == molecule.n_atoms()
            && self
                .elements
                .iter()
                .zip(molecule.atoms())
                .all(|(element, atom)| *element == atom.element)
    }
}
