//! Core chemical data models.
//!
//! A [`Molecule`](molecule::Molecule) is a plain bond graph over
//! [`Atom`](atom::Atom)s; 3D coordinates are deliberately kept out of the
//! graph and passed around as separate conformer arrays, so that one topology
//! can carry any number of geometries.

pub mod atom;
pub mod element;
pub mod molecule;

pub use atom::Atom;
pub use element::Element;
pub use molecule::{Bond, BondOrder, Molecule};
