//! Kekulized SMILES parsing.
//!
//! The parser covers the subset of SMILES the charge and ESP tooling needs:
//! organic-subset atoms, bracket atoms with explicit hydrogen counts and
//! formal charges, single/double/triple bonds, branches and ring-bond
//! closures. Aromatic (lowercase) input is rejected; callers are expected to
//! supply kekulized SMILES, where every bond has an integral order.
//!
//! Implicit hydrogens are resolved against each element's standard valences
//! and materialized as explicit atoms, so downstream code never needs to
//! reason about hydrogen counts.

mod parser;

pub use parser::parse_smiles;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("unknown element symbol '{symbol}' at position {position}")]
    UnknownElement { symbol: String, position: usize },

    #[error(
        "aromatic atom '{character}' at position {position}: aromatic SMILES are not \
         supported, provide a kekulized form"
    )]
    AromaticInput { character: char, position: usize },

    #[error("unclosed bracket atom starting at position {position}")]
    UnclosedBracket { position: usize },

    #[error("unmatched ')' at position {position}")]
    UnmatchedBranchClose { position: usize },

    #[error("{count} branch(es) left unclosed at end of input")]
    UnclosedBranch { count: usize },

    #[error("ring bond {label} was opened but never closed")]
    UnclosedRingBond { label: u16 },

    #[error("ring bond {label} was closed with conflicting bond orders")]
    ConflictingRingBond { label: u16 },

    #[error("ring bond {label} closes onto its own opening atom")]
    SelfRingBond { label: u16 },

    #[error("a bond symbol at position {position} is not followed by an atom")]
    DanglingBond { position: usize },

    #[error("empty SMILES string")]
    Empty,

    #[error(
        "bonded valence {bond_order_sum} exceeds the maximum standard valence of \
         {element} (atom {index})"
    )]
    ValenceExceeded {
        index: usize,
        element: crate::models::Element,
        bond_order_sum: u8,
    },
}
