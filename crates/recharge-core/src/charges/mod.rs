//! Partial charge models.
//!
//! The only model currently implemented is the bond charge correction (BCC)
//! scheme in [`bcc`]: per-bond charge transfers applied on top of a set of
//! base charges, leaving the total molecular charge untouched.

pub mod bcc;

pub use bcc::{default_corrections, BccCollection, BccGenerator, BccParameter};

use crate::models::Element;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ChargeAssignmentError {
    #[error("element {element} (atom {index}) is not covered by the correction set")]
    UnsupportedElement { element: Element, index: usize },

    #[error("no bond charge correction parameter matches code {code}")]
    MissingParameter { code: String },

    #[error("{actual} base charges were provided for a molecule with {expected} atoms")]
    ChargeCountMismatch { expected: usize, actual: usize },
}
