//! # OpenFF Recharge Core Library
//!
//! An automated framework for generating optimized partial charges for
//! molecules, built around electrostatic potential (ESP) data computed with
//! external quantum chemistry packages.
//!
//! ## Architectural Philosophy
//!
//! The library is split into small, mostly stateless layers so that each
//! concern can be tested in isolation:
//!
//! - **[`models`]: The Foundation.** Chemical elements, atoms, bonds and the
//!   `Molecule` graph, with conformers kept as plain coordinate arrays.
//!
//! - **[`smiles`], [`conformers`], [`io`]: Getting structures in.** A
//!   kekulized-SMILES parser, conformer validation, and multi-frame XYZ I/O.
//!
//! - **[`grids`], [`esp`]: The QM Interface.** Generation of the FCC shell
//!   grids the ESP is evaluated on, and the [`esp::EspGenerator`] seam with
//!   its Psi4 implementation.
//!
//! - **[`charges`], [`storage`]: Charge Models and Persistence.** Bond charge
//!   correction (BCC) parameters and their application, plus an append-only
//!   record store for computed ESP data.

pub mod charges;
pub mod conformers;
pub mod esp;
pub mod grids;
pub mod io;
pub mod models;
pub mod smiles;
pub mod storage;
