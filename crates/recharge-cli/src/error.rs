use recharge::charges::bcc::BccLoadError;
use recharge::charges::ChargeAssignmentError;
use recharge::esp::psi4::Psi4Error;
use recharge::esp::EspSettingsError;
use recharge::grids::GridError;
use recharge::io::XyzError;
use recharge::smiles::SmilesError;
use recharge::storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid SMILES: {0}")]
    Smiles(#[from] SmilesError),

    #[error("Failed to read conformers: {0}")]
    Conformers(#[from] XyzError),

    #[error("Grid generation failed: {0}")]
    Grid(#[from] GridError),

    #[error("ESP settings error: {0}")]
    Settings(#[from] EspSettingsError),

    #[error("Psi4 calculation failed: {0}")]
    Psi4(#[from] Psi4Error),

    #[error("Charge assignment failed: {0}")]
    Charges(#[from] ChargeAssignmentError),

    #[error("Failed to load correction parameters: {0}")]
    Corrections(#[from] BccLoadError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
