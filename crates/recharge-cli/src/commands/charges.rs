use crate::cli::ChargesArgs;
use crate::error::{CliError, Result};
use recharge::charges::{default_corrections, BccCollection, BccGenerator};
use recharge::smiles::parse_smiles;
use tracing::{debug, info};

pub fn run(args: ChargesArgs) -> Result<()> {
    let molecule = parse_smiles(&args.smiles)?;

    let collection = match &args.corrections {
        Some(path) => BccCollection::from_csv_path(path)?,
        None => default_corrections(),
    };

    let base_charges = match &args.base_charges {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Vec<f64>>(&content).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: anyhow::Error::new(e),
            })?
        }
        None => vec![0.0; molecule.n_atoms()],
    };

    let applied = BccGenerator::applied_corrections(&molecule, &collection)?;
    debug!(
        "Corrections exercised: {:?}",
        applied.iter().map(|p| p.code()).collect::<Vec<_>>()
    );

    let charges = BccGenerator::generate(&molecule, &base_charges, &collection)?;

    match &args.output {
        Some(path) => {
            let content = serde_json::to_string_pretty(&charges)
                .map_err(|e| CliError::Other(anyhow::Error::new(e)))?;
            std::fs::write(path, content)?;
            info!("Wrote {} charges to '{}'.", charges.len(), path.display());
        }
        None => {
            for (index, (atom, charge)) in
                molecule.atoms().iter().zip(&charges).enumerate()
            {
                println!("{:>4}  {:<2}  {:>10.6}", index, atom.element.symbol(), charge);
            }
        }
    }

    Ok(())
}
