use crate::cli::GenerateArgs;
use crate::error::{CliError, Result};
use anyhow::anyhow;
use indicatif::{ProgressBar, ProgressStyle};
use recharge::esp::psi4::Psi4EspGenerator;
use recharge::esp::{EspGenerator, EspOptions, EspSettings};
use recharge::io::{TrajectoryFile, XyzFile};
use recharge::smiles::parse_smiles;
use recharge::storage::{EspRecord, MoleculeEspStore};
use tracing::{debug, info};

pub fn run(args: GenerateArgs) -> Result<()> {
    let molecule = parse_smiles(&args.smiles)?;

    let mut settings = match &args.settings {
        Some(path) => EspSettings::from_toml_path(path)?,
        None => EspSettings::default(),
    };
    if let Some(spacing) = args.spacing {
        settings.grid_settings.spacing = spacing;
    }

    let frames = XyzFile::read_from_path(&args.conformers)?;
    if frames.is_empty() {
        return Err(CliError::Argument(format!(
            "no conformers found in '{}'",
            args.conformers.display()
        )));
    }

    let options = EspOptions {
        minimize: args.minimize,
        compute_esp: true,
        compute_field: !args.no_field,
        n_threads: args.threads,
    };
    let store = MoleculeEspStore::new(&args.store);

    info!(
        "Computing the ESP of '{}' for {} conformer(s).",
        args.smiles,
        frames.len()
    );
    debug!(?settings, ?options, "Resolved calculation parameters.");

    let progress = ProgressBar::new(frames.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{bar:40}] {pos}/{len} conformers {msg}")
            .map_err(|e| CliError::Other(anyhow!("invalid progress template: {e}")))?
            .progress_chars("=>-"),
    );

    for (index, frame) in frames.iter().enumerate() {
        if !frame.matches(&molecule) {
            return Err(CliError::Argument(format!(
                "conformer {} does not match the atom ordering of '{}'",
                index + 1,
                args.smiles
            )));
        }

        let directory = args
            .directory
            .as_ref()
            .map(|root| root.join(format!("conformer-{index}")));

        debug!("Running Psi4 for conformer {}.", index + 1);
        let result = Psi4EspGenerator::generate(
            &molecule,
            &frame.coordinates,
            &settings,
            &options,
            directory.as_deref(),
        )?;

        store.store(&EspRecord::from_result(&args.smiles, &result, &settings))?;
        progress.inc(1);
    }

    progress.finish_with_message("done");
    info!(
        "Stored {} record(s) in '{}'.",
        frames.len(),
        args.store.display()
    );
    Ok(())
}
