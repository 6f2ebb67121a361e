use crate::cli::GridArgs;
use crate::error::{CliError, Result};
use recharge::grids::{GridGenerator, GridSettings};
use recharge::io::{TrajectoryFile, XyzFile};
use recharge::smiles::parse_smiles;
use tracing::{info, warn};

pub fn run(args: GridArgs) -> Result<()> {
    let molecule = parse_smiles(&args.smiles)?;

    let frames = XyzFile::read_from_path(&args.conformers)?;
    let frame = frames.first().ok_or_else(|| {
        CliError::Argument(format!(
            "no conformers found in '{}'",
            args.conformers.display()
        ))
    })?;
    if frames.len() > 1 {
        warn!(
            "'{}' holds {} frames; only the first is used.",
            args.conformers.display(),
            frames.len()
        );
    }

    if !frame.matches(&molecule) {
        return Err(CliError::Argument(format!(
            "the conformer does not match the atom ordering of '{}'",
            args.smiles
        )));
    }
    let settings = GridSettings {
        spacing: args.spacing,
        inner_vdw_scale: args.inner_scale,
        outer_vdw_scale: args.outer_scale,
    };

    let grid = GridGenerator::generate(&molecule, &frame.coordinates, &settings)?;
    if grid.is_empty() {
        warn!("The settings produced an empty grid; consider a finer spacing.");
    }

    let content: String = grid
        .iter()
        .map(|point| format!("{:.10} {:.10} {:.10}\n", point.x, point.y, point.z))
        .collect();
    std::fs::write(&args.output, content)?;

    info!(
        "Wrote {} grid points to '{}'.",
        grid.len(),
        args.output.display()
    );
    println!("{} grid points", grid.len());
    Ok(())
}
