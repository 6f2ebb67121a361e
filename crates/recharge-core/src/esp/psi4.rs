//! The Psi4 backend for ESP generation.
//!
//! The backend drives the `psi4` executable through its text interface: an
//! `input.dat` describing the molecule and the requested properties, a
//! `grid.dat` listing the points the ESP and field are evaluated at, and the
//! `grid_esp.dat` / `grid_field.dat` files Psi4 writes back.

use super::{EspGenerator, EspOptions, EspSettings};
use crate::grids::GridError;
use crate::io::{TrajectoryFile, XyzFile};
use crate::models::Molecule;
use nalgebra::{Point3, Vector3};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const FINAL_GEOMETRY_FILE: &str = "final-geometry.xyz";

#[derive(Debug, Error)]
pub enum Psi4Error {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to launch psi4, is it installed and on PATH? ({0})")]
    Launch(io::Error),

    #[error("psi4 exited with an error\nStdOut:\n{stdout}\nStdErr:\n{stderr}")]
    Execution { stdout: String, stderr: String },

    #[error("psi4 did not produce '{path}'", path = path.display())]
    MissingOutput { path: PathBuf },

    #[error("malformed value on line {line} of '{path}'", path = path.display())]
    MalformedOutput { path: PathBuf, line: usize },

    #[error("failed to read the minimized geometry: {0}")]
    FinalGeometry(#[from] crate::io::XyzError),
}

/// An [`EspGenerator`] which computes the ESP using Psi4.
pub struct Psi4EspGenerator;

impl Psi4EspGenerator {
    /// Renders the Psi4 input file for a molecule in a given conformer.
    ///
    /// Exposed for testing; [`EspGenerator::generate`] is the entry point.
    pub fn generate_input(
        molecule: &Molecule,
        conformer: &[Point3<f64>],
        settings: &EspSettings,
        options: &EspOptions,
    ) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push("molecule mol {".to_string());
        lines.push("  noreorient".to_string());
        lines.push("  nocom".to_string());
        lines.push(format!(
            "  {} {}",
            molecule.net_charge(),
            molecule.multiplicity()
        ));
        for (atom, point) in molecule.atoms().iter().zip(conformer) {
            lines.push(format!(
                "  {}  {:.9}  {:.9}  {:.9}",
                atom.element.symbol(),
                point.x,
                point.y,
                point.z
            ));
        }
        lines.push("}".to_string());
        lines.push(String::new());

        lines.push(format!("set basis {}", settings.basis));

        if let (Some(spherical), Some(radial), Some(pruning)) = (
            settings.dft_grid_settings.spherical_points(),
            settings.dft_grid_settings.radial_points(),
            settings.dft_grid_settings.pruning_scheme(),
        ) {
            lines.push(format!("set dft_spherical_points {spherical}"));
            lines.push(format!("set dft_radial_points {radial}"));
            lines.push(format!("set dft_pruning_scheme {pruning}"));
        }

        if let Some(pcm) = &settings.pcm_settings {
            lines.push("set pcm true".to_string());
            lines.push("set pcm_scf_type total".to_string());
            lines.push(String::new());
            lines.push("pcm = {".to_string());
            lines.push("  Units = Angstrom".to_string());
            lines.push("  Medium {".to_string());
            lines.push(format!("  SolverType = {}", pcm.solver.keyword()));
            lines.push(format!("  Solvent = {}", pcm.solvent.keyword()));
            lines.push("  }".to_string());
            lines.push("  Cavity {".to_string());
            lines.push(format!("  RadiiSet = {}", pcm.radii_model.keyword()));
            lines.push("  Type = GePol".to_string());
            lines.push(format!(
                "  Scaling = {}",
                if pcm.radii_scaling { "True" } else { "False" }
            ));
            lines.push(format!("  Area = {}", pcm.cavity_area));
            lines.push("  Mode = Implicit".to_string());
            lines.push("  }".to_string());
            lines.push("}".to_string());
        }

        // Restricted HF cannot describe an open-shell system.
        let method = if molecule.multiplicity() != 1 && settings.method == "hf" {
            "uhf".to_string()
        } else {
            settings.method.clone()
        };

        if options.minimize {
            lines.push(format!("optimize('{method}')"));
        }

        let mut properties = Vec::new();
        if options.compute_esp {
            properties.push("'GRID_ESP'");
        }
        if options.compute_field {
            properties.push("'GRID_FIELD'");
        }

        if !properties.is_empty() {
            lines.push(format!(
                "E,wfn = prop('{}', properties = [{}], return_wfn=True)",
                method,
                properties.join(", ")
            ));
        }

        if options.minimize {
            lines.push(format!("mol.save_xyz_file('{FINAL_GEOMETRY_FILE}', 1)"));
        }

        lines.join("\n")
    }

    fn write_grid_file(grid: &[Point3<f64>], path: &Path) -> Result<(), Psi4Error> {
        let content: String = grid
            .iter()
            .map(|point| format!("{:.10} {:.10} {:.10}\n", point.x, point.y, point.z))
            .collect();
        std::fs::write(path, content)?;
        Ok(())
    }

    fn read_esp_file(path: &Path) -> Result<Vec<f64>, Psi4Error> {
        if !path.exists() {
            return Err(Psi4Error::MissingOutput {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let mut values = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: f64 = trimmed.parse().map_err(|_| Psi4Error::MalformedOutput {
                path: path.to_path_buf(),
                line: index + 1,
            })?;
            values.push(value);
        }
        Ok(values)
    }

    fn read_field_file(path: &Path) -> Result<Vec<Vector3<f64>>, Psi4Error> {
        if !path.exists() {
            return Err(Psi4Error::MissingOutput {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let mut values = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut components = [0.0f64; 3];
            let mut fields = trimmed.split_whitespace();
            for component in &mut components {
                *component = fields
                    .next()
                    .and_then(|field| field.parse().ok())
                    .ok_or_else(|| Psi4Error::MalformedOutput {
                        path: path.to_path_buf(),
                        line: index + 1,
                    })?;
            }
            values.push(Vector3::new(components[0], components[1], components[2]));
        }
        Ok(values)
    }

    fn read_final_geometry(directory: &Path) -> Result<Vec<Point3<f64>>, Psi4Error> {
        let path = directory.join(FINAL_GEOMETRY_FILE);
        if !path.exists() {
            return Err(Psi4Error::MissingOutput { path });
        }
        let frames = XyzFile::read_from_path(&path)?;
        frames
            .into_iter()
            .last()
            .map(|frame| frame.coordinates)
            .ok_or(Psi4Error::MissingOutput { path })
    }
}

impl EspGenerator for Psi4EspGenerator {
    type Error = Psi4Error;

    fn generate_in_directory(
        molecule: &Molecule,
        conformer: &[Point3<f64>],
        grid: &[Point3<f64>],
        settings: &EspSettings,
        options: &EspOptions,
        directory: &Path,
    ) -> Result<(Vec<Point3<f64>>, Option<Vec<f64>>, Option<Vec<Vector3<f64>>>), Self::Error>
    {
        let input = Self::generate_input(molecule, conformer, settings, options);
        std::fs::write(directory.join("input.dat"), input)?;
        Self::write_grid_file(grid, &directory.join("grid.dat"))?;

        let output = Command::new("psi4")
            .arg("input.dat")
            .arg("output.dat")
            .arg("-n")
            .arg(options.n_threads.max(1).to_string())
            .current_dir(directory)
            .output()
            .map_err(Psi4Error::Launch)?;

        if !output.status.success() {
            return Err(Psi4Error::Execution {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let esp = options
            .compute_esp
            .then(|| Self::read_esp_file(&directory.join("grid_esp.dat")))
            .transpose()?;
        let field = options
            .compute_field
            .then(|| Self::read_field_file(&directory.join("grid_field.dat")))
            .transpose()?;

        let final_conformer = if options.minimize {
            Self::read_final_geometry(directory)?
        } else {
            conformer.to_vec()
        };

        Ok((final_conformer, esp, field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp::{DftGridSettings, PcmSettings};
    use crate::smiles::parse_smiles;

    #[test]
    fn input_for_a_closed_shell_molecule_matches_the_reference() {
        let settings = EspSettings::default();
        let options = EspOptions::default();

        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let input =
            Psi4EspGenerator::generate_input(&molecule, &conformer, &settings, &options);

        let expected = [
            "molecule mol {",
            "  noreorient",
            "  nocom",
            "  -1 1",
            "  Cl  0.000000000  0.000000000  0.000000000",
            "}",
            "",
            "set basis 6-31g*",
            "E,wfn = prop('hf', properties = ['GRID_ESP', 'GRID_FIELD'], return_wfn=True)",
        ]
        .join("\n");

        assert_eq!(input, expected);
    }

    #[test]
    fn input_for_an_open_shell_molecule_uses_uhf() {
        let settings = EspSettings::default();
        let options = EspOptions::default();

        let molecule = parse_smiles("[B]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let input =
            Psi4EspGenerator::generate_input(&molecule, &conformer, &settings, &options);

        let expected = [
            "molecule mol {",
            "  noreorient",
            "  nocom",
            "  0 2",
            "  B  0.000000000  0.000000000  0.000000000",
            "}",
            "",
            "set basis 6-31g*",
            "E,wfn = prop('uhf', properties = ['GRID_ESP', 'GRID_FIELD'], return_wfn=True)",
        ]
        .join("\n");

        assert_eq!(input, expected);
    }

    #[test]
    fn dft_grid_presets_add_the_grid_keywords() {
        let settings = EspSettings {
            dft_grid_settings: DftGridSettings::Medium,
            ..EspSettings::default()
        };

        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let input = Psi4EspGenerator::generate_input(
            &molecule,
            &conformer,
            &settings,
            &EspOptions::default(),
        );

        assert!(input.contains("set dft_spherical_points 434"));
        assert!(input.contains("set dft_radial_points 85"));
        assert!(input.contains("set dft_pruning_scheme robust"));
    }

    #[test]
    fn pcm_settings_add_the_pcm_block() {
        let settings = EspSettings {
            pcm_settings: Some(PcmSettings::default()),
            ..EspSettings::default()
        };

        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let input = Psi4EspGenerator::generate_input(
            &molecule,
            &conformer,
            &settings,
            &EspOptions::default(),
        );

        assert!(input.contains("set pcm true"));
        assert!(input.contains("SolverType = CPCM"));
        assert!(input.contains("Solvent = Water"));
        assert!(input.contains("RadiiSet = Bondi"));
        assert!(input.contains("Scaling = True"));
        assert!(input.contains("Area = 0.3"));
    }

    #[test]
    fn minimize_adds_optimize_and_geometry_export() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let options = EspOptions {
            minimize: true,
            ..EspOptions::default()
        };

        let input = Psi4EspGenerator::generate_input(
            &molecule,
            &conformer,
            &EspSettings::default(),
            &options,
        );

        assert!(input.contains("optimize('hf')"));
        assert!(input.contains("mol.save_xyz_file('final-geometry.xyz', 1)"));
        let optimize_index = input.find("optimize").unwrap();
        let prop_index = input.find("prop(").unwrap();
        assert!(optimize_index < prop_index);
    }

    #[test]
    fn disabling_the_field_restricts_the_property_list() {
        let molecule = parse_smiles("[Cl-]").unwrap();
        let conformer = vec![Point3::new(0.0, 0.0, 0.0)];

        let options = EspOptions {
            compute_field: false,
            ..EspOptions::default()
        };

        let input = Psi4EspGenerator::generate_input(
            &molecule,
            &conformer,
            &EspSettings::default(),
            &options,
        );

        assert!(input.contains("properties = ['GRID_ESP']"));
        assert!(!input.contains("GRID_FIELD"));
    }

    #[test]
    fn grid_files_are_written_one_point_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.dat");

        let grid = vec![
            Point3::new(0.0, 1.0, -2.0),
            Point3::new(0.5, -0.5, 0.25),
        ];
        Psi4EspGenerator::write_grid_file(&grid, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0.0000000000 1.0000000000 -2.0000000000");
    }

    #[test]
    fn esp_output_files_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid_esp.dat");
        std::fs::write(&path, "0.01\n-0.02\n0.003\n").unwrap();

        let esp = Psi4EspGenerator::read_esp_file(&path).unwrap();
        assert_eq!(esp, vec![0.01, -0.02, 0.003]);
    }

    #[test]
    fn field_output_files_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid_field.dat");
        std::fs::write(&path, "0.1 0.2 0.3\n-0.1 -0.2 -0.3\n").unwrap();

        let field = Psi4EspGenerator::read_field_file(&path).unwrap();
        assert_eq!(field.len(), 2);
        assert_eq!(field[0], Vector3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn missing_and_malformed_outputs_are_reported() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Psi4EspGenerator::read_esp_file(&dir.path().join("grid_esp.dat")),
            Err(Psi4Error::MissingOutput { .. })
        ));

        let path = dir.path().join("grid_esp.dat");
        std::fs::write(&path, "0.01\nnot-a-number\n").unwrap();
        assert!(matches!(
            Psi4EspGenerator::read_esp_file(&path),
            Err(Psi4Error::MalformedOutput { line: 2, .. })
        ));
    }

    #[test]
    fn minimized_geometries_read_back_the_last_frame() {
        let dir = tempfile::tempdir().unwrap();
        let content = "1\ninput geometry\n\
                       O  0.000000000  0.000000000  0.000000000\n\
                       1\nminimized geometry\n\
                       O  0.100000000  -0.200000000  0.300000000\n";
        std::fs::write(dir.path().join(FINAL_GEOMETRY_FILE), content).unwrap();

        let conformer = Psi4EspGenerator::read_final_geometry(dir.path()).unwrap();
        assert_eq!(conformer, vec![Point3::new(0.1, -0.2, 0.3)]);
    }

    #[test]
    fn a_missing_minimized_geometry_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            Psi4EspGenerator::read_final_geometry(dir.path()),
            Err(Psi4Error::MissingOutput { .. })
        ));
    }

    #[test]
    fn execution_errors_render_both_output_streams() {
        let error = Psi4Error::Execution {
            stdout: "psi4 banner".to_string(),
            stderr: "Fatal: SCF did not converge".to_string(),
        };
        let message = error.to_string();

        assert!(message.contains("StdOut"));
        assert!(message.contains("StdErr"));
        assert!(message.contains("SCF did not converge"));
    }
}
