use super::traits::TrajectoryFile;
use super::Frame;
use crate::models::Element;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: expected an atom count, found '{content}'")]
    InvalidAtomCount { line: usize, content: String },

    #[error("line {line}: unknown element symbol '{symbol}'")]
    UnknownElement { line: usize, symbol: String },

    #[error("line {line}: malformed atom line '{content}'")]
    MalformedAtomLine { line: usize, content: String },

    #[error("unexpected end of file inside a frame starting at line {line}")]
    UnexpectedEof { line: usize },
}

/// Reader and writer for (multi-frame) XYZ trajectory files.
///
/// Frames are the standard XYZ layout: an atom count line, a free-form
/// comment line, then one `symbol x y z` line per atom with coordinates in
/// Angstroms. Blank lines between frames are tolerated on read.
pub struct XyzFile;

impl TrajectoryFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Frame>, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

        let mut frames = Vec::new();
        let mut cursor = 0usize;

        while cursor < lines.len() {
            if lines[cursor].trim().is_empty() {
                cursor += 1;
                continue;
            }

            let frame_start = cursor + 1;
            let n_atoms: usize =
                lines[cursor]
                    .trim()
                    .parse()
                    .map_err(|_| XyzError::InvalidAtomCount {
                        line: cursor + 1,
                        content: lines[cursor].trim().to_string(),
                    })?;
            cursor += 1;

            let comment = lines
                .get(cursor)
                .ok_or(XyzError::UnexpectedEof { line: frame_start })?
                .trim_end()
                .to_string();
            cursor += 1;

            let mut elements = Vec::with_capacity(n_atoms);
            let mut coordinates = Vec::with_capacity(n_atoms);

            for _ in 0..n_atoms {
                let content = lines
                    .get(cursor)
                    .ok_or(XyzError::UnexpectedEof { line: frame_start })?;
                let line = cursor + 1;
                cursor += 1;

                let mut fields = content.split_whitespace();
                let symbol = fields.next().ok_or_else(|| XyzError::MalformedAtomLine {
                    line,
                    content: content.clone(),
                })?;

                let element =
                    Element::from_symbol(symbol).ok_or_else(|| XyzError::UnknownElement {
                        line,
                        symbol: symbol.to_string(),
                    })?;

                let mut coordinate = [0.0f64; 3];
                for value in &mut coordinate {
                    *value = fields
                        .next()
                        .and_then(|field| field.parse().ok())
                        .ok_or_else(|| XyzError::MalformedAtomLine {
                            line,
                            content: content.clone(),
                        })?;
                }

                elements.push(element);
                coordinates.push(Point3::new(coordinate[0], coordinate[1], coordinate[2]));
            }

            frames.push(Frame {
                comment,
                elements,
                coordinates,
            });
        }

        Ok(frames)
    }

    fn write_to(frames: &[Frame], writer: &mut impl Write) -> Result<(), Self::Error> {
        for frame in frames {
            writeln!(writer, "{}", frame.elements.len())?;
            writeln!(writer, "{}", frame.comment)?;
            for (element, point) in frame.elements.iter().zip(&frame.coordinates) {
                writeln!(
                    writer,
                    "{:<2} {:>14.9} {:>14.9} {:>14.9}",
                    element.symbol(),
                    point.x,
                    point.y,
                    point.z
                )?;
            }
        }
        Ok(())
    }
}
