use crate::model::Atom;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error reading '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in '{path}' on line {line}: {kind}", path = path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        kind: XyzParseErrorKind,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum XyzParseErrorKind {
    #[error("file is empty")]
    Empty,

    #[error("invalid atom count '{0}'")]
    InvalidAtomCount(String),

    #[error("expected {expected} atoms but found {found}")]
    AtomCountMismatch { expected: usize, found: usize },

    #[error("invalid coordinate record '{0}'")]
    InvalidCoordinate(String),
}

/// Reads a standard XYZ file: an atom count, a comment line, then one
/// `element x y z` record per atom. Trailing blank lines are tolerated;
/// anything else that disagrees with the declared count is an error.
pub fn read_xyz(path: &Path) -> Result<Vec<Atom>, XyzError> {
    let file = File::open(path).map_err(|source| XyzError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| XyzError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        lines.push(line);
    }

    parse_xyz(&lines).map_err(|(line, kind)| XyzError::Parse {
        path: path.to_path_buf(),
        line,
        kind,
    })
}

fn parse_xyz(lines: &[String]) -> Result<Vec<Atom>, (usize, XyzParseErrorKind)> {
    let count_line = lines
        .first()
        .ok_or((1, XyzParseErrorKind::Empty))?
        .trim();
    let expected: usize = count_line
        .parse()
        .map_err(|_| (1, XyzParseErrorKind::InvalidAtomCount(count_line.to_string())))?;

    let mut atoms = Vec::with_capacity(expected);
    // Line 2 is the comment line; coordinates start on line 3.
    for (idx, raw) in lines.iter().enumerate().skip(2) {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if atoms.len() == expected {
            return Err((
                line_no,
                XyzParseErrorKind::AtomCountMismatch {
                    expected,
                    found: expected + 1,
                },
            ));
        }
        atoms.push(parse_atom(trimmed).ok_or((
            line_no,
            XyzParseErrorKind::InvalidCoordinate(trimmed.to_string()),
        ))?);
    }

    if atoms.len() != expected {
        return Err((
            lines.len(),
            XyzParseErrorKind::AtomCountMismatch {
                expected,
                found: atoms.len(),
            },
        ));
    }

    Ok(atoms)
}

fn parse_atom(record: &str) -> Option<Atom> {
    let mut fields = record.split_whitespace();
    let element = fields.next()?.to_string();
    let x: f64 = fields.next()?.parse().ok()?;
    let y: f64 = fields.next()?.parse().ok()?;
    let z: f64 = fields.next()?.parse().ok()?;
    Some(Atom { element, x, y, z })
}
