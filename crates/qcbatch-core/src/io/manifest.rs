use crate::io::xyz::{self, XyzError};
use crate::model::Molecule;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Manifest '{path}' contains no molecules", path = path.display())]
    Empty { path: PathBuf },

    #[error("Duplicate molecule id '{0}' in manifest")]
    Duplicate(String),

    #[error("Multiplicity must be at least 1 for molecule '{0}'")]
    InvalidMultiplicity(String),

    #[error("Geometry file for '{id}' not found: '{path}'", path = path.display())]
    MissingGeometry { id: String, path: PathBuf },

    #[error(transparent)]
    Geometry(#[from] XyzError),
}

/// One manifest row. The expected header is `filename,charge,multiplicity`.
#[derive(Debug, Deserialize)]
struct ManifestRecord {
    filename: String,
    charge: i32,
    multiplicity: u32,
}

/// A manifest entry with its geometry path resolved against the manifest's
/// own directory. The molecule id is the geometry filename stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    pub geometry_path: PathBuf,
    pub charge: i32,
    pub multiplicity: u32,
}

pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for record in reader.deserialize::<ManifestRecord>() {
        let record = record.map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let geometry_path = if Path::new(&record.filename).is_absolute() {
            PathBuf::from(&record.filename)
        } else {
            base_dir.join(&record.filename)
        };
        let id = geometry_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.filename.clone());

        if !seen.insert(id.clone()) {
            return Err(ManifestError::Duplicate(id));
        }
        if record.multiplicity == 0 {
            return Err(ManifestError::InvalidMultiplicity(id));
        }
        if !geometry_path.is_file() {
            return Err(ManifestError::MissingGeometry {
                id,
                path: geometry_path,
            });
        }

        entries.push(ManifestEntry {
            id,
            geometry_path,
            charge: record.charge,
            multiplicity: record.multiplicity,
        });
    }

    if entries.is_empty() {
        return Err(ManifestError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!("Read {} manifest entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Reads every geometry named by the manifest and pairs it with its charge
/// and multiplicity.
pub fn load_molecules(entries: &[ManifestEntry]) -> Result<Vec<Molecule>, ManifestError> {
    entries
        .iter()
        .map(|entry| {
            let atoms = xyz::read_xyz(&entry.geometry_path)?;
            Ok(Molecule {
                id: entry.id.clone(),
                atoms,
                charge: entry.charge,
                multiplicity: entry.multiplicity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn setup_manifest(rows: &str, geometries: &[&str]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        for name in geometries {
            fs::write(
                dir.path().join(name),
                "1\ncomment\nH 0.0 0.0 0.0\n",
            )
            .unwrap();
        }
        let manifest = dir.path().join("molecules.csv");
        fs::write(&manifest, format!("filename,charge,multiplicity\n{rows}")).unwrap();
        (dir, manifest)
    }

    #[test]
    fn reads_entries_and_resolves_relative_paths() {
        let (dir, manifest) = setup_manifest(
            "water.xyz,0,1\ncation.xyz,1,2\n",
            &["water.xyz", "cation.xyz"],
        );

        let entries = read_manifest(&manifest).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "water");
        assert_eq!(entries[0].geometry_path, dir.path().join("water.xyz"));
        assert_eq!(entries[1].charge, 1);
        assert_eq!(entries[1].multiplicity, 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (_dir, manifest) =
            setup_manifest("water.xyz,0,1\nwater.xyz,0,3\n", &["water.xyz"]);

        assert!(matches!(
            read_manifest(&manifest),
            Err(ManifestError::Duplicate(id)) if id == "water"
        ));
    }

    #[test]
    fn missing_geometry_is_rejected() {
        let (_dir, manifest) = setup_manifest("ghost.xyz,0,1\n", &[]);

        assert!(matches!(
            read_manifest(&manifest),
            Err(ManifestError::MissingGeometry { id, .. }) if id == "ghost"
        ));
    }

    #[test]
    fn zero_multiplicity_is_rejected() {
        let (_dir, manifest) = setup_manifest("water.xyz,0,0\n", &["water.xyz"]);

        assert!(matches!(
            read_manifest(&manifest),
            Err(ManifestError::InvalidMultiplicity(id)) if id == "water"
        ));
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let (_dir, manifest) = setup_manifest("", &[]);

        assert!(matches!(
            read_manifest(&manifest),
            Err(ManifestError::Empty { .. })
        ));
    }

    #[test]
    fn load_molecules_reads_geometries() {
        let (_dir, manifest) = setup_manifest("water.xyz,0,1\n", &["water.xyz"]);
        let entries = read_manifest(&manifest).unwrap();

        let molecules = load_molecules(&entries).unwrap();
        assert_eq!(molecules.len(), 1);
        assert_eq!(molecules[0].atoms.len(), 1);
        assert_eq!(molecules[0].atoms[0].element, "H");
    }
}
