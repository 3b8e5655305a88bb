/// One atom of a molecule in Cartesian coordinates (Angstrom).
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A molecule as declared in the input manifest: a geometry plus the charge
/// and spin multiplicity the calculations run with. The identifier is the
/// stem of the geometry filename and doubles as the job identifier, so it
/// must be unique across the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub id: String,
    pub atoms: Vec<Atom>,
    pub charge: i32,
    pub multiplicity: u32,
}

impl Molecule {
    /// Coordinate lines in the `El x y z` layout shared by XYZ files and
    /// ORCA geometry blocks.
    pub fn coordinate_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.atoms.iter().map(|atom| {
            format!(
                "{:<3} {:>14.8} {:>14.8} {:>14.8}",
                atom.element, atom.x, atom.y, atom.z
            )
        })
    }

    /// Renders the molecule as a standard XYZ file, used to stage CREST
    /// inputs and to keep a geometry copy next to each generated script.
    pub fn to_xyz(&self) -> String {
        let mut out = format!(
            "{}\n{} charge={} multiplicity={}\n",
            self.atoms.len(),
            self.id,
            self.charge,
            self.multiplicity
        );
        for line in self.coordinate_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Number of unpaired electrons implied by the multiplicity; CREST takes
    /// this instead of the multiplicity itself.
    pub fn unpaired_electrons(&self) -> u32 {
        self.multiplicity.saturating_sub(1)
    }
}
