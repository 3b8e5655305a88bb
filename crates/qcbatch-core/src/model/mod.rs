pub mod job;
pub mod molecule;

pub use job::{Job, SubmissionOutcome};
pub use molecule::{Atom, Molecule};
