//! # QCBatch Core Library
//!
//! A library for driving quantum-chemistry batch campaigns on SLURM clusters:
//! it renders ORCA input files and CREST conformer-search command lines from a
//! single TOML configuration, wraps them in SLURM batch scripts, and submits
//! them sequentially through the cluster's `sbatch` command.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers so that every piece is testable
//! without a cluster at hand.
//!
//! - **Foundation.** Stateless data: the typed run configuration ([`config`]),
//!   the per-molecule [`model`] (geometry, charge, multiplicity, job paths),
//!   and file readers for XYZ geometries and CSV manifests ([`io`]).
//!
//! - **Components.** The generators and the scheduler boundary: [`orca`] and
//!   [`crest`] turn a configured step plus a set of molecules into script
//!   artifacts on disk; [`slurm`] renders `#SBATCH` headers from the filtered
//!   scheduler configuration and performs the blocking submission call;
//!   [`workspace`] owns the working-directory tree and all file moves.
//!
//! - **[`workflows`]: The Public API.** Ties the components together into the
//!   single-pass pipeline: scaffold the tree, read the molecules, render every
//!   script, submit one job at a time, and report per-job outcomes. There is
//!   no job-status polling and no retry; a failed submission is recorded and
//!   the remaining jobs are still attempted.

pub mod config;
pub mod crest;
pub mod error;
pub mod io;
pub mod model;
pub mod orca;
pub mod progress;
pub mod slurm;
pub mod workflows;
pub mod workspace;
