//! # Schema Command Implementation
//!
//! Prints the JSON Schema of one of the machine-readable output shapes, so
//! consumers of `status --json` can validate what they read.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};

use git_fleet::schema::{self, SchemaKind};

/// Output shapes with an exported schema
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaTarget {
    /// Output of `status --json`
    WorkspaceSummary,
    /// One repository's status
    RepoStatus,
    ConflictPrediction,
    CommitConflict,
    DivergenceMatch,
    RetargetReplay,
}

impl From<SchemaTarget> for SchemaKind {
    fn from(target: SchemaTarget) -> Self {
        match target {
            SchemaTarget::WorkspaceSummary => SchemaKind::WorkspaceSummary,
            SchemaTarget::RepoStatus => SchemaKind::RepoStatus,
            SchemaTarget::ConflictPrediction => SchemaKind::ConflictPrediction,
            SchemaTarget::CommitConflict => SchemaKind::CommitConflict,
            SchemaTarget::DivergenceMatch => SchemaKind::DivergenceMatch,
            SchemaTarget::RetargetReplay => SchemaKind::RetargetReplay,
        }
    }
}

/// Print the JSON Schema of the machine-readable output
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Which shape to print
    #[arg(long, value_enum, default_value = "workspace-summary")]
    pub kind: SchemaTarget,
}

/// Execute the `schema` command.
pub fn execute(args: SchemaArgs) -> Result<ExitCode> {
    let value = schema::schema(args.kind.into())?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(ExitCode::SUCCESS)
}
