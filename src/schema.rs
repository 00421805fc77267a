//! # JSON Schema Export
//!
//! Machine-readable schemas for the serialized output shapes, generated from
//! the model types with `schemars` so they cannot drift from the code.
//!
//! Each schema is stamped with [`SCHEMA_VERSION`] and a stable `$id`. The
//! version is bumped whenever a serialized shape changes incompatibly.

use schemars::schema_for;
use serde_json::{json, Value};

use crate::error::Result;
use crate::model::{
    CommitConflict, ConflictPrediction, DivergenceMatch, RepoStatus, RetargetReplay,
    WorkspaceSummary,
};

/// Version of the serialized output shapes.
pub const SCHEMA_VERSION: &str = "1";

/// The output shapes a schema can be exported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    WorkspaceSummary,
    RepoStatus,
    ConflictPrediction,
    CommitConflict,
    DivergenceMatch,
    RetargetReplay,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 6] = [
        SchemaKind::WorkspaceSummary,
        SchemaKind::RepoStatus,
        SchemaKind::ConflictPrediction,
        SchemaKind::CommitConflict,
        SchemaKind::DivergenceMatch,
        SchemaKind::RetargetReplay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::WorkspaceSummary => "workspace-summary",
            SchemaKind::RepoStatus => "repo-status",
            SchemaKind::ConflictPrediction => "conflict-prediction",
            SchemaKind::CommitConflict => "commit-conflict",
            SchemaKind::DivergenceMatch => "divergence-match",
            SchemaKind::RetargetReplay => "retarget-replay",
        }
    }

    /// Stable identifier of the schema.
    pub fn id(self) -> String {
        format!("urn:git-fleet:{}:v{}", self.name(), SCHEMA_VERSION)
    }
}

/// Generate the schema of `kind` as JSON.
pub fn schema(kind: SchemaKind) -> Result<Value> {
    let root = match kind {
        SchemaKind::WorkspaceSummary => schema_for!(WorkspaceSummary),
        SchemaKind::RepoStatus => schema_for!(RepoStatus),
        SchemaKind::ConflictPrediction => schema_for!(ConflictPrediction),
        SchemaKind::CommitConflict => schema_for!(CommitConflict),
        SchemaKind::DivergenceMatch => schema_for!(DivergenceMatch),
        SchemaKind::RetargetReplay => schema_for!(RetargetReplay),
    };
    let mut value = serde_json::to_value(root)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("$id".to_string(), json!(kind.id()));
        obj.insert("x-schema-version".to_string(), json!(SCHEMA_VERSION));
    }
    Ok(value)
}

/// Schema of [`WorkspaceSummary`], the main output of `status --json`.
pub fn workspace_summary_schema() -> Result<Value> {
    schema(SchemaKind::WorkspaceSummary)
}
