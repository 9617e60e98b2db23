use thiserror::Error;

use crate::roles::Role;

/// Fatal analysis failures surfaced to the caller. Row-level problems are
/// collected as [`crate::record::Diagnostics`] instead and never abort a run.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("cannot map spreadsheet headers to required column roles (missing: {})", join_roles(.missing))]
    SchemaUnrecognized { missing: Vec<Role> },
    #[error("no usable rows remain after normalization")]
    NoUsableData,
    #[error("dataset exceeds the configured limit of {limit} row(s)")]
    DatasetTooLarge { limit: usize },
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::name)
        .collect::<Vec<_>>()
        .join(", ")
}
