use super::{dependency_graph::DFSErrorKind, resolve::ResolveErrorKind};
use crate::token::Token;

#[derive(thiserror::Error, Debug)]
pub enum CreateErrorKind {
    #[error(transparent)]
    Dfs(#[from] DFSErrorKind),
    #[error("`{dependent}` requires `{missing}`, but no component is registered for it")]
    MissingDependency { dependent: Token, missing: Token },
    #[error(transparent)]
    Instantiate(#[from] ResolveErrorKind),
}
