use crate::{interceptor::AdviceKind, token::Token};

#[derive(thiserror::Error, Debug)]
pub enum InterceptErrorKind {
    #[error("{kind:?} advice `{interceptor}` failed on `{method}`: {source}")]
    Advice {
        method: String,
        interceptor: Token,
        kind: AdviceKind,
        source: anyhow::Error,
    },
    #[error("Method `{method}` failed: {source}")]
    Target { method: String, source: anyhow::Error },
}

impl InterceptErrorKind {
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            InterceptErrorKind::Advice { method, .. } | InterceptErrorKind::Target { method, .. } => method,
        }
    }
}
