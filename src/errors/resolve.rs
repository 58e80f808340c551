use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::token::Token;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No component registered for `{token}`")]
    NoSuchBean { token: Token },
    #[error("Incorrect instance type for `{token}`, expected: {expected}")]
    IncorrectType { token: Token, expected: &'static str },
    #[error("Component `{token}` isn't registered as an interceptor")]
    NotInterceptor { token: Token },
    #[error("Component `{token}` is flagged as a post-processor in its metadata, but isn't registered as one")]
    NotPostProcessor { token: Token },
    #[error("Failed to instantiate `{token}`. {source}")]
    Instantiator {
        token: Token,
        source: InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>,
    },
}

impl ResolveErrorKind {
    /// Token whose resolution failed first, following nested dependency failures.
    #[must_use]
    pub fn root_token(&self) -> &Token {
        match self {
            ResolveErrorKind::Instantiator {
                source: InstantiatorErrorKind::Deps(err),
                ..
            } => err.root_token(),
            ResolveErrorKind::NoSuchBean { token }
            | ResolveErrorKind::IncorrectType { token, .. }
            | ResolveErrorKind::NotInterceptor { token }
            | ResolveErrorKind::NotPostProcessor { token }
            | ResolveErrorKind::Instantiator { token, .. } => token,
        }
    }
}
