use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependency {
    pub token: Token,
    /// Absence of a matching descriptor is not an error when set.
    pub optional: bool,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn required(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
            optional: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn optional(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
            optional: true,
        }
    }
}

impl From<Token> for Dependency {
    #[inline]
    fn from(token: Token) -> Self {
        Self::required(token)
    }
}
