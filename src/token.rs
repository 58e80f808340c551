use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

use crate::any::TypeInfo;

/// Identity under which a component is registered and looked up.
///
/// A token is either the nominal identity of a Rust type or an explicit name.
/// Two tokens are equal iff they denote the same target: type tokens compare by
/// [`core::any::TypeId`], named tokens by their name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    Type(TypeInfo),
    Named(Cow<'static, str>),
}

impl Token {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// Human-readable name used in diagnostics.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Token::Type(type_info) => type_info.short_name(),
            Token::Named(name) => name,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&'static str> for Token {
    #[inline]
    fn from(name: &'static str) -> Self {
        Self::named(name)
    }
}

impl From<String> for Token {
    #[inline]
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Token;

    struct Database;

    #[test]
    fn test_type_token_identity() {
        assert_eq!(Token::of::<Database>(), Token::of::<Database>());
        assert_ne!(Token::of::<Database>(), Token::of::<u8>());
        assert_eq!(Token::of::<Database>().name(), "Database");
    }

    #[test]
    fn test_named_token_identity() {
        assert_eq!(Token::named("db.url"), Token::from("db.url"));
        assert_eq!(Token::named("db.url"), Token::from(String::from("db.url")));
        assert_ne!(Token::named("db.url"), Token::named("db.pool"));
        assert_eq!(Token::named("db.url").to_string(), "db.url");
    }

    #[test]
    fn test_named_and_type_tokens_differ() {
        assert_ne!(Token::named("Database"), Token::of::<Database>());
    }
}
