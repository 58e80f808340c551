use std::fmt::{self, Display, Formatter};

use crate::token::Token;

#[derive(thiserror::Error, Debug)]
pub enum DFSErrorKind {
    /// `path` starts and ends with the same token.
    CyclicDependency { path: Box<[Token]> },
}

impl DFSErrorKind {
    #[must_use]
    pub fn path(&self) -> &[Token] {
        match self {
            DFSErrorKind::CyclicDependency { path } => path,
        }
    }

    /// Token names along the cycle, origin repeated at both ends.
    #[must_use]
    pub fn path_names(&self) -> Vec<String> {
        self.path().iter().map(ToString::to_string).collect()
    }
}

impl Display for DFSErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DFSErrorKind::CyclicDependency { path } => {
                write!(f, "Cyclic dependency detected: ")?;
                for (index, token) in path.iter().enumerate() {
                    if index > 0 {
                        write!(f, " -> ")?;
                    }
                    write!(f, "{token}")?;
                }
            }
        }
        Ok(())
    }
}
