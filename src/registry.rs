use std::{collections::BTreeMap, ops::Index};

use tracing::error;

use crate::{dependency_graph, descriptor::Descriptor, errors::CreateErrorKind, token::Token};

/// Descriptors of one container, in resolution order and indexed by token.
pub(crate) struct Registry {
    entries: Box<[Descriptor]>,
    positions: BTreeMap<Token, usize>,
}

impl Registry {
    /// Orders the descriptors, then checks that every required dependency is registered.
    /// Ordering goes first, so a cycle is reported even when a required dependency is missing too.
    pub(crate) fn new(descriptors: Vec<Descriptor>) -> Result<Self, CreateErrorKind> {
        let entries: Box<[Descriptor]> = dependency_graph::resolve(descriptors)?.into();
        let positions = entries
            .iter()
            .enumerate()
            .map(|(position, descriptor)| (descriptor.token.clone(), position))
            .collect();

        let registry = Self { entries, positions };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), CreateErrorKind> {
        for descriptor in self.entries.iter() {
            for dependency in descriptor.dependencies.iter().filter(|dependency| !dependency.optional) {
                if !self.positions.contains_key(&dependency.token) {
                    let err = CreateErrorKind::MissingDependency {
                        dependent: descriptor.token.clone(),
                        missing: dependency.token.clone(),
                    };
                    error!("{}", err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn position(&self, token: &Token) -> Option<usize> {
        self.positions.get(token).copied()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.iter()
    }
}

impl Index<usize> for Registry {
    type Output = Descriptor;

    #[inline]
    fn index(&self, position: usize) -> &Self::Output {
        &self.entries[position]
    }
}
