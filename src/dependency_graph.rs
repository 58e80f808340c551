use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{descriptor::Descriptor, errors::DFSErrorKind, token::Token};

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

struct Dfs<'a> {
    descriptors: &'a [Descriptor],
    positions: BTreeMap<&'a Token, usize>,
    states: Vec<Option<VisitState>>,
    stack: Vec<usize>,
    order: Vec<usize>,
}

impl Dfs<'_> {
    fn visit(&mut self, position: usize) -> Result<(), DFSErrorKind> {
        match self.states[position] {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::InProgress) => return Err(self.cycle(position)),
            None => {}
        }

        self.states[position] = Some(VisitState::InProgress);
        self.stack.push(position);

        let descriptors = self.descriptors;
        for dependency in &descriptors[position].dependencies {
            // Absent targets are validated by the registry, not here
            if let Some(&target) = self.positions.get(&dependency.token) {
                self.visit(target)?;
            }
        }

        self.stack.pop();
        self.states[position] = Some(VisitState::Done);
        self.order.push(position);
        Ok(())
    }

    fn cycle(&self, position: usize) -> DFSErrorKind {
        let start = self.stack.iter().position(|val| *val == position).unwrap_or(0);
        let path = self.stack[start..]
            .iter()
            .chain([&position])
            .map(|val| self.descriptors[*val].token.clone())
            .collect();

        DFSErrorKind::CyclicDependency { path }
    }
}

/// Orders descriptors so that every present dependency precedes its dependents.
///
/// Traversal follows input order, so descriptors without relative constraints keep their input order.
/// Descriptors are keyed by token: if a token repeats, the last descriptor for it wins.
///
/// # Errors
/// Returns [`DFSErrorKind::CyclicDependency`] with the cycle path, origin repeated at both ends.
/// The origin is the cycle member the traversal reached first, so it depends on input order.
pub fn resolve(descriptors: Vec<Descriptor>) -> Result<Vec<Descriptor>, DFSErrorKind> {
    let mut positions = BTreeMap::new();
    for (position, descriptor) in descriptors.iter().enumerate() {
        if positions.insert(&descriptor.token, position).is_some() {
            warn!(token = %descriptor.token, "Duplicate descriptor, the last one is used");
        }
    }

    let mut dfs = Dfs {
        descriptors: &descriptors,
        states: vec![None; descriptors.len()],
        stack: Vec::new(),
        order: Vec::with_capacity(positions.len()),
        positions,
    };
    for (position, descriptor) in descriptors.iter().enumerate() {
        if dfs.positions.get(&descriptor.token) != Some(&position) {
            continue;
        }
        if let Err(err) = dfs.visit(position) {
            warn!("{}", err);
            return Err(err);
        }
    }
    let order = dfs.order;

    let mut slots: Vec<Option<Descriptor>> = descriptors.into_iter().map(Some).collect();
    let sorted: Vec<Descriptor> = order.into_iter().filter_map(|position| slots[position].take()).collect();

    debug!(order = ?sorted.iter().map(|descriptor| descriptor.token.name()).collect::<Vec<_>>(), "Resolved");

    Ok(sorted)
}
