use tokio::sync::OnceCell;

use crate::any::Instance;

/// Singleton instances, one cell per registry position.
///
/// A cell is filled at most once. A failed construction leaves it empty, so a later lookup may retry.
pub(crate) struct Cache {
    cells: Box<[OnceCell<Instance>]>,
}

impl Cache {
    #[must_use]
    pub(crate) fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }

    #[inline]
    pub(crate) fn cell(&self, position: usize) -> &OnceCell<Instance> {
        &self.cells[position]
    }

    #[inline]
    pub(crate) fn get(&self, position: usize) -> Option<Instance> {
        self.cells[position].get().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.initialized()).count()
    }
}
