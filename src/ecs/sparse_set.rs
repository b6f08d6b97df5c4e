use std::any::Any;

const VACANT: u32 = u32::MAX;

/// Type-erased view of a column so `World` can drop an entity from every
/// column without knowing the component types.
pub(super) trait ErasedColumn {
    fn evict(&mut self, index: u32);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Packed per-component column keyed by entity index.
pub(super) struct SparseSet<T> {
    sparse: Vec<u32>,
    owners: Vec<u32>,
    values: Vec<T>,
}

impl<T: 'static> SparseSet<T> {
    pub(super) fn new() -> Self {
        Self {
            sparse: Vec::new(),
            owners: Vec::new(),
            values: Vec::new(),
        }
    }

    fn slot(&self, index: u32) -> Option<usize> {
        match self.sparse.get(index as usize) {
            Some(&dense) if dense != VACANT => Some(dense as usize),
            _ => None,
        }
    }

    pub(super) fn contains(&self, index: u32) -> bool {
        self.slot(index).is_some()
    }

    /// Inserts or overwrites; returns the previous value if there was one.
    pub(super) fn insert(&mut self, index: u32, value: T) -> Option<T> {
        if let Some(dense) = self.slot(index) {
            return Some(std::mem::replace(&mut self.values[dense], value));
        }
        let i = index as usize;
        if i >= self.sparse.len() {
            self.sparse.resize(i + 1, VACANT);
        }
        self.sparse[i] = self.owners.len() as u32;
        self.owners.push(index);
        self.values.push(value);
        None
    }

    pub(super) fn remove(&mut self, index: u32) -> Option<T> {
        let dense = self.slot(index)?;
        self.sparse[index as usize] = VACANT;

        // Swap-remove keeps the column packed; re-point the moved owner.
        let last = self.owners.len() - 1;
        if dense != last {
            let moved = self.owners[last] as usize;
            self.sparse[moved] = dense as u32;
        }
        self.owners.swap_remove(dense);
        Some(self.values.swap_remove(dense))
    }

    pub(super) fn get(&self, index: u32) -> Option<&T> {
        self.slot(index).map(|dense| &self.values[dense])
    }

    pub(super) fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let dense = self.slot(index)?;
        Some(&mut self.values[dense])
    }

    pub(super) fn iter(&self) -> impl ExactSizeIterator<Item = (u32, &T)> {
        self.owners.iter().copied().zip(self.values.iter())
    }
}

impl<T: 'static> ErasedColumn for SparseSet<T> {
    fn evict(&mut self, index: u32) {
        self.remove(index);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
