//! Recycle-or-allocate arena for short-lived bullets and drop items
//!
//! Slots are checked out and back in by index. A released slot keeps its old
//! contents until the next `acquire` overwrites them, and it is never listed
//! as active while it sits on the free list.

/// Index of a checked-out slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<T>,
    /// Position of each checked-out slot in `active`
    position: Vec<Option<usize>>,
    free: Vec<usize>,
    /// Checked-out handles. Releasing swaps the last entry into the gap.
    active: Vec<Handle>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            position: Vec::new(),
            free: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Check out a slot holding `value`, reusing the most recently freed slot
    pub fn acquire(&mut self, value: T) -> Handle {
        let slot = self.active.len();
        let handle = match self.free.pop() {
            Some(index) => {
                self.slots[index] = value;
                self.position[index] = Some(slot);
                Handle(index)
            }
            None => {
                self.slots.push(value);
                self.position.push(Some(slot));
                Handle(self.slots.len() - 1)
            }
        };
        self.active.push(handle);
        handle
    }

    /// Check a slot back in. Returns false if it was not checked out.
    pub fn release(&mut self, handle: Handle) -> bool {
        let Some(slot) = self.position.get_mut(handle.0).and_then(Option::take) else {
            return false;
        };
        self.free.push(handle.0);
        self.active.swap_remove(slot);
        if let Some(moved) = self.active.get(slot) {
            self.position[moved.0] = Some(slot);
        }
        true
    }

    /// Check a set of slots back in; returns how many were released
    pub fn release_all(&mut self, handles: impl IntoIterator<Item = Handle>) -> usize {
        handles.into_iter().filter(|&h| self.release(h)).count()
    }

    /// Release every active slot matching `pred`
    pub fn release_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<Handle> = self
            .active
            .iter()
            .copied()
            .filter(|h| pred(&self.slots[h.0]))
            .collect();
        self.release_all(doomed)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if self.is_active(handle) {
            self.slots.get(handle.0)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if self.is_active(handle) {
            self.slots.get_mut(handle.0)
        } else {
            None
        }
    }

    pub fn is_active(&self, handle: Handle) -> bool {
        self.position.get(handle.0).is_some_and(Option::is_some)
    }

    /// Snapshot of the active handles, safe to hold while mutating the pool
    pub fn handles(&self) -> Vec<Handle> {
        self.active.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.active.iter().map(|h| &self.slots[h.0])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let position = &self.position;
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(i, _)| position[*i].is_some())
            .map(|(_, slot)| slot)
    }

    /// Number of checked-out slots
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of slots waiting for reuse
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Check every slot back in
    pub fn release_everything(&mut self) {
        for handle in std::mem::take(&mut self.active) {
            self.position[handle.0] = None;
            self.free.push(handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Shot {
        y: i32,
        speed: i32,
    }

    #[test]
    fn test_release_then_acquire_reuses_slot() {
        let mut pool = Pool::new();
        let x = pool.acquire(Shot { y: 10, speed: -5 });
        assert!(pool.release(x));
        let again = pool.acquire(Shot { y: 300, speed: 4 });
        assert_eq!(again, x);
        assert_eq!(pool.get(again), Some(&Shot { y: 300, speed: 4 }));
    }

    #[test]
    fn test_released_slot_is_not_active() {
        let mut pool = Pool::new();
        let a = pool.acquire(Shot { y: 1, speed: 1 });
        let b = pool.acquire(Shot { y: 2, speed: 1 });
        pool.release(a);
        assert!(!pool.is_active(a));
        assert!(pool.get(a).is_none());
        assert_eq!(pool.handles(), vec![b]);
        assert_eq!(pool.free_len(), 1);
        // Double release is refused
        assert!(!pool.release(a));
        assert_eq!(pool.free_len(), 1);
    }

    #[test]
    fn test_release_where() {
        let mut pool = Pool::new();
        for y in 0..10 {
            pool.acquire(Shot { y, speed: 1 });
        }
        assert_eq!(pool.release_where(|s| s.y % 2 == 0), 5);
        assert_eq!(pool.len(), 5);
        assert!(pool.iter().all(|s| s.y % 2 == 1));
        assert_eq!(pool.iter_mut().count(), 5);
    }

    #[test]
    fn test_release_keeps_positions_consistent() {
        let mut pool = Pool::new();
        let handles: Vec<Handle> = (0..6).map(|y| pool.acquire(Shot { y, speed: 1 })).collect();
        // Release from the front so every release moves the tail entry
        assert_eq!(pool.release_all(handles[..3].iter().copied()), 3);
        let mut ys: Vec<i32> = pool.iter().map(|s| s.y).collect();
        ys.sort();
        assert_eq!(ys, vec![3, 4, 5]);
        for &h in &handles[3..] {
            assert!(pool.release(h));
        }
        assert!(pool.is_empty());
        assert_eq!(pool.free_len(), 6);
    }

    proptest! {
        #[test]
        fn prop_never_active_and_free(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
            let mut pool = Pool::new();
            for (i, acquire) in ops.into_iter().enumerate() {
                if acquire || pool.is_empty() {
                    pool.acquire(i);
                } else {
                    let first = pool.handles()[0];
                    pool.release(first);
                }
                let active = pool.handles();
                prop_assert_eq!(active.len() + pool.free_len(), pool.slots.len());
                for (slot, handle) in active.iter().enumerate() {
                    prop_assert!(!pool.free.contains(&handle.index()));
                    prop_assert_eq!(pool.position[handle.index()], Some(slot));
                }
            }
        }
    }
}
