//! Version-stamped node storage.
//!
//! A search reuses one slot array across requests.  Instead of clearing it,
//! each search bumps a version counter; a slot's value counts only while its
//! stamp equals the current version.  Reads go through [`StampedSlots::get`],
//! which hides stale values, so no caller can observe a previous search's
//! bookkeeping.

pub struct StampedSlots<T> {
    version: u32,
    stamps:  Vec<u32>,
    values:  Vec<T>,
}

impl<T: Copy + Default> StampedSlots<T> {
    pub fn new(len: usize) -> Self {
        Self {
            version: 1,
            stamps:  vec![0; len],
            values:  vec![T::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Grow or shrink to `len` slots.  Existing values keep their stamps.
    pub fn resize(&mut self, len: usize) {
        self.stamps.resize(len, 0);
        self.values.resize(len, T::default());
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Invalidate every slot in O(1).  On wrap-around the stamps are cleared
    /// so an ancient stamp can never collide with the new version.
    pub fn next_version(&mut self) {
        if self.version == u32::MAX {
            self.stamps.fill(0);
            self.version = 1;
        } else {
            self.version += 1;
        }
    }

    #[inline]
    pub fn is_current(&self, i: usize) -> bool {
        self.stamps.get(i) == Some(&self.version)
    }

    /// The slot's value if it was written during the current version.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        self.is_current(i).then(|| &self.values[i])
    }

    #[inline]
    pub fn get_mut(&mut self, i: usize) -> Option<&mut T> {
        if self.is_current(i) { Some(&mut self.values[i]) } else { None }
    }

    /// Write `value` and stamp the slot current.  Out-of-range writes are
    /// ignored and return `false`.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) -> bool {
        match self.values.get_mut(i) {
            Some(slot) => {
                *slot = value;
                self.stamps[i] = self.version;
                true
            }
            None => false,
        }
    }
}
