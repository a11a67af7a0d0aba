//! Dense id-indexed handle cache.
//!
//! Native local ids are small, dense and allocated from zero per graph,
//! so the cache is a plain slot vector indexed by id rather than a hash
//! map. Lookups on the init hot path are a bounds check and an index.

/// Slot vector keyed by non-negative native local id.
#[derive(Debug)]
pub struct IdCache<T> {
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> Default for IdCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdCache<T> {
    /// Empty cache with no slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    /// Empty cache pre-sized for ids `0..capacity`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut cache = Self::new();
        cache.reserve(capacity);
        cache
    }

    /// Ensures slots exist for ids `0..total`. Never shrinks.
    pub fn reserve(&mut self, total: usize) {
        if total > self.slots.len() {
            self.slots.resize_with(total, || None);
        }
    }

    /// Number of allocated slots (occupied or not).
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// `true` when no slot is occupied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Looks up the entry for `id`. Negative and out-of-range ids are `None`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: i32) -> Option<&T> {
        let index = usize::try_from(id).ok()?;
        self.slots.get(index)?.as_ref()
    }

    /// `true` when a live entry occupies `id`.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        self.get(id).is_some()
    }

    /// Stores `value` at `id`, growing the slot vector as needed.
    ///
    /// Returns the displaced entry when the slot was occupied. Negative
    /// ids are rejected by returning the value unchanged in `Err`.
    pub fn insert(&mut self, id: i32, value: T) -> Result<Option<T>, T> {
        let Ok(index) = usize::try_from(id) else {
            return Err(value);
        };
        self.reserve(index + 1);
        let previous = self.slots[index].replace(value);
        if previous.is_none() {
            self.live += 1;
        }
        Ok(previous)
    }

    /// Removes and returns the entry at `id`, if any. Absent ids (and
    /// negative ids) are a silent no-op.
    pub fn take(&mut self, id: i32) -> Option<T> {
        let index = usize::try_from(id).ok()?;
        let taken = self.slots.get_mut(index)?.take();
        if taken.is_some() {
            self.live -= 1;
        }
        taken
    }

    /// Iterates occupied slots as `(id, entry)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index as i32, value)))
    }

    /// Removes every entry, keeping the slot allocation.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.live = 0;
        self.slots.iter_mut().filter_map(Option::take)
    }
}
