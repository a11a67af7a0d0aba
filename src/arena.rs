//! Scratch Arena
//!
//! A single growable byte buffer shared with the native module for bulk
//! parameter passing. The native side writes staged data (ids, payload
//! bytes, float tables) into the arena; the runtime reads it back through
//! typed views over the same memory.
//!
//! Growth is quantized: the arena only ever reallocates to a multiple of
//! [`SCRATCH_QUANTUM`] bytes, and never shrinks. Reallocation moves the
//! backing storage, so any previously obtained view is invalid afterwards.
//! The typed view accessors borrow the arena mutably, which lets the
//! compiler reject stale views instead of leaving that to convention.
//!
//! The backing store is a `Vec<u64>`, so every view is 8-byte aligned and
//! all element casts are exact.

/// Growth quantum of the scratch arena, in bytes.
pub const SCRATCH_QUANTUM: usize = 4096;

/// Shared staging buffer with quantized growth and typed views.
///
/// ```rust,ignore
/// let mut arena = ScratchArena::new();
/// arena.ints(3).copy_from_slice(&[10, 11, 12]);
/// ```
#[derive(Debug, Default)]
pub struct ScratchArena {
    words: Vec<u64>,
}

impl ScratchArena {
    /// Creates an empty arena. No memory is allocated until the first
    /// capacity request.
    #[must_use]
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates an arena that already holds at least `bytes` bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        let mut arena = Self::new();
        arena.require_capacity(bytes);
        arena
    }

    /// Current capacity in bytes. Always a multiple of [`SCRATCH_QUANTUM`]
    /// (zero counts).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.words.len() * 8
    }

    /// Ensures the arena holds at least `min_bytes` bytes.
    ///
    /// Grows to the next quantum multiple when the current capacity is
    /// insufficient; otherwise does nothing. New bytes are zeroed.
    /// Existing content below the old capacity is preserved across growth.
    pub fn require_capacity(&mut self, min_bytes: usize) {
        if min_bytes <= self.capacity() {
            return;
        }
        let rounded = min_bytes.div_ceil(SCRATCH_QUANTUM) * SCRATCH_QUANTUM;
        self.words.resize(rounded / 8, 0);
        log::trace!("scratch arena grown to {rounded} bytes");
    }

    /// Byte view over the first `count` bytes, growing the arena if needed.
    pub fn bytes(&mut self, count: usize) -> &mut [u8] {
        self.require_capacity(count);
        &mut bytemuck::cast_slice_mut(&mut self.words)[..count]
    }

    /// 16-bit view over the first `count` elements, growing the arena if needed.
    pub fn shorts(&mut self, count: usize) -> &mut [i16] {
        self.require_capacity(count * 2);
        &mut bytemuck::cast_slice_mut(&mut self.words)[..count]
    }

    /// 32-bit integer view over the first `count` elements, growing the
    /// arena if needed. Native object and component ids travel through
    /// this view.
    pub fn ints(&mut self, count: usize) -> &mut [i32] {
        self.require_capacity(count * 4);
        &mut bytemuck::cast_slice_mut(&mut self.words)[..count]
    }

    /// 32-bit float view over the first `count` elements, growing the
    /// arena if needed.
    pub fn floats(&mut self, count: usize) -> &mut [f32] {
        self.require_capacity(count * 4);
        &mut bytemuck::cast_slice_mut(&mut self.words)[..count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_arena_is_empty() {
        let mut arena = ScratchArena::new();
        assert_eq!(arena.capacity(), 0);

        // A zero-byte requirement must not allocate.
        arena.require_capacity(0);
        assert_eq!(arena.capacity(), 0);

        // Zero-length views on an empty arena are valid.
        assert!(arena.bytes(0).is_empty());
        assert!(arena.floats(0).is_empty());
    }

    #[test]
    fn growth_rounds_to_quantum() {
        let mut arena = ScratchArena::new();
        arena.require_capacity(1);
        assert_eq!(arena.capacity(), SCRATCH_QUANTUM);

        arena.require_capacity(SCRATCH_QUANTUM + 1);
        assert_eq!(arena.capacity(), 2 * SCRATCH_QUANTUM);
    }

    #[test]
    fn sufficient_capacity_is_a_no_op() {
        let mut arena = ScratchArena::with_capacity(100);
        let cap = arena.capacity();
        assert_eq!(cap, SCRATCH_QUANTUM);

        arena.require_capacity(50);
        arena.require_capacity(cap);
        assert_eq!(arena.capacity(), cap);
    }

    #[test]
    fn capacity_never_shrinks() {
        let mut arena = ScratchArena::with_capacity(3 * SCRATCH_QUANTUM);
        arena.require_capacity(1);
        assert_eq!(arena.capacity(), 3 * SCRATCH_QUANTUM);
    }

    #[test]
    fn views_share_the_same_prefix() {
        let mut arena = ScratchArena::new();
        arena.ints(2).copy_from_slice(&[0x0403_0201, 0x0807_0605]);

        // Little-endian prefix aliasing across element widths.
        assert_eq!(arena.bytes(8), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(arena.shorts(2), &[0x0201, 0x0403]);
    }

    #[test]
    fn content_survives_growth() {
        let mut arena = ScratchArena::new();
        arena.floats(2).copy_from_slice(&[1.5, -2.5]);

        arena.require_capacity(2 * SCRATCH_QUANTUM);
        assert_eq!(arena.floats(2), &[1.5, -2.5]);
    }
}
