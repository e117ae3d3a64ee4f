//! Amortized FIFO buffer
//!
//! Pops never shift the backing vector. Consumed slots are left behind a
//! read cursor and reclaimed in one move once they make up at least half
//! of the stored slots, so `push` + `pop` stay amortized O(1) and the
//! backing storage never exceeds twice the live count right after a pop.

/// FIFO buffer with lazy compaction
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    read_index: usize,
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RingBuffer<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            read_index: 0,
        }
    }

    /// Append to the back. Capacity checks are the caller's job.
    pub fn push(&mut self, item: T) {
        self.slots.push(Some(item));
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Option<T> {
        if self.read_index >= self.slots.len() {
            return None;
        }

        let item = self.slots[self.read_index].take();
        self.read_index += 1;

        if self.read_index * 2 >= self.slots.len() {
            self.compact();
        }

        item
    }

    /// Oldest item without removing it
    pub fn peek(&self) -> Option<&T> {
        self.slots.get(self.read_index).and_then(Option::as_ref)
    }

    /// Number of items not yet popped
    pub fn len(&self) -> usize {
        self.slots.len() - self.read_index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots currently held by the backing vector, consumed ones included
    pub fn stored_slots(&self) -> usize {
        self.slots.len()
    }

    /// Iterate unread items, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots[self.read_index..].iter().filter_map(Option::as_ref)
    }

    fn compact(&mut self) {
        self.slots.drain(..self.read_index);
        self.read_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_empty() {
        let mut buf: RingBuffer<u32> = RingBuffer::new();
        assert_eq!(buf.pop(), None);
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut buf = RingBuffer::new();
        for i in 0..5 {
            buf.push(i);
        }
        let drained: Vec<_> = std::iter::from_fn(|| buf.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_compacts_when_half_consumed() {
        let mut buf = RingBuffer::new();
        for i in 0..4 {
            buf.push(i);
        }

        // 1 of 4 consumed: no compaction yet
        assert_eq!(buf.pop(), Some(0));
        assert_eq!(buf.stored_slots(), 4);
        assert_eq!(buf.len(), 3);

        // 2 of 4 consumed: compaction kicks in
        assert_eq!(buf.pop(), Some(1));
        assert_eq!(buf.stored_slots(), 2);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.peek(), Some(&2));
    }

    #[test]
    fn test_last_pop_releases_storage() {
        let mut buf = RingBuffer::new();
        buf.push("a");
        assert_eq!(buf.pop(), Some("a"));
        assert_eq!(buf.stored_slots(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_interleaved_length_and_storage_bound() {
        let mut buf = RingBuffer::new();
        let mut pushes = 0usize;
        let mut pops = 0usize;

        // Deterministic interleaving: bursts of pushes followed by fewer pops
        for round in 0..200usize {
            for _ in 0..(round % 7 + 1) {
                buf.push(pushes);
                pushes += 1;
            }
            for _ in 0..(round % 5 + 1) {
                if let Some(v) = buf.pop() {
                    assert_eq!(v, pops, "items must come out in push order");
                    pops += 1;
                    assert!(
                        buf.stored_slots() <= 2 * buf.len().max(1),
                        "storage {} exceeds 2x live {}",
                        buf.stored_slots(),
                        buf.len()
                    );
                }
            }
            assert_eq!(buf.len(), pushes - pops);
        }
    }

    #[test]
    fn test_iter_skips_consumed() {
        let mut buf = RingBuffer::new();
        for i in 0..6 {
            buf.push(i);
        }
        buf.pop();
        let rest: Vec<_> = buf.iter().copied().collect();
        assert_eq!(rest, vec![1, 2, 3, 4, 5]);
    }
}
