use std::collections::VecDeque;

/// Bounded FIFO of the most recent `capacity` items, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is bumped to one so the latest element is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Returns a new buffer equal to `self` with `item` appended; `self` is
    /// left untouched.
    pub fn appended(&self, item: T) -> Self {
        let mut next = self.clone();
        next.push(item);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents<T: Copy>(rb: &RingBuffer<T>) -> Vec<T> {
        rb.iter().copied().collect()
    }

    #[test]
    fn test_oldest_is_evicted_first() {
        let rb = (1..=4).fold(RingBuffer::new(3), |rb, i| rb.appended(i));
        assert_eq!(rb.len(), 3);
        assert_eq!(contents(&rb), vec![2, 3, 4]);
        assert_eq!(rb.last(), Some(&4));
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let rb: RingBuffer<u8> = RingBuffer::new(5);
        assert!(rb.is_empty());
        assert_eq!(rb.capacity(), 5);
        assert_eq!(rb.last(), None);
    }

    #[test]
    fn test_appended_leaves_original_untouched() {
        let rb = RingBuffer::new(2).appended(1).appended(2);
        let next = rb.appended(3);
        assert_eq!(contents(&rb), vec![1, 2]);
        assert_eq!(contents(&next), vec![2, 3]);
    }

    #[test]
    fn test_many_appends_keep_most_recent_in_order() {
        let capacity = 7;
        let mut rb = RingBuffer::new(capacity);
        for i in 0..100 {
            rb = rb.appended(i);
            assert!(rb.len() <= capacity);
        }
        assert_eq!(contents(&rb), (93..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let rb = RingBuffer::new(0).appended('a').appended('b');
        assert_eq!(rb.capacity(), 1);
        assert_eq!(contents(&rb), vec!['b']);
    }
}
