//! Binary min-heap priority queue used by the jump router.
//!
//! Priorities only need [`PartialOrd`] so that lexicographic cost pairs
//! and plain `f64` values both work. Entries with equal priority come out
//! in insertion order: every entry carries a sequence number that breaks
//! ties, which keeps shortest-path results reproducible.

use std::cmp::Ordering;

/// One heap slot.
#[derive(Debug, Clone)]
struct Entry<K, P> {
    priority: P,
    seq: u64,
    key: K,
}

impl<K, P: PartialOrd> Entry<K, P> {
    /// `true` if `self` must be dequeued before `other`.
    fn precedes(&self, other: &Self) -> bool {
        match self.priority.partial_cmp(&other.priority) {
            Some(Ordering::Less) => true,
            Some(Ordering::Greater) => false,
            // Equal or incomparable (NaN): fall back to insertion order.
            Some(Ordering::Equal) | None => self.seq < other.seq,
        }
    }
}

/// A min-heap of `(priority, key)` pairs.
#[derive(Debug, Clone)]
pub struct PriorityQueue<K, P> {
    heap: Vec<Entry<K, P>>,
    next_seq: u64,
}

impl<K, P: PartialOrd> Default for PriorityQueue<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P: PartialOrd> PriorityQueue<K, P> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
        }
    }

    /// Returns `true` if no entries are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of queued entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.heap.len()
    }

    /// Insert `key` with the given `priority`. O(log n).
    pub fn enqueue(&mut self, priority: P, key: K) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { priority, seq, key });
        self.sift_up(self.heap.len() - 1);
    }

    /// Remove and return the entry with the smallest priority. O(log n).
    ///
    /// Returns `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<(P, K)> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let min = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some((min.priority, min.key))
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.heap[index].precedes(&self.heap[parent]) {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < len && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_queue_is_empty() {
        let mut q: PriorityQueue<usize, f64> = PriorityQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn dequeues_in_priority_order() {
        let mut q = PriorityQueue::new();
        for (priority, key) in [(5.0, 'e'), (1.0, 'a'), (4.0, 'd'), (2.0, 'b'), (3.0, 'c')] {
            q.enqueue(priority, key);
        }
        let keys: Vec<char> = std::iter::from_fn(|| q.dequeue().map(|(_, k)| k)).collect();
        assert_eq!(keys, vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn equal_priorities_come_out_in_insertion_order() {
        let mut q = PriorityQueue::new();
        for key in 0..20 {
            q.enqueue(1.0, key);
        }
        let keys: Vec<i32> = std::iter::from_fn(|| q.dequeue().map(|(_, k)| k)).collect();
        assert_eq!(keys, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn interleaved_enqueue_dequeue() {
        let mut q = PriorityQueue::new();
        q.enqueue(3.0, 3);
        q.enqueue(1.0, 1);
        assert_eq!(q.dequeue().unwrap(), (1.0, 1));
        q.enqueue(2.0, 2);
        q.enqueue(0.5, 0);
        assert_eq!(q.dequeue().unwrap().1, 0);
        assert_eq!(q.dequeue().unwrap().1, 2);
        assert_eq!(q.dequeue().unwrap().1, 3);
        assert!(q.is_empty());
    }

    #[test]
    fn tuple_priorities_are_lexicographic() {
        let mut q = PriorityQueue::new();
        q.enqueue((1.0, 0.0), "jump");
        q.enqueue((0.0, 50.0), "long walk");
        q.enqueue((0.0, 10.0), "short walk");
        assert_eq!(q.dequeue().unwrap().1, "short walk");
        assert_eq!(q.dequeue().unwrap().1, "long walk");
        assert_eq!(q.dequeue().unwrap().1, "jump");
    }

    #[test]
    fn many_random_like_values_sort() {
        let mut q = PriorityQueue::new();
        // Deterministic scramble of 0..100.
        for i in 0..100_u32 {
            let v = (i * 37) % 100;
            q.enqueue(f64::from(v), v);
        }
        let mut prev = None;
        while let Some((p, _)) = q.dequeue() {
            if let Some(prev) = prev {
                assert!(p >= prev);
            }
            prev = Some(p);
        }
    }
}
