//! Small containers used by the physics tick.

/// Array-backed binary max-heap keyed by an `f32` priority.
///
/// Ties are broken by insertion order (earlier first) so the dequeue order is
/// deterministic. NaN priorities are treated as the lowest priority.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    heap: Vec<Entry<T>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    priority: f32,
    seq: u64,
    item: T,
}

impl<T> Entry<T> {
    /// True when `self` should sit above `other`.
    fn outranks(&self, other: &Entry<T>) -> bool {
        let (a, b) = (sanitize(self.priority), sanitize(other.priority));
        a > b || (a == b && self.seq < other.seq)
    }
}

fn sanitize(p: f32) -> f32 {
    if p.is_nan() {
        f32::NEG_INFINITY
    } else {
        p
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn enqueue(&mut self, item: T, priority: f32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            priority,
            seq,
            item,
        });
        self.sift_up(self.heap.len() - 1);
    }

    /// Removes and returns the highest-priority item.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let top = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        top.map(|e| e.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.first().map(|e| &e.item)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx].outranks(&self.heap[parent]) {
                self.heap.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut best = idx;
            if left < len && self.heap[left].outranks(&self.heap[best]) {
                best = left;
            }
            if right < len && self.heap[right].outranks(&self.heap[best]) {
                best = right;
            }
            if best == idx {
                break;
            }
            self.heap.swap(idx, best);
            idx = best;
        }
    }
}

impl<T> FromIterator<(T, f32)> for PriorityQueue<T> {
    fn from_iter<I: IntoIterator<Item = (T, f32)>>(iter: I) -> Self {
        let mut q = PriorityQueue::new();
        for (item, priority) in iter {
            q.enqueue(item, priority);
        }
        q
    }
}
