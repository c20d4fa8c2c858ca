use std::time::Instant;

struct Entry<T> {
    due: Instant,
    seq: u64,
    item: T,
}

/// Pending continuations ordered by due time, then by insertion.
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, item: T) {
        self.seq += 1;
        self.entries.push(Entry {
            due,
            seq: self.seq,
            item,
        });
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Remove and return the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        Some((entry.due, entry.item))
    }
}
