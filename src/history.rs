// history.rs

use crate::error::HistoryError;

/// Fixed-capacity ring of previously accepted command lines.
///
/// `count` is the logical index of the newest entry (`-1` while empty) and the
/// newest entry always lives in slot `count % capacity`. Slots are overwritten
/// in place, never shifted.
///
/// The counter is reset to `-1` only when it is already `>= capacity` at the
/// start of an append. So the append that first wraps lands in slot 0 with
/// `count == capacity`, and the one after it resets the counter and lands in
/// slot 0 again with `count == 0`.
pub struct HistoryStore {
    slots: Box<[Option<String>]>,
    count: isize,
}

impl HistoryStore {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            count: -1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == -1
    }

    /// Logical index of the newest entry, `None` while empty.
    pub fn count(&self) -> Option<usize> {
        usize::try_from(self.count).ok()
    }

    /// Stores `line` and returns its logical index.
    pub fn append(&mut self, line: impl Into<String>) -> usize {
        if self.count >= self.capacity() as isize {
            self.count = -1;
        }
        self.count += 1;
        let index = self.count as usize;
        let slot = self.slot(index);
        self.slots[slot] = Some(line.into());
        index
    }

    pub fn recall_latest(&self) -> Result<&str, HistoryError> {
        if self.is_empty() {
            return Err(HistoryError::Empty);
        }
        self.entry(self.count as usize).ok_or(HistoryError::Empty)
    }

    /// Looks up a 0-based logical index. The user-facing grammar is 1-based,
    /// so callers subtract one first.
    ///
    /// The range check is against the logical counter only. Once the ring has
    /// wrapped, an index in range may name a slot that has since been
    /// overwritten, and that newer text is what comes back.
    pub fn recall_by_number(&self, index: i64) -> Result<&str, HistoryError> {
        let invalid = HistoryError::InvalidIndex(index.saturating_add(1));
        if index < 0 || index > self.count as i64 {
            return Err(invalid);
        }
        self.entry(index as usize).ok_or(invalid)
    }

    /// Up to `limit` entries walking back from the newest, each paired with
    /// its 1-based display number. Newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<(usize, &str)>, HistoryError> {
        let newest = self.count().ok_or(HistoryError::Empty)?;
        Ok((0..=newest)
            .rev()
            .take(limit)
            .filter_map(|index| self.entry(index).map(|line| (index + 1, line)))
            .collect())
    }

    fn slot(&self, index: usize) -> usize {
        index % self.capacity()
    }

    fn entry(&self, index: usize) -> Option<&str> {
        self.slots[self.slot(index)].as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled(capacity: usize, n: usize) -> HistoryStore {
        let mut store = HistoryStore::new(capacity);
        for i in 1..=n {
            store.append(format!("cmd {i}"));
        }
        store
    }

    #[test]
    fn empty_store_reports_empty() {
        let store = HistoryStore::new(4);
        assert!(store.is_empty());
        assert_eq!(store.count(), None);
        assert_eq!(store.recall_latest(), Err(HistoryError::Empty));
        assert_eq!(store.list_recent(10), Err(HistoryError::Empty));
        assert_eq!(store.recall_by_number(0), Err(HistoryError::InvalidIndex(1)));
    }

    #[test]
    fn append_returns_logical_index() {
        let mut store = HistoryStore::new(4);
        assert_eq!(store.append("a"), 0);
        assert_eq!(store.append("b"), 1);
        assert_eq!(store.count(), Some(1));
    }

    #[test]
    fn wrap_overwrites_oldest_slot() {
        let store = filled(5, 6);
        assert_eq!(store.count(), Some(5));
        assert_eq!(store.recall_latest(), Ok("cmd 6"));
        // slot 0 held "cmd 1" and was overwritten
        assert_eq!(store.recall_by_number(0), Ok("cmd 6"));
        assert_eq!(store.recall_by_number(1), Ok("cmd 2"));
    }

    #[test]
    fn counter_resets_one_append_after_wrap() {
        let mut store = filled(5, 6);
        assert_eq!(store.append("cmd 7"), 0);
        assert_eq!(store.recall_latest(), Ok("cmd 7"));
        assert_eq!(store.append("cmd 8"), 1);
        assert_eq!(store.recall_latest(), Ok("cmd 8"));
        // indices past the reset counter are out of range even though the slots are live
        assert_eq!(store.recall_by_number(3), Err(HistoryError::InvalidIndex(4)));
    }

    #[test]
    fn recall_latest_does_not_mutate() {
        let store = filled(10, 3);
        assert_eq!(store.recall_latest(), Ok("cmd 3"));
        assert_eq!(store.recall_latest(), Ok("cmd 3"));
        assert_eq!(store.count(), Some(2));
    }

    #[test]
    fn recall_by_number_round_trips() {
        let mut store = HistoryStore::new(100);
        for i in 0..50 {
            let line = format!("echo {i}");
            let index = store.append(line.clone());
            assert_eq!(store.recall_by_number(index as i64), Ok(line.as_str()));
        }
    }

    #[test]
    fn recall_by_number_rejects_out_of_range() {
        let store = filled(10, 3);
        assert_eq!(store.recall_by_number(3), Err(HistoryError::InvalidIndex(4)));
        assert_eq!(store.recall_by_number(-1), Err(HistoryError::InvalidIndex(0)));
        assert_eq!(
            store.recall_by_number(i64::MAX),
            Err(HistoryError::InvalidIndex(i64::MAX))
        );
    }

    #[test]
    fn list_recent_is_bounded_and_newest_first() {
        let store = filled(100, 15);
        let listed = store.list_recent(10).unwrap();
        let numbers: Vec<usize> = listed.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6]);
        assert_eq!(listed[0].1, "cmd 15");
        assert_eq!(listed[9].1, "cmd 6");
    }

    #[test]
    fn list_recent_stops_at_first_entry() {
        let store = filled(100, 3);
        assert_eq!(
            store.list_recent(10).unwrap(),
            vec![(3, "cmd 3"), (2, "cmd 2"), (1, "cmd 1")]
        );
    }
}
