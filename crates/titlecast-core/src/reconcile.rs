// ── Snapshot reconciliation ──
//
// Snapshots arrive whole; the rendered list is diffed against them by
// broadcast id so entries keep their identity. An entry that survives a
// snapshot stays where it was, whatever order the server listed it in;
// new entries append in snapshot order; entries the snapshot no longer
// mentions are dropped. Only titles are expected to change in place.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::{Broadcast, Platform};

/// What changed when one snapshot was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub added: usize,
    /// Entries whose title changed in place.
    pub updated: usize,
    pub removed: usize,
    /// YouTube broadcasts live after the apply.
    pub youtube_live: usize,
}

impl ReconcileSummary {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.removed > 0
    }
}

/// Insertion-ordered broadcast list keyed by broadcast id.
#[derive(Debug, Clone, Default)]
pub struct BroadcastList {
    entries: IndexMap<String, Broadcast>,
}

impl BroadcastList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the list against a fresh snapshot.
    ///
    /// Applying the same snapshot twice is a no-op the second time.
    pub fn apply(&mut self, snapshot: &[Broadcast]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();

        for broadcast in snapshot {
            match self.entries.get_mut(&broadcast.id) {
                Some(existing) => {
                    // Platform and url are fixed for the lifetime of an id;
                    // the title is the only field that moves.
                    if existing.title != broadcast.title {
                        existing.title.clone_from(&broadcast.title);
                        summary.updated += 1;
                    }
                }
                None => {
                    self.entries
                        .insert(broadcast.id.clone(), broadcast.clone());
                    summary.added += 1;
                }
            }
        }

        let keep: HashSet<&str> = snapshot.iter().map(|b| b.id.as_str()).collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| keep.contains(id.as_str()));
        summary.removed = before - self.entries.len();

        summary.youtube_live = self.youtube_count();
        summary
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Broadcast> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn youtube_count(&self) -> usize {
        self.entries
            .values()
            .filter(|b| b.platform == Platform::YouTube)
            .count()
    }

    /// The current entries in display order.
    pub fn snapshot(&self) -> Vec<Broadcast> {
        self.entries.values().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn twitch(id: &str, title: &str) -> Broadcast {
        Broadcast {
            id: id.into(),
            platform: Platform::Twitch,
            title: title.into(),
            url: format!("https://twitch.tv/{id}"),
        }
    }

    fn youtube(id: &str, title: &str) -> Broadcast {
        Broadcast {
            id: id.into(),
            platform: Platform::YouTube,
            title: title.into(),
            url: format!("https://youtube.com/watch?v={id}"),
        }
    }

    fn ids(list: &BroadcastList) -> Vec<String> {
        list.snapshot().into_iter().map(|b| b.id).collect()
    }

    #[test]
    fn first_apply_adds_everything_in_snapshot_order() {
        let mut list = BroadcastList::new();
        let summary = list.apply(&[twitch("t1", "A"), youtube("youtube-y1", "B")]);

        assert_eq!(summary.added, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.youtube_live, 1);
        assert_eq!(ids(&list), ["t1", "youtube-y1"]);
    }

    #[test]
    fn reapplying_the_same_snapshot_changes_nothing() {
        let mut list = BroadcastList::new();
        let snapshot = [twitch("t1", "A"), youtube("youtube-y1", "B")];
        list.apply(&snapshot);
        let summary = list.apply(&snapshot);

        assert!(!summary.changed());
        assert_eq!(summary.youtube_live, 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn title_changes_update_in_place() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A"), twitch("t2", "B")]);
        let summary = list.apply(&[twitch("t1", "A2"), twitch("t2", "B")]);

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(list.get("t1").unwrap().title, "A2");
    }

    #[test]
    fn url_changes_are_not_counted_or_applied() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A")]);

        let mut moved = twitch("t1", "A");
        moved.url = "https://twitch.tv/elsewhere".into();
        let summary = list.apply(&[moved]);

        assert!(!summary.changed());
        assert_eq!(list.get("t1").unwrap().url, "https://twitch.tv/t1");
    }

    #[test]
    fn absent_entries_are_removed() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A"), youtube("youtube-y1", "B"), twitch("t2", "C")]);
        let summary = list.apply(&[twitch("t1", "A"), twitch("t2", "C")]);

        assert_eq!(summary.removed, 1);
        assert_eq!(summary.youtube_live, 0);
        assert_eq!(ids(&list), ["t1", "t2"]);
    }

    #[test]
    fn surviving_entries_keep_their_position_regardless_of_snapshot_order() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("a", "1"), twitch("b", "2"), twitch("c", "3")]);

        // Server reorders; our list does not.
        list.apply(&[twitch("c", "3"), twitch("a", "1"), twitch("b", "2")]);
        assert_eq!(ids(&list), ["a", "b", "c"]);
    }

    #[test]
    fn new_entries_append_after_survivors() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("a", "1"), twitch("b", "2"), twitch("c", "3")]);
        list.apply(&[twitch("c", "3"), twitch("b", "2")]);
        assert_eq!(ids(&list), ["b", "c"]);

        // A re-added id is a new entry and goes to the end.
        let summary = list.apply(&[twitch("b", "2"), twitch("c", "3"), twitch("a", "1")]);
        assert_eq!(summary.added, 1);
        assert_eq!(ids(&list), ["b", "c", "a"]);
    }

    #[test]
    fn mixed_snapshot_counts_every_kind_of_change() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A"), youtube("youtube-y1", "B")]);

        let summary = list.apply(&[twitch("t1", "A2"), youtube("youtube-y2", "C")]);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.youtube_live, 1);
        assert_eq!(ids(&list), ["t1", "youtube-y2"]);
    }

    #[test]
    fn empty_snapshot_empties_the_list() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A")]);
        let summary = list.apply(&[]);

        assert_eq!(summary.removed, 1);
        assert!(list.is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let mut list = BroadcastList::new();
        list.apply(&[twitch("t1", "A"), youtube("youtube-y1", "B")]);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.youtube_count(), 0);
    }
}
