use std::collections::{BTreeMap, BTreeSet};

/// Mapping from transient tracker IDs to canonical subject IDs.
///
/// Built row by row from an equivalence table: each row's minimum ID
/// becomes the canonical ID of every member. Rows are applied in order
/// and later rows overwrite earlier bindings, so rows sharing a member
/// are *not* merged transitively (`1,2` then `2,3` maps 2 to 2, not 1).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdMap {
    bindings: BTreeMap<u32, u32>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u32]>,
    {
        let mut map = Self::new();
        for row in rows {
            map.bind_group(row.as_ref());
        }
        map
    }

    /// Binds every ID in `group` to the group's minimum. Empty groups are ignored.
    pub fn bind_group(&mut self, group: &[u32]) {
        let Some(&canonical) = group.iter().min() else {
            return;
        };
        for &id in group {
            self.bindings.insert(id, canonical);
        }
    }

    pub fn canonical(&self, track_id: u32) -> Option<u32> {
        self.bindings.get(&track_id).copied()
    }

    /// Distinct canonical IDs, i.e. the subjects that get a masked video.
    pub fn canonical_ids(&self) -> BTreeSet<u32> {
        self.bindings.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.bindings.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_two_groups() {
        let map = IdMap::from_rows([vec![1u32, 2, 5], vec![3, 4]]);
        let expected: Vec<(u32, u32)> = vec![(1, 1), (2, 1), (3, 3), (4, 3), (5, 1)];
        assert_eq!(map.iter().collect::<Vec<_>>(), expected);
        assert_eq!(map.canonical_ids(), BTreeSet::from([1, 3]));
    }

    #[rstest]
    #[case::sorted(vec![1, 2, 5])]
    #[case::unsorted(vec![9, 4, 7])]
    #[case::singleton(vec![12])]
    #[case::duplicate_members(vec![8, 3, 8])]
    fn test_row_members_map_to_minimum(#[case] row: Vec<u32>) {
        let map = IdMap::from_rows([row.clone()]);
        let min = *row.iter().min().unwrap();
        for id in &row {
            assert_eq!(map.canonical(*id), Some(min));
        }
        assert_eq!(map.canonical(min), Some(min));
    }

    #[test]
    fn test_later_rows_overwrite_without_transitive_merge() {
        let map = IdMap::from_rows([vec![1u32, 2], vec![2, 3]]);
        assert_eq!(map.canonical(1), Some(1));
        assert_eq!(map.canonical(2), Some(2));
        assert_eq!(map.canonical(3), Some(2));
        assert_eq!(map.canonical_ids(), BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_empty_rows_are_ignored() {
        let map = IdMap::from_rows([vec![], vec![4u32, 6], vec![]]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.canonical(6), Some(4));
    }

    #[test]
    fn test_empty_table_yields_empty_map() {
        let map = IdMap::from_rows(Vec::<Vec<u32>>::new());
        assert!(map.is_empty());
        assert!(map.canonical_ids().is_empty());
    }

    #[test]
    fn test_unmapped_id_is_none() {
        let map = IdMap::from_rows([vec![1u32, 2]]);
        assert_eq!(map.canonical(3), None);
    }
}
