//! SetValidator - the matching rules, consumed by the dealer as an opaque
//! predicate plus a group enumerator.
//!
//! The dealer only ever asks two questions: "is this selection a valid
//! group?" and "does any valid group still exist among these cards?" (the
//! latter via `find_groups` with limit 1, also used unbounded for hints).

use crate::CardId;

/// Decides whether a group of cards matches, and enumerates matching groups.
pub trait SetValidator: Send + Sync {
    /// True iff `cards` form a valid group.
    fn is_valid_group(&self, cards: &[CardId]) -> bool;

    /// Valid groups among `cards`, stopping once `limit` have been found.
    /// `limit = 1` is an existence probe; `usize::MAX` enumerates all.
    fn find_groups(&self, cards: &[CardId], limit: usize) -> Vec<Vec<CardId>>;
}

/// The classic 81-card rules: each card id encodes `feature_count` features
/// in base `option_count`, and a group is valid iff every feature is either
/// the same across all cards or different on every card.
pub struct FeatureValidator {
    group_size: usize,
    feature_count: u32,
    option_count: usize,
}

impl FeatureValidator {
    pub fn new(group_size: usize, feature_count: u32, option_count: usize) -> Self {
        Self {
            group_size,
            feature_count,
            option_count,
        }
    }

    /// Standard deck: groups of 3, four features with three options each.
    pub fn classic() -> Self {
        Self::new(3, 4, 3)
    }

    fn feature(&self, card: CardId, index: u32) -> usize {
        card / self.option_count.pow(index) % self.option_count
    }

    fn feature_ok(&self, cards: &[CardId], index: u32) -> bool {
        let first = self.feature(cards[0], index);
        let all_same = cards.iter().all(|&c| self.feature(c, index) == first);
        if all_same {
            return true;
        }
        let mut seen = vec![false; self.option_count];
        cards.iter().all(|&c| {
            let v = self.feature(c, index);
            !std::mem::replace(&mut seen[v], true)
        })
    }

    fn collect_groups(
        &self,
        cards: &[CardId],
        start: usize,
        current: &mut Vec<CardId>,
        out: &mut Vec<Vec<CardId>>,
        limit: usize,
    ) {
        if out.len() >= limit {
            return;
        }
        if current.len() == self.group_size {
            if self.is_valid_group(current) {
                out.push(current.clone());
            }
            return;
        }
        for i in start..cards.len() {
            current.push(cards[i]);
            self.collect_groups(cards, i + 1, current, out, limit);
            current.pop();
            if out.len() >= limit {
                return;
            }
        }
    }
}

impl SetValidator for FeatureValidator {
    fn is_valid_group(&self, cards: &[CardId]) -> bool {
        if cards.len() != self.group_size {
            return false;
        }
        (0..self.feature_count).all(|f| self.feature_ok(cards, f))
    }

    fn find_groups(&self, cards: &[CardId], limit: usize) -> Vec<Vec<CardId>> {
        let mut out = Vec::new();
        if limit == 0 || cards.len() < self.group_size {
            return out;
        }
        let mut current = Vec::with_capacity(self.group_size);
        self.collect_groups(cards, 0, &mut current, &mut out, limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Card id = f0 + 3*f1 + 9*f2 + 27*f3

    #[test]
    fn test_valid_group_one_feature_distinct() {
        let v = FeatureValidator::classic();
        // Features (0,0,0,0), (1,0,0,0), (2,0,0,0): first distinct, rest same
        assert!(v.is_valid_group(&[0, 1, 2]));
    }

    #[test]
    fn test_valid_group_all_features_distinct() {
        let v = FeatureValidator::classic();
        // (0,0,0,0), (1,1,1,1), (2,2,2,2)
        assert!(v.is_valid_group(&[0, 13, 26]));
    }

    #[test]
    fn test_invalid_group_two_of_a_kind() {
        let v = FeatureValidator::classic();
        // First feature is 0, 1, 0: neither all-same nor all-distinct
        assert!(!v.is_valid_group(&[0, 1, 3]));
    }

    #[test]
    fn test_wrong_size_is_invalid() {
        let v = FeatureValidator::classic();
        assert!(!v.is_valid_group(&[0, 1]));
        assert!(!v.is_valid_group(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_find_groups_existence_probe() {
        let v = FeatureValidator::classic();
        assert_eq!(v.find_groups(&[0, 1, 2, 5], 1).len(), 1);
        assert!(v.find_groups(&[0, 1, 3], 1).is_empty());
        assert!(v.find_groups(&[0, 1], 1).is_empty());
    }

    #[test]
    fn test_find_groups_respects_limit() {
        let v = FeatureValidator::classic();
        // The full deck holds far more than two groups
        let deck: Vec<CardId> = (0..81).collect();
        assert_eq!(v.find_groups(&deck, 2).len(), 2);
    }

    #[test]
    fn test_every_found_group_is_valid() {
        let v = FeatureValidator::classic();
        let cards: Vec<CardId> = (0..27).collect();
        for group in v.find_groups(&cards, usize::MAX) {
            assert!(v.is_valid_group(&group), "invalid group {group:?}");
        }
    }
}
