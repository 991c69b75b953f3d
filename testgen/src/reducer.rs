//! Cap-and-dedup pass over generated cases

use cctm_core::TestCase;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub test_cases: Vec<TestCase>,
    pub duplicates: usize,
    /// Unique cases remained when the cap was hit.
    pub cap_reached: bool,
    pub dropped: usize,
}

/// Keep the first case per serialized input map, up to `cap` cases.
pub fn reduce(test_cases: Vec<TestCase>, cap: usize) -> Reduction {
    reduce_by(test_cases, cap, TestCase::input_key)
}

/// Like [`reduce`] with a caller-supplied equality key. Relative order is
/// preserved.
pub fn reduce_by<K, F>(test_cases: Vec<TestCase>, cap: usize, key: F) -> Reduction
where
    K: Eq + std::hash::Hash,
    F: Fn(&TestCase) -> K,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(cap.min(test_cases.len()));
    let mut duplicates = 0;
    let mut dropped = 0;

    for tc in test_cases {
        if !seen.insert(key(&tc)) {
            duplicates += 1;
            continue;
        }
        if kept.len() < cap {
            kept.push(tc);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::info!(cap, dropped, "reduction cap reached");
    }
    Reduction {
        test_cases: kept,
        duplicates,
        cap_reached: dropped > 0,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctm_core::{inputs, CaseKind};

    fn case(id: &str, x: i64) -> TestCase {
        TestCase {
            id: id.into(),
            kind: CaseKind::Valid,
            inputs: inputs! { "x" => x },
            expected: None,
            meta: Vec::new(),
        }
    }

    #[test]
    fn test_dedup_preserves_order() {
        let cases = vec![case("a", 1), case("b", 2), case("c", 1), case("d", 3)];
        let r = reduce(cases, 10);
        let ids: Vec<_> = r.test_cases.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
        assert_eq!(r.duplicates, 1);
        assert!(!r.cap_reached);
    }

    #[test]
    fn test_cap() {
        let cases = (0..5).map(|i| case(&format!("t{}", i), i)).collect();
        let r = reduce(cases, 3);
        assert_eq!(r.test_cases.len(), 3);
        assert!(r.cap_reached);
        assert_eq!(r.dropped, 2);
        assert_eq!(r.test_cases[2].id, "t2");
    }

    #[test]
    fn test_custom_key() {
        let cases = vec![case("a", 1), case("b", 2)];
        let r = reduce_by(cases, 10, |tc| tc.kind);
        assert_eq!(r.test_cases.len(), 1);
    }
}
