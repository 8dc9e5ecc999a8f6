//! Causality Module Tests
//!
//! ## Test Scopes
//! - **Tracker**: Counter growth and snapshot isolation.
//! - **Dominance**: Irreflexivity, transitivity, concurrency and the bottom version.
//! - **Wire Format**: Version maps as plain JSON objects.

#[cfg(test)]
mod tests {
    use crate::causality::{CausalityTracker, VersionSnapshot};
    use crate::node::types::NodeId;

    fn version(pairs: &[(&str, u64)]) -> VersionSnapshot {
        pairs
            .iter()
            .map(|(id, counter)| (NodeId::from(*id), *counter))
            .collect()
    }

    // ============================================================
    // TRACKER TESTS
    // ============================================================

    #[test]
    fn test_increment_starts_from_zero() {
        let mut tracker = CausalityTracker::new();
        let node = NodeId::from("a");

        assert_eq!(tracker.get(&node), 0);
        assert_eq!(tracker.increment(&node), 1);
        assert_eq!(tracker.increment(&node), 2);
        assert_eq!(tracker.get(&node), 2);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_increments() {
        let mut tracker = CausalityTracker::new();
        let node = NodeId::from("a");

        tracker.increment(&node);
        let first = tracker.snapshot();
        tracker.increment(&node);
        let second = tracker.snapshot();

        assert_eq!(first.get(&node), 1);
        assert_eq!(second.get(&node), 2);
        assert!(second.dominates(&first));
    }

    // ============================================================
    // DOMINANCE TESTS
    // ============================================================

    #[test]
    fn test_no_snapshot_dominates_itself() {
        let samples = [
            version(&[]),
            version(&[("a", 1)]),
            version(&[("a", 3), ("b", 7)]),
        ];

        for v in &samples {
            assert!(!v.dominates(v), "{:?} must not dominate itself", v);
        }
    }

    #[test]
    fn test_dominance_is_transitive() {
        let c = version(&[("a", 1)]);
        let b = version(&[("a", 1), ("b", 1)]);
        let a = version(&[("a", 2), ("b", 1)]);

        assert!(a.dominates(&b));
        assert!(b.dominates(&c));
        assert!(a.dominates(&c));
    }

    #[test]
    fn test_dominance_is_transitive_over_generated_chains() {
        let nodes = ["a", "b", "c"];
        let mut tracker = CausalityTracker::new();
        let mut chain = vec![tracker.snapshot()];

        for step in 0..30 {
            tracker.increment(&NodeId::from(nodes[step % nodes.len()]));
            chain.push(tracker.snapshot());
        }

        for i in 0..chain.len() {
            for j in (i + 1)..chain.len() {
                assert!(chain[j].dominates(&chain[i]), "{} should dominate {}", j, i);
                assert!(!chain[i].dominates(&chain[j]));
            }
        }
    }

    #[test]
    fn test_concurrent_versions_dominate_neither_way() {
        let a = version(&[("a", 1)]);
        let b = version(&[("b", 1)]);

        assert!(!a.dominates(&b));
        assert!(!b.dominates(&a));
        assert!(a.is_concurrent_with(&b));
    }

    #[test]
    fn test_ids_missing_on_one_side_read_as_zero() {
        let bigger = version(&[("a", 2), ("b", 1)]);
        let smaller = version(&[("a", 2)]);

        assert!(bigger.dominates(&smaller));
        assert!(!smaller.dominates(&bigger));
    }

    #[test]
    fn test_empty_version_loses_against_anything() {
        let empty = VersionSnapshot::empty();
        let any = version(&[("x", 1)]);

        assert!(any.dominates(&empty));
        assert!(!empty.dominates(&any));
        assert!(!empty.dominates(&empty));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_zero_counters_equal_missing_counters() {
        assert_eq!(version(&[("a", 0)]), VersionSnapshot::empty());
        assert_eq!(version(&[("a", 1), ("b", 0)]), version(&[("a", 1)]));
    }

    #[test]
    fn test_joined_takes_per_node_maximum() {
        let left = version(&[("a", 3), ("b", 1)]);
        let right = version(&[("b", 4), ("c", 2)]);

        let joined = left.joined(&right);

        assert_eq!(joined, version(&[("a", 3), ("b", 4), ("c", 2)]));
        assert!(joined.dominates(&left));
        assert!(joined.dominates(&right));
    }

    // ============================================================
    // WIRE FORMAT TESTS
    // ============================================================

    #[test]
    fn test_version_serializes_as_plain_map() {
        let v = version(&[("node-1", 3)]);
        let json = serde_json::to_value(&v).unwrap();

        assert_eq!(json, serde_json::json!({ "node-1": 3 }));
    }

    #[test]
    fn test_version_deserializes_from_plain_map() {
        let v: VersionSnapshot = serde_json::from_str(r#"{"a": 2, "b": 5}"#).unwrap();

        assert_eq!(v.get(&NodeId::from("a")), 2);
        assert_eq!(v.get(&NodeId::from("b")), 5);
        assert_eq!(v.get(&NodeId::from("c")), 0);
    }
}
