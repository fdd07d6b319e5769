use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Lookup(u16),
    SplitJoin(u16),
    Meld(Vec<(u16, u32)>),
    Difference(Vec<u16>),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u16..256;
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        20 => key.clone().prop_map(Op::Remove),
        20 => key.clone().prop_map(Op::Lookup),
        8 => key.clone().prop_map(Op::SplitJoin),
        6 => prop::collection::vec((key.clone(), any::<u32>()), 0..=32).prop_map(Op::Meld),
        6 => prop::collection::vec(key.clone(), 0..=32).prop_map(Op::Difference),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(seed in any::<u64>(), ops in ops_strategy()) {
        let pool = PriorityPool::with_seed(seed);
        let mut t: TreapMap<u16, u32> = TreapMap::with_pool(pool.clone());
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert(key, value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, Ok(old_m));
                }
                Op::Remove(key) => {
                    let old_t = t.remove(&key);
                    let old_m = m.remove(&key);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Lookup(key) => {
                    prop_assert_eq!(t.lookup(&key), m.get(&key).copied());
                    prop_assert_eq!(t.contains(&key), m.contains_key(&key));
                }
                Op::SplitJoin(threshold) => {
                    let (mut left, right) = t.split(threshold);
                    prop_assert!(left.keys().all(|key| key < threshold));
                    prop_assert!(right.keys().all(|key| key >= threshold));
                    prop_assert_eq!(left.check_invariants(), Ok(()));
                    prop_assert_eq!(right.check_invariants(), Ok(()));
                    left.join(right);
                    t = left;
                }
                Op::Meld(entries) => {
                    let mut other = TreapMap::with_pool(pool.clone());
                    for (key, value) in entries {
                        other.insert(key, value).unwrap();
                        m.insert(key, value);
                    }
                    t.meld(other);
                }
                Op::Difference(keys) => {
                    let mut other = TreapMap::with_pool(pool.clone());
                    for key in keys {
                        other.insert(key, 0).unwrap();
                        m.remove(&key);
                    }
                    t.difference(&other);
                }
            }

            prop_assert_eq!(t.check_invariants(), Ok(()));
            prop_assert_eq!(t.size(), m.len());
        }

        let got: Vec<(u16, u32)> = t.iter().collect();
        let expected: Vec<(u16, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(pool.live(), t.size());
    }
}

fn small_entries() -> impl Strategy<Value = Vec<(u8, u32)>> {
    prop::collection::vec((0u8..16, any::<u32>()), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2048,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_meld_small(
        seed in any::<u64>(),
        left in small_entries(),
        right in small_entries(),
        is_reversed in any::<bool>()
    ) {
        let (left, right) = if is_reversed { (right, left) } else { (left, right) };
        let pool = PriorityPool::with_seed(seed);
        let mut t: TreapMap<u8, u32> = TreapMap::with_pool(pool.clone());
        let mut other = TreapMap::with_pool(pool.clone());
        let mut m = BTreeMap::new();

        for (key, value) in left {
            t.insert(key, value).unwrap();
            m.insert(key, value);
        }
        for (key, value) in right {
            other.insert(key, value).unwrap();
            m.insert(key, value);
        }
        t.meld(other);

        prop_assert_eq!(t.check_invariants(), Ok(()));
        prop_assert_eq!(t.size(), m.len());
        let got: Vec<(u8, u32)> = t.iter().collect();
        let expected: Vec<(u8, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(pool.live(), t.size());
    }
}
