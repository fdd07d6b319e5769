use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::vec::Vec;
use treap_map::treap::{PriorityPool, TreapMap};

const NUM_OF_OPERATIONS: usize = 10_000;

#[test]
fn int_test_treapmap() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut map = TreapMap::with_pool(PriorityPool::with_seed(1));
    let mut expected = Vec::new();
    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.gen::<u32>();
        let val = rng.gen::<u32>();

        map.insert(key, val).unwrap();
        expected.push((key, val));
    }

    expected.reverse();
    expected.sort_by(|l, r| l.0.cmp(&r.0));
    expected.dedup_by_key(|pair| pair.0);

    assert_eq!(map.size(), expected.len());
    assert_eq!(map.check_invariants(), Ok(()));

    assert_eq!(map.min(), Some(expected[0].0));
    assert_eq!(map.max(), Some(expected[expected.len() - 1].0));

    for entry in &expected {
        assert!(map.contains(&entry.0));
        assert_eq!(map.lookup(&entry.0), Some(entry.1));
    }

    for entry in &mut expected {
        let val = rng.gen::<u32>();

        let old_val = map.insert(entry.0, val);
        assert_eq!(old_val, Ok(Some(entry.1)));
        entry.1 = val;
        assert_eq!(map.lookup(&entry.0), Some(val));
    }

    assert_eq!(map.iter().collect::<Vec<(u32, u32)>>(), expected);

    expected.shuffle(&mut rng);

    let mut expected_len = expected.len();
    for entry in expected {
        let old_val = map.remove(&entry.0);
        expected_len -= 1;
        assert_eq!(old_val, Some(entry.1));
        assert_eq!(map.size(), expected_len);
    }
    assert!(map.is_empty());
    assert_eq!(map.pool().live(), 0);
}

#[test]
fn int_test_treapmap_model() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut map = TreapMap::with_pool(PriorityPool::with_seed(2));
    let mut expected = BTreeMap::new();
    for i in 0..NUM_OF_OPERATIONS {
        let key = rng.gen_range(0..1000u32);
        if rng.gen_bool(0.6) {
            let val = rng.gen::<u32>();
            assert_eq!(map.insert(key, val), Ok(expected.insert(key, val)));
        } else {
            assert_eq!(map.remove(&key), expected.remove(&key));
        }
        assert_eq!(map.size(), expected.len());
        if i % 1000 == 0 {
            assert_eq!(map.check_invariants(), Ok(()));
        }
    }
    assert_eq!(
        map.iter().collect::<Vec<(u32, u32)>>(),
        expected.into_iter().collect::<Vec<(u32, u32)>>(),
    );
}

#[test]
fn int_test_treapmap_split_join() {
    let mut rng = StdRng::seed_from_u64(3);
    let pool = PriorityPool::with_seed(3);
    let mut map = TreapMap::with_pool(pool.clone());
    let mut keys = Vec::new();
    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.gen::<u32>();
        map.insert(key, key).unwrap();
        keys.push(key);
    }
    keys.sort();
    keys.dedup();

    for _ in 0..100 {
        let threshold = rng.gen::<u32>();
        let (mut left, right) = map.split(threshold);
        let split_index = keys.partition_point(|key| *key < threshold);

        assert_eq!(left.size(), split_index);
        assert_eq!(right.size(), keys.len() - split_index);
        assert_eq!(left.max(), split_index.checked_sub(1).map(|index| keys[index]));
        assert_eq!(right.min(), keys.get(split_index).cloned());

        left.join(right);
        map = left;
    }

    assert_eq!(map.check_invariants(), Ok(()));
    assert_eq!(map.keys().collect::<Vec<u32>>(), keys);
    assert_eq!(pool.live(), keys.len());
}

#[test]
fn int_test_treapmap_meld_difference() {
    let mut rng = StdRng::seed_from_u64(4);
    let pool = PriorityPool::with_seed(4);
    let mut map = TreapMap::with_pool(pool.clone());
    let mut expected = BTreeMap::new();

    for _ in 0..50 {
        let mut other = TreapMap::with_pool(pool.clone());
        let lo = rng.gen_range(0..10_000u32);
        for _ in 0..rng.gen_range(0..200) {
            let key = rng.gen_range(lo..lo + 1000);
            let val = rng.gen::<u32>();
            other.insert(key, val).unwrap();
            expected.insert(key, val);
        }
        map.meld(other);
        assert_eq!(map.size(), expected.len());
    }
    assert_eq!(map.check_invariants(), Ok(()));
    assert_eq!(
        map.iter().collect::<Vec<(u32, u32)>>(),
        expected.clone().into_iter().collect::<Vec<(u32, u32)>>(),
    );

    let mut removed = TreapMap::with_pool(pool.clone());
    for _ in 0..2000 {
        let key = rng.gen_range(0..11_000u32);
        removed.insert(key, key).unwrap();
        expected.remove(&key);
    }
    map.difference(&removed);
    assert_eq!(map.check_invariants(), Ok(()));
    assert_eq!(
        map.keys().collect::<Vec<u32>>(),
        expected.keys().cloned().collect::<Vec<u32>>(),
    );
}
