use ord_bits::ord::{Iter, OSet};
use rand::{thread_rng, Rng};
use std::collections::BTreeSet;

#[test]
fn test_insert_reports_new_and_duplicate() {
    let mut set = OSet::new();
    {
        let (it, inserted) = set.insert(5);
        assert!(inserted);
        assert_eq!(it.value(), Some(&5));
    }
    assert_eq!(set.len(), 1);
    {
        let (it, inserted) = set.insert(5);
        assert!(!inserted);
        assert_eq!(it.value(), Some(&5));
    }
    assert_eq!(set.len(), 1);
}

#[test]
fn test_should_deduplicate_and_iterate_sorted() {
    let mut set = OSet::new();
    for v in [5, 3, 8, 3, 1] {
        set.insert(v);
    }
    assert_eq!(set.len(), 4);
    let values: Vec<i32> = set.iter().copied().collect();
    assert_eq!(values, vec![1, 3, 5, 8]);

    assert!(set.remove(&3));
    assert_eq!(set.len(), 3);
    let values: Vec<i32> = set.iter().copied().collect();
    assert_eq!(values, vec![1, 5, 8]);

    assert!(!set.remove(&3));
    assert_eq!(set.len(), 3);
}

#[test]
fn test_find_and_erase_through_cursor() {
    let mut set: OSet<i32> = [1, 3, 5, 7].into();
    assert_eq!(set.find(&5).value(), Some(&5));
    assert_eq!(set.find(&4).value(), None);
    assert_eq!(set.find(&4), Iter::default());

    let mut cur = set.find_mut(&3);
    assert_eq!(cur.remove(), Some(3));
    // the cursor moved on to the successor of the removed element
    assert_eq!(cur.value(), Some(&5));
    assert_eq!(cur.remove(), Some(5));
    assert_eq!(cur.value(), Some(&7));
    assert_eq!(cur.remove(), Some(7));
    assert_eq!(cur.value(), None);
    assert_eq!(cur.remove(), None);
    drop(cur);
    assert_eq!(set.len(), 1);
    assert!(set.contains(&1));
    assert!(set.find(&3).value().is_none());
}

#[test]
fn test_bidirectional_iteration() {
    let set: OSet<i32> = [1, 2, 3].into();
    let mut it = set.find(&3);
    it.retreat();
    assert_eq!(it.value(), Some(&2));
    it.retreat();
    assert_eq!(it.value(), Some(&1));
    it.advance();
    assert_eq!(it.value(), Some(&2));
    let before = it.clone();
    it.advance();
    it.advance();
    assert_eq!(it.value(), None);
    assert_eq!(it, Iter::default());
    // the copy taken before stepping still sits on its old position
    assert_eq!(before.value(), Some(&2));
}

#[test]
fn test_retreat_from_first_reaches_end() {
    let set: OSet<i32> = [1, 2].into();
    let mut it = set.find(&1);
    it.retreat();
    assert_eq!(it, Iter::default());
}

#[test]
fn test_range_removal() {
    let mut set: OSet<i32> = (1..10).collect();
    assert_eq!(set.remove_range(&3, &7), 4);
    let values: Vec<i32> = set.iter().copied().collect();
    assert_eq!(values, vec![1, 2, 7, 8, 9]);
    // bounds need not be stored values
    assert_eq!(set.remove_range(&0, &3), 2);
    assert_eq!(set.remove_range(&100, &200), 0);
    let values: Vec<i32> = set.iter().copied().collect();
    assert_eq!(values, vec![7, 8, 9]);
}

#[test]
fn test_equality_and_ordering() {
    let a: OSet<i32> = [1, 2, 3].into();
    let mut b: OSet<i32> = [1, 2, 3].into();
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(a, a.clone());

    b.insert(4);
    assert_ne!(a, b);
    // a proper prefix orders first
    assert!(a < b);
    assert!(b > a);
    assert!(!(b < a));

    // otherwise the first mismatching element decides
    let c: OSet<i32> = [1, 2, 4].into();
    assert!(a < c);
    assert!(c > a);

    let empty = OSet::new();
    assert!(empty < a);
}

#[test]
fn test_round_trip_through_iteration() {
    let a: OSet<i32> = [4, 1, 9, 2].into();
    let b: OSet<i32> = a.iter().copied().collect();
    assert_eq!(a, b);
}

#[test]
fn test_move_leaves_source_empty() {
    let mut a: OSet<i32> = [1, 2, 3].into();
    let b = std::mem::take(&mut a);
    assert!(a.is_empty());
    assert_eq!(a.len(), 0);
    assert_eq!(b, OSet::from([1, 2, 3]));
}

#[test]
fn test_clone_is_independent() {
    let mut a: OSet<i32> = [1, 2, 3].into();
    let mut b = a.clone();
    b.remove(&2);
    b.insert(9);
    assert_eq!(a.len(), 3);
    assert!(a.contains(&2));
    assert!(!a.contains(&9));
    a.clear();
    assert!(a.is_empty());
    assert_eq!(b.len(), 3);
    assert!(b.contains(&9));
}

#[test]
fn test_swap_exchanges_contents() {
    let mut a: OSet<i32> = [1, 2].into();
    let mut b: OSet<i32> = [7, 8, 9].into();
    a.swap(&mut b);
    assert_eq!(a, OSet::from([7, 8, 9]));
    assert_eq!(b, OSet::from([1, 2]));
}

#[test]
fn test_clear_then_reuse() {
    let mut set: OSet<i32> = (0..100).collect();
    assert_eq!(set.len(), 100);
    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.iter().next(), None);
    set.insert(42);
    assert_eq!(set.len(), 1);
}

#[test]
fn test_extend_applies_dedup_per_element() {
    let mut set: OSet<i32> = [1, 2].into();
    set.extend([2, 3, 3, 4]);
    assert_eq!(set.len(), 4);
    let values: Vec<i32> = set.iter().copied().collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
}

#[test]
#[should_panic]
fn test_should_panic_on_incomparable_values() {
    let mut set = OSet::new();
    set.insert(f64::NAN);
    set.insert(1.0);
}

#[test]
fn test_random_ops_match_reference_model() {
    let mut rng = thread_rng();
    let mut set = OSet::new();
    let mut model = BTreeSet::new();
    for round in 0..10_000 {
        let key: u8 = rng.gen();
        if rng.gen_bool(0.6) {
            let (_, inserted) = set.insert(key);
            assert_eq!(inserted, model.insert(key));
        } else {
            assert_eq!(set.remove(&key), model.remove(&key));
        }
        assert_eq!(set.len(), model.len());
        if round % 1_000 == 0 {
            assert!(set.iter().eq(model.iter()));
        }
    }
    assert!(set.iter().eq(model.iter()));
    let values: Vec<u8> = set.iter().copied().collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}
