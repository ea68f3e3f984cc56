use proptest::prelude::*;
use segdeque::{Deque, Global};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Operation {
    PushBack(i16),
    PushFront(i16),
    PopBack,
    PopFront,
    Insert(usize, i16),
    Remove(usize),
    Erase(usize, usize),
    Set(usize, i16),
    Clear,
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => any::<i16>().prop_map(Operation::PushBack),
        4 => any::<i16>().prop_map(Operation::PushFront),
        2 => Just(Operation::PopBack),
        2 => Just(Operation::PopFront),
        2 => (any::<usize>(), any::<i16>()).prop_map(|(i, v)| Operation::Insert(i, v)),
        2 => any::<usize>().prop_map(Operation::Remove),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Operation::Erase(a, b)),
        1 => (any::<usize>(), any::<i16>()).prop_map(|(i, v)| Operation::Set(i, v)),
        1 => Just(Operation::Clear),
    ]
}

fn apply<const BUF: usize>(ops: Vec<Operation>) {
    let mut model = VecDeque::new();
    let mut deque: Deque<i16, Global, BUF> = Deque::new();

    for op in ops {
        match op {
            Operation::PushBack(v) => {
                model.push_back(v);
                deque.push_back(v);
            }
            Operation::PushFront(v) => {
                model.push_front(v);
                deque.push_front(v);
            }
            Operation::PopBack => {
                assert_eq!(deque.pop_back(), model.pop_back(), "pop_back mismatch");
            }
            Operation::PopFront => {
                assert_eq!(deque.pop_front(), model.pop_front(), "pop_front mismatch");
            }
            Operation::Insert(i, v) => {
                let i = i % (model.len() + 1);
                model.insert(i, v);
                deque.insert(i, v);
            }
            Operation::Remove(i) => {
                let i = if model.is_empty() { i } else { i % model.len() };
                assert_eq!(deque.remove(i), model.remove(i), "remove({}) mismatch", i);
            }
            Operation::Erase(a, b) => {
                let a = a % (model.len() + 1);
                let b = b % (model.len() + 1);
                let (first, last) = (a.min(b), a.max(b));
                model.drain(first..last);
                deque.erase(first..last);
            }
            Operation::Set(i, v) => {
                let i = i % (model.len() + 1);
                if let Some(slot) = model.get_mut(i) {
                    *slot = v;
                    deque[i] = v;
                }
            }
            Operation::Clear => {
                model.clear();
                deque.clear();
                assert_eq!(deque.buffer_count(), 1, "clear keeps exactly one buffer");
            }
        }

        assert_eq!(deque.len(), model.len(), "length mismatch");
        assert_eq!(deque.front(), model.front(), "front mismatch");
        assert_eq!(deque.back(), model.back(), "back mismatch");
    }

    // Final consistency check
    assert!(deque.iter().eq(model.iter()), "content mismatch");
    assert!(deque.iter().rev().eq(model.iter().rev()), "reverse content mismatch");
    for (i, v) in model.iter().enumerate() {
        assert_eq!(deque.get(i), Some(v), "index {} mismatch", i);
        assert_eq!((deque.begin() + i as isize).get(), Some(v), "cursor {} mismatch", i);
    }
    assert_eq!(deque.end() - deque.begin(), model.len() as isize);
}

proptest! {
    #[test]
    fn test_deque_matches_std_vec_deque_small_buffers(ops in proptest::collection::vec(operation(), 1..300)) {
        apply::<4>(ops);
    }

    #[test]
    fn test_deque_matches_std_vec_deque_single_slot_buffers(ops in proptest::collection::vec(operation(), 1..150)) {
        apply::<1>(ops);
    }

    #[test]
    fn test_deque_matches_std_vec_deque_default_buffers(ops in proptest::collection::vec(operation(), 1..300)) {
        apply::<0>(ops);
    }

    #[test]
    fn test_cursor_offsets_agree(len in 0usize..200, front in 0usize..50, a in 0isize..250, b in 0isize..250) {
        let mut deque: Deque<usize, Global, 3> = Deque::new();
        for i in (0..front).rev() {
            deque.push_front(i);
        }
        for i in front..front + len {
            deque.push_back(i);
        }
        let total = (front + len) as isize;
        let a = a % (total + 1);
        let b = b % (total + 1);

        let ca = deque.begin() + a;
        let cb = deque.begin() + b;
        prop_assert_eq!(cb - ca, b - a);
        prop_assert_eq!(ca + (b - a), cb);
        prop_assert_eq!(ca < cb, a < b);
        prop_assert_eq!(ca.index(), a);
        if a < total {
            prop_assert_eq!(ca.get(), Some(&(a as usize)));
        } else {
            prop_assert_eq!(ca.get(), None);
        }
    }
}
