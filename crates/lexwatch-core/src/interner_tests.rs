//! Tests for `interner` module - Sharded open-addressed interning table.

use super::config::InternerConfig;
use super::interner::*;
use super::text::WordText;
use rustc_hash::FxHashSet;

fn word(s: &str) -> WordText {
    WordText::new(s).expect("valid word")
}

fn small_config(shards: usize) -> InternerConfig {
    InternerConfig {
        shards,
        initial_capacity: 2,
        max_load_percent: 70,
    }
}

#[test]
fn test_interner_insert_is_idempotent() {
    let interner = Interner::default();

    let (first, created) = interner.insert(&word("cat")).expect("insert");
    assert!(created);

    let (second, created_again) = interner.insert(&word("cat")).expect("insert");
    assert!(!created_again);
    assert_eq!(first, second);
    assert_eq!(interner.len(), 1);
}

#[test]
fn test_interner_distinct_texts_distinct_ids() {
    let interner = Interner::default();
    let a = interner.insert(&word("cat")).expect("insert").0;
    let b = interner.insert(&word("act")).expect("insert").0;
    assert_ne!(a, b);
}

#[test]
fn test_interner_get_and_resolve() {
    let interner = Interner::default();
    assert!(interner.is_empty());
    assert_eq!(interner.get(&word("dog")), None);

    let (id, _) = interner.insert(&word("dog")).expect("insert");

    assert_eq!(interner.get(&word("dog")), Some(id));
    assert_eq!(interner.resolve(id), Some(word("dog")));
    assert_eq!(interner.resolve(WordId::from_raw(u32::MAX)), None);
}

#[test]
fn test_interner_grows_past_initial_capacity() {
    // Single shard with two slots must keep accepting words.
    let interner = Interner::new(&small_config(1));
    let mut ids = FxHashSet::default();

    for i in 0..2_000u32 {
        let text = base26(i);
        let (id, created) = interner.insert(&word(&text)).expect("insert");
        assert!(created, "{text} interned twice");
        assert!(ids.insert(id));
    }

    assert_eq!(interner.len(), 2_000);
    for i in 0..2_000u32 {
        let text = base26(i);
        let id = interner.get(&word(&text)).expect("present");
        assert_eq!(interner.resolve(id).expect("resolves").as_str(), text);
    }
}

#[test]
fn test_interner_shard_count_rounds_to_power_of_two() {
    let interner = Interner::new(&small_config(5));
    assert_eq!(interner.shard_count(), 8);
}

#[test]
fn test_interner_concurrent_inserts_agree() {
    use std::sync::Arc;
    use std::thread;

    let interner = Arc::new(Interner::new(&small_config(4)));
    let mut handles = vec![];

    // Every thread interns the same 500 words.
    for _ in 0..8 {
        let interner = Arc::clone(&interner);
        handles.push(thread::spawn(move || {
            (0..500u32)
                .map(|i| {
                    let (id, created) = interner.insert(&word(&base26(i))).expect("insert");
                    (id, created)
                })
                .collect::<Vec<_>>()
        }));
    }

    let results: Vec<Vec<(WordId, bool)>> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    for i in 0..500 {
        let ids: FxHashSet<WordId> = results.iter().map(|r| r[i].0).collect();
        assert_eq!(ids.len(), 1, "word {i} got several ids");
        let creators = results.iter().filter(|r| r[i].1).count();
        assert_eq!(creators, 1, "word {i} created {creators} times");
    }
    assert_eq!(interner.len(), 500);
}

/// Spells `n` with letters only so every value is a valid word.
fn base26(mut n: u32) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    String::from_utf8(out).expect("ascii")
}

mod proptest_tests {
    use crate::interner::Interner;
    use crate::text::WordText;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: ids agree exactly when texts agree.
        #[test]
        fn prop_ids_track_text_equality(
            words in proptest::collection::vec("[a-z]{1,8}", 1..60)
        ) {
            let interner = Interner::default();
            let ids: Vec<_> = words
                .iter()
                .map(|w| interner.insert(&WordText::new(w).expect("valid")).expect("insert").0)
                .collect();

            for (i, a) in words.iter().enumerate() {
                for (j, b) in words.iter().enumerate() {
                    prop_assert_eq!(a == b, ids[i] == ids[j]);
                }
            }
        }
    }
}
