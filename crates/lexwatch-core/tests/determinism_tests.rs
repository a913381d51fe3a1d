//! Match results must not depend on worker count, batch boundaries or join
//! strategy. Every run is checked against a brute-force reference matcher.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use lexwatch_core::distance::{edit_distance, hamming_distance};
use lexwatch_core::{DocId, Engine, JoinStrategy, LexwatchConfig, MatchType, QueryId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct QueryPlan {
    id: QueryId,
    words: Vec<String>,
    match_type: MatchType,
    threshold: u32,
}

#[derive(Debug, Clone)]
enum Step {
    Start(QueryPlan),
    End(QueryId),
    Document(DocId, Vec<String>),
}

fn word_matches(query_word: &str, doc_word: &str, match_type: MatchType, threshold: u32) -> bool {
    let threshold = threshold as usize;
    match match_type {
        MatchType::Exact => query_word == doc_word,
        MatchType::Hamming => hamming_distance(query_word.as_bytes(), doc_word.as_bytes())
            .is_some_and(|d| d <= threshold),
        MatchType::Edit => edit_distance(query_word.as_bytes(), doc_word.as_bytes()) <= threshold,
    }
}

/// Replays `steps` without the engine.
fn reference(steps: &[Step]) -> BTreeMap<DocId, Vec<QueryId>> {
    let mut active: BTreeMap<QueryId, QueryPlan> = BTreeMap::new();
    let mut expected = BTreeMap::new();
    for step in steps {
        match step {
            Step::Start(plan) => {
                active.entry(plan.id).or_insert_with(|| plan.clone());
            }
            Step::End(id) => {
                active.remove(id);
            }
            Step::Document(doc_id, words) => {
                let matched = active
                    .values()
                    .filter(|q| {
                        q.words.iter().all(|qw| {
                            words
                                .iter()
                                .any(|dw| word_matches(qw, dw, q.match_type, q.threshold))
                        })
                    })
                    .map(|q| q.id)
                    .collect();
                expected.insert(*doc_id, matched);
            }
        }
    }
    expected
}

/// Replays `steps` through an engine; rejected calls are ignored the same
/// way the reference ignores them.
fn run(
    steps: &[Step],
    workers: usize,
    max_batch: usize,
    strategy: JoinStrategy,
) -> BTreeMap<DocId, Vec<QueryId>> {
    let config = LexwatchConfig::default()
        .with_workers(workers)
        .with_max_batch_documents(max_batch)
        .with_join_strategy(strategy);
    let engine = Engine::new(config).expect("engine");

    let mut documents = 0;
    for step in steps {
        match step {
            Step::Start(plan) => {
                let _ = engine.start_query(
                    plan.id,
                    &plan.words.join(" "),
                    plan.match_type,
                    plan.threshold,
                );
            }
            Step::End(id) => {
                let _ = engine.end_query(*id);
            }
            Step::Document(doc_id, words) => {
                engine
                    .match_document(*doc_id, &words.join(" "))
                    .expect("valid document");
                documents += 1;
            }
        }
    }

    let results = (0..documents)
        .map(|_| {
            let result = engine
                .next_result_timeout(Duration::from_secs(10))
                .expect("engine running")
                .expect("result within timeout");
            (result.doc_id, result.query_ids)
        })
        .collect();
    engine.shutdown().expect("shutdown");
    results
}

fn word() -> impl Strategy<Value = String> {
    "[a-d]{1,5}"
}

fn match_type() -> impl Strategy<Value = MatchType> {
    prop_oneof![
        Just(MatchType::Exact),
        Just(MatchType::Hamming),
        Just(MatchType::Edit),
    ]
}

fn query_plan() -> impl Strategy<Value = QueryPlan> {
    (
        0u32..6,
        prop::collection::vec(word(), 1..=3),
        match_type(),
        0u32..=3,
    )
        .prop_map(|(id, words, match_type, threshold)| QueryPlan {
            id,
            words,
            match_type,
            threshold,
        })
}

/// Interleaved query churn and documents; document ids are unique.
fn script() -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        3 => query_plan().prop_map(Step::Start),
        1 => (0u32..6).prop_map(Step::End),
        6 => prop::collection::vec(word(), 1..6).prop_map(|w| Step::Document(0, w)),
    ];
    prop::collection::vec(step, 1..30).prop_map(|mut steps| {
        let mut next_doc = 0;
        for step in &mut steps {
            if let Step::Document(id, _) = step {
                *id = next_doc;
                next_doc += 1;
            }
        }
        steps
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_engine_matches_reference(
        steps in script(),
        workers in 1usize..=4,
        max_batch in 1usize..=8,
        automaton in any::<bool>(),
    ) {
        let strategy = if automaton { JoinStrategy::Automaton } else { JoinStrategy::Pairwise };
        let actual = run(&steps, workers, max_batch, strategy);
        prop_assert_eq!(actual, reference(&steps));
    }
}

// ========== Fixed Workload ==========

fn fixed_workload() -> Vec<Step> {
    let q = |id, words: &[&str], match_type, threshold| {
        Step::Start(QueryPlan {
            id,
            words: words.iter().map(ToString::to_string).collect(),
            match_type,
            threshold,
        })
    };
    let d = |id, words: &[&str]| Step::Document(id, words.iter().map(ToString::to_string).collect());

    vec![
        q(1, &["data", "base"], MatchType::Edit, 1),
        q(2, &["date"], MatchType::Hamming, 1),
        d(0, &["dats", "vase", "other"]),
        d(1, &["data"]),
        q(3, &["index"], MatchType::Exact, 0),
        d(2, &["index", "date", "bass"]),
        d(3, &["indexes", "dame"]),
        Step::End(1),
        d(4, &["data", "base"]),
        q(1, &["bass"], MatchType::Edit, 2),
        d(5, &["bask", "index"]),
        d(6, &["gate", "bee"]),
    ]
}

#[test]
fn test_fixed_workload_is_batch_independent() {
    let steps = fixed_workload();
    let expected = reference(&steps);

    let mut seen = BTreeSet::new();
    for workers in [1, 2, 5] {
        for max_batch in [1, 3, 1024] {
            for strategy in [JoinStrategy::Pairwise, JoinStrategy::Automaton] {
                let actual = run(&steps, workers, max_batch, strategy);
                assert_eq!(actual, expected, "workers={workers} batch={max_batch} {strategy:?}");
                seen.insert(format!("{actual:?}"));
            }
        }
    }
    assert_eq!(seen.len(), 1);
}

#[test]
fn test_fixed_workload_expected_values() {
    let expected = reference(&fixed_workload());
    assert_eq!(expected[&0], vec![1, 2]);
    assert_eq!(expected[&1], vec![2]);
    assert_eq!(expected[&2], vec![1, 2, 3]);
    assert_eq!(expected[&3], vec![2]);
    assert_eq!(expected[&4], vec![2]);
    assert_eq!(expected[&5], vec![1, 3]);
    assert_eq!(expected[&6], vec![2]);
}
