//! End-to-end scenarios through the public entry points.

use std::collections::BTreeMap;
use std::time::Duration;

use lexwatch_core::{
    DocId, DocResult, Engine, Error, JoinStrategy, LexwatchConfig, MatchType, Phase, QueryId,
};

const WAIT: Duration = Duration::from_secs(10);

fn engine(workers: usize) -> Engine {
    Engine::new(LexwatchConfig::default().with_workers(workers)).expect("engine")
}

fn next(engine: &Engine) -> DocResult {
    engine
        .next_result_timeout(WAIT)
        .expect("engine running")
        .expect("result within timeout")
}

fn collect(engine: &Engine, count: usize) -> BTreeMap<DocId, Vec<QueryId>> {
    (0..count)
        .map(|_| {
            let result = next(engine);
            (result.doc_id, result.query_ids)
        })
        .collect()
}

// ========== Reference Scenarios ==========

#[test]
fn test_exact_scenario() {
    let engine = engine(2);
    engine
        .start_query(1, "cat", MatchType::Exact, 0)
        .expect("start");
    engine.match_document(10, "the cat sat").expect("match");

    let result = next(&engine);
    assert_eq!(result.doc_id, 10);
    assert!(result.query_ids.contains(&1));
}

#[test]
fn test_hamming_scenario() {
    let engine = engine(2);
    engine
        .start_query(2, "kat", MatchType::Hamming, 1)
        .expect("start");
    engine.match_document(11, "a kit ran").expect("match");

    let result = next(&engine);
    assert_eq!(result.doc_id, 11);
    assert!(result.query_ids.contains(&2));
}

#[test]
fn test_edit_scenario_with_end_query() {
    let engine = engine(2);
    engine
        .start_query(3, "hello", MatchType::Edit, 2)
        .expect("start");
    engine.match_document(12, "helo world").expect("match");
    engine.end_query(3).expect("end");
    engine.match_document(13, "helo again").expect("match");

    let results = collect(&engine, 2);
    assert!(results[&12].contains(&3));
    assert!(!results[&13].contains(&3));
}

#[test]
fn test_all_scenarios_in_one_engine() {
    let engine = engine(4);
    engine
        .start_query(1, "cat", MatchType::Exact, 0)
        .expect("q1");
    engine
        .start_query(2, "kat", MatchType::Hamming, 1)
        .expect("q2");
    engine
        .start_query(3, "hello", MatchType::Edit, 2)
        .expect("q3");

    engine.match_document(10, "the cat sat").expect("d10");
    engine.match_document(11, "a kit ran").expect("d11");
    engine.match_document(12, "helo world").expect("d12");

    let results = collect(&engine, 3);
    assert_eq!(results[&10], vec![1, 2]);
    assert_eq!(results[&11], vec![2]);
    assert_eq!(results[&12], vec![3]);
}

#[test]
fn test_threshold_boundary() {
    let engine = engine(2);
    engine
        .start_query(1, "abcd", MatchType::Hamming, 2)
        .expect("start");
    engine.match_document(1, "abxy").expect("at threshold");
    engine.match_document(2, "axyz").expect("above threshold");

    let results = collect(&engine, 2);
    assert_eq!(results[&1], vec![1]);
    assert!(results[&2].is_empty());
}

#[test]
fn test_exact_ignores_order_and_repetition() {
    let engine = engine(2);
    engine
        .start_query(1, "alpha beta", MatchType::Exact, 0)
        .expect("start");
    engine
        .match_document(1, "beta beta gamma alpha")
        .expect("match");
    engine.match_document(2, "alpha gamma").expect("match");

    let results = collect(&engine, 2);
    assert_eq!(results[&1], vec![1]);
    assert!(results[&2].is_empty());
}

#[test]
fn test_automaton_strategy_end_to_end() {
    let config = LexwatchConfig::default()
        .with_workers(3)
        .with_join_strategy(JoinStrategy::Automaton);
    let engine = Engine::new(config).expect("engine");
    engine
        .start_query(1, "kitten", MatchType::Edit, 3)
        .expect("start");
    engine.match_document(1, "sitting down").expect("match");
    engine.match_document(2, "sat down").expect("match");

    let results = collect(&engine, 2);
    assert_eq!(results[&1], vec![1]);
    assert!(results[&2].is_empty());
}

// ========== Error Handling ==========

#[test]
fn test_query_errors() {
    let engine = engine(1);
    assert!(matches!(
        engine.start_query(1, "one two three four five six", MatchType::Exact, 0),
        Err(Error::TooManyWords { count: 6, .. })
    ));
    assert!(matches!(
        engine.start_query(2, "word", MatchType::Edit, 4),
        Err(Error::InvalidThreshold { .. })
    ));
    assert!(matches!(
        engine.start_query(3, "Word", MatchType::Edit, 1),
        Err(Error::InvalidWord { .. })
    ));
    assert_eq!(engine.end_query(99), Err(Error::QueryNotFound(99)));

    engine
        .start_query(4, "fine", MatchType::Exact, 0)
        .expect("start");
    assert_eq!(
        engine.start_query(4, "again", MatchType::Exact, 0),
        Err(Error::QueryExists(4))
    );
}

#[test]
fn test_rejected_document_produces_no_result() {
    let engine = engine(1);
    let long_word = "a".repeat(32);
    assert!(matches!(
        engine.match_document(1, &long_word),
        Err(Error::InvalidWord { .. })
    ));
    engine.match_document(2, "valid words").expect("match");

    assert_eq!(next(&engine).doc_id, 2);
    assert_eq!(engine.try_next_result(), Ok(None));
}

#[test]
fn test_shutdown_semantics() {
    let engine = engine(2);
    engine
        .start_query(1, "tail", MatchType::Exact, 0)
        .expect("start");
    for id in 0..10 {
        engine.match_document(id, "tail end").expect("match");
    }

    engine.shutdown().expect("shutdown");
    engine.shutdown().expect("idempotent");
    assert!(engine.is_shut_down());
    assert_eq!(engine.phase(), Phase::Finished);

    // Pending documents were matched before the workers exited.
    let results = collect(&engine, 10);
    assert!(results.values().all(|ids| ids == &vec![1]));

    assert_eq!(engine.next_result(), Err(Error::NoResults));
    assert_eq!(engine.try_next_result(), Err(Error::NoResults));
    assert_eq!(engine.match_document(11, "late"), Err(Error::ShutDown));
    assert_eq!(
        engine.start_query(2, "late", MatchType::Exact, 0),
        Err(Error::ShutDown)
    );
    assert_eq!(engine.end_query(1), Err(Error::ShutDown));
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = LexwatchConfig::default();
    config.interner.shards = 3;
    assert!(matches!(Engine::new(config), Err(Error::Config(_))));
}

#[test]
fn test_stats_after_batches() {
    let engine = engine(2);
    engine
        .start_query(1, "word", MatchType::Edit, 1)
        .expect("start");
    for id in 0..4 {
        engine.match_document(id, "ward wort").expect("match");
    }
    collect(&engine, 4);

    let stats = engine.stats();
    assert_eq!(stats.documents_submitted, 4);
    assert_eq!(stats.documents_matched, 4);
    assert_eq!(stats.active_queries, 1);
    assert_eq!(stats.edit_query_words, 1);
    assert_eq!(stats.document_words, 2);
    assert!(stats.batches >= 1);
    assert!(stats.pairs_compared >= 2);
}
