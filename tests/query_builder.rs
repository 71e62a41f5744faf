//! Query Builder Tests
//!
//! Staged requests: targets, predicates, sort keys, windows and execution.
//! Nothing in this file installs a default context.

mod common;

use common::*;
use recordbind::query::FetchRequest;
use recordbind::sort::SortDirection;
use recordbind::store::{MemoryStore, SharedContext};
use recordbind::{BindError, DatabaseModel};

// =============================================================================
// Target Tests
// =============================================================================

#[test]
fn test_first_returns_single_model() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let top = Player::request()
        .first()
        .filter(Player::score().ge(0.0))
        .sorted_by(Player::score().descending())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(top.map(|p| names(&[p])), Some(vec!["Loulou".to_string()]));
}

#[test]
fn test_first_on_empty_result() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let nobody = Player::request()
        .first()
        .filter(Player::name().eq("Scrooge"))
        .fetch_in(&context)
        .unwrap();
    assert!(nobody.is_none());
}

#[test]
fn test_all_in_insertion_order() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let everyone = Player::request().all().fetch_in(&context).unwrap();
    assert_eq!(names(&everyone), ["Riri", "Fifi", "Loulou", "Donald"]);
}

#[test]
fn test_first_n_and_offsets() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let by_name = || Player::name().ascending();

    let two = Player::request()
        .first_n(2)
        .filter(Player::score().gt(0.0))
        .sorted_by(by_name())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&two), ["Donald", "Fifi"]);

    let next_two = Player::request()
        .first_n_after(2, 2)
        .filter(Player::score().gt(0.0))
        .sorted_by(by_name())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&next_two), ["Loulou", "Riri"]);

    let rest = Player::request()
        .all_after(3)
        .filter(Player::score().gt(0.0))
        .sorted_by(by_name())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&rest), ["Riri"]);
}

// =============================================================================
// Predicate And Sort Tests
// =============================================================================

#[test]
fn test_and_or_chain() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let builder = Player::request()
        .all()
        .filter(Player::name().eq("Riri"))
        .or(Player::name().eq("Fifi"))
        .and(Player::score().gt(15.0));
    assert_eq!(
        builder.compiled_filter().unwrap().render(),
        "(name == \"Riri\" OR name == \"Fifi\") AND score > 15"
    );
    assert_eq!(names(&builder.fetch_in(&context).unwrap()), ["Riri"]);
}

#[test]
fn test_secondary_sort() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let players = Player::request()
        .all()
        .filter(Player::score().ge(0.0))
        .sorted_by(Player::score().descending())
        .then(Player::name().ascending())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&players), ["Loulou", "Donald", "Riri", "Fifi"]);
}

#[test]
fn test_custom_comparator() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    // Shortest name first
    let players = Player::request()
        .all()
        .filter(Player::score().ge(0.0))
        .sorted_by(Player::name().ascending_by(|a: &String, b: &String| a.len().cmp(&b.len())))
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&players), ["Riri", "Fifi", "Loulou", "Donald"]);
}

#[test]
fn test_absent_values_in_store_sort() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();
    let fifi = Player::find_first_in(&context, Player::name().eq("Fifi"))
        .unwrap()
        .unwrap();
    fifi.assign(&Player::nickname(), Some("Fi".to_string())).unwrap();

    let ascending = Player::request()
        .all()
        .filter(Player::score().ge(0.0))
        .sorted_by(Player::nickname().ascending())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&ascending)[0], "Fifi");

    let descending = Player::request()
        .all()
        .filter(Player::score().ge(0.0))
        .sorted_by(Player::nickname().descending())
        .fetch_in(&context)
        .unwrap();
    assert_eq!(names(&descending)[3], "Fifi");
}

// =============================================================================
// Request Snapshot Tests
// =============================================================================

#[test]
fn test_request_snapshot() {
    let builder = Player::request()
        .first_n_after(5, 10)
        .filter(Player::name().has_prefix("D"))
        .sorted_by(Player::score().descending());

    let request: &FetchRequest = builder.request();
    assert_eq!(request.entity, "PlayerEntity");
    assert_eq!(request.limit, Some(5));
    assert_eq!(request.offset, 10);
    assert_eq!(request.sort_keys.len(), 1);
    assert_eq!(request.sort_keys[0].attribute, "score");
    assert_eq!(request.sort_keys[0].direction, SortDirection::Desc);
    assert_eq!(
        builder.compiled_filter().unwrap().render(),
        "name BEGINSWITH \"D\""
    );
}

// =============================================================================
// Context Tests
// =============================================================================

#[test]
fn test_fetch_without_context_is_configuration_error() {
    let result = Player::request().all().fetch();
    assert_eq!(result.unwrap_err(), BindError::ConfigurationMissing);

    let result = Player::find_first(Player::name().eq("Donald"));
    assert_eq!(result.unwrap_err(), BindError::ConfigurationMissing);

    assert_eq!(Player::create().unwrap_err(), BindError::ConfigurationMissing);
}

#[test]
fn test_contexts_are_isolated() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();
    let other: SharedContext = MemoryStore::new();

    assert_eq!(Player::request().all().fetch_in(&other).unwrap().len(), 0);
    assert_eq!(Player::request().all().fetch_in(&context).unwrap().len(), 4);
}

#[test]
fn test_invalid_pattern_is_store_error() {
    use recordbind::predicate::Pattern;

    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();

    let err = Player::request()
        .all()
        .filter(Player::name().matches(Pattern::new("(")))
        .fetch_in(&context)
        .unwrap_err();
    assert!(matches!(err, BindError::Store(_)));
}
