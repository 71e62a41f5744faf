//! Field Binding Tests
//!
//! - Conversion round trips for every binding strategy
//! - Validation order and short-circuit
//! - Uniqueness against other records of the same entity
//! - Failed writes leave the record untouched
//! - Relationships and save semantics
//! - Selectors are checked against the registration table when bound
//! - Field reads over collections of models

mod common;

use common::*;
use recordbind::field::{ChildrenBinding, FieldBinding, ParentBinding};
use recordbind::schema::Attribute;
use recordbind::store::{RecordHandle, StorageValue, StoreContext, StoreError};
use recordbind::{BindError, DatabaseModel, ModelCollection};

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_identity_round_trip() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    player.set(&Player::score(), 42.5).unwrap();
    assert_eq!(player.current(&Player::score()).unwrap(), 42.5);
}

#[test]
fn test_unwrapped_round_trip_and_default() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    assert_eq!(player.current(&Player::display_name()).unwrap(), "Rookie");
    player.set(&Player::display_name(), "Duck".to_string()).unwrap();
    assert_eq!(player.current(&Player::display_name()).unwrap(), "Duck");
    assert_eq!(player.current(&Player::nickname()).unwrap(), Some("Duck".to_string()));
}

#[test]
fn test_narrowing_round_trip_both_policies() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    for value in [i64::from(i16::MIN), -1, 0, 7, i64::from(i16::MAX)] {
        player.set(&Player::level(), value).unwrap();
        assert_eq!(player.current(&Player::level()).unwrap(), value);

        player.set(&Player::clamped_level(), value).unwrap();
        assert_eq!(player.current(&Player::clamped_level()).unwrap(), value);
    }
}

#[test]
fn test_narrowing_overflow() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();
    player.set(&Player::level(), 12).unwrap();

    let err = player.set(&Player::level(), 40_000).unwrap_err();
    assert!(matches!(err, BindError::StoreConversion { .. }));
    assert_eq!(player.record().read("level"), StorageValue::Int16(12));

    player.set(&Player::clamped_level(), 40_000).unwrap();
    assert_eq!(player.current(&Player::level()).unwrap(), i64::from(i16::MAX));
    player.set(&Player::clamped_level(), -40_000).unwrap();
    assert_eq!(player.current(&Player::level()).unwrap(), i64::from(i16::MIN));
}

#[test]
fn test_codec_round_trip() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    assert_eq!(player.current(&Player::stats()).unwrap(), None);
    let stats = Stats { goals: 3, assists: 5 };
    player.set(&Player::stats(), Some(stats.clone())).unwrap();
    assert_eq!(player.current(&Player::stats()).unwrap(), Some(stats));

    player.set(&Player::stats(), None).unwrap();
    assert_eq!(player.record().read("stats"), StorageValue::Null);
}

#[test]
fn test_codec_decode_failure() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    player
        .record()
        .write("stats", StorageValue::Binary(b"not json".to_vec()));
    let err = player.current(&Player::stats()).unwrap_err();
    assert_eq!(err.code(), "BIND_OUTPUT_CONVERSION");
}

#[test]
fn test_raw_round_trip() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    for role in [Role::Forward, Role::Defender, Role::Keeper] {
        player.set(&Player::role(), role).unwrap();
        assert_eq!(player.current(&Player::role()).unwrap(), role);
    }
    assert_eq!(
        player.record().read("role"),
        StorageValue::String("keeper".to_string())
    );

    player
        .record()
        .write("role", StorageValue::String("coach".to_string()));
    let err = player.current(&Player::role()).unwrap_err();
    assert_eq!(
        err,
        BindError::output_conversion("role", "unknown role 'coach'")
    );
}

#[test]
fn test_kind_mismatch_is_output_conversion() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    player.record().write("score", StorageValue::String("high".into()));
    let err = player.current(&Player::score()).unwrap_err();
    assert_eq!(
        err,
        BindError::output_conversion("score", "expected double, found string")
    );
}

// =============================================================================
// Selector Resolution Tests
// =============================================================================

#[test]
#[should_panic(expected = "unresolvable attribute selector")]
fn test_misspelled_selector_panics_before_any_read() {
    // A default would otherwise hide the missing attribute on every read
    let _ = FieldBinding::<PlayerEntity, String, String>::new(Attribute::new("nmae"))
        .with_default("fallback".to_string());
}

#[test]
#[should_panic(expected = "unresolvable attribute selector")]
fn test_optionality_mismatch_panics() {
    let _ = FieldBinding::<PlayerEntity, String, String>::new(Attribute::new("nickname"));
}

#[test]
#[should_panic(expected = "unresolvable attribute selector")]
fn test_unregistered_parent_relationship_panics() {
    let _ = ParentBinding::<PlayerEntity, Team>::new(Attribute::new("squad"));
}

#[test]
#[should_panic(expected = "unresolvable attribute selector")]
fn test_parent_relationship_on_plain_attribute_panics() {
    let _ = ParentBinding::<PlayerEntity, Team>::new(Attribute::new("name"));
}

#[test]
#[should_panic(expected = "unresolvable attribute selector")]
fn test_unregistered_children_relationship_panics() {
    let _ = ChildrenBinding::<TeamEntity, Player>::new(Attribute::new("members"));
}

#[test]
fn test_bindings_expose_checked_name() {
    assert_eq!(Player::display_name().name(), "nickname");
    assert_eq!(Team::player_ids().name(), "players");
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validation_rejects_and_leaves_record_untouched() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    let err = player.set(&Player::score(), 120.0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Data validation error. Value 120 is not within 0..=100"
    );
    assert_eq!(player.current(&Player::score()).unwrap(), 20.0);
}

#[test]
fn test_validation_short_circuits() {
    use recordbind::convert::Rule;
    use recordbind::field::FieldBinding;
    use recordbind::schema::Attribute;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let later_runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later_runs);
    let binding: FieldBinding<PlayerEntity, String, String> =
        FieldBinding::new(Attribute::new("name"))
            .validated_by(Rule::has_prefix("D"))
            .validated_by(Rule::new(move |_: &String| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));

    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    assert!(player.validate(&binding, &"Riri".to_string()).is_err());
    assert_eq!(later_runs.load(Ordering::SeqCst), 0);

    player.validate(&binding, &"Daisy".to_string()).unwrap();
    assert_eq!(later_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_optional_rules_accept_none() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    player.set(&Player::email(), None).unwrap();
    player
        .set(&Player::email(), Some("donald@duck.com".to_string()))
        .unwrap();
    let err = player
        .set(&Player::email(), Some("donald@duck".to_string()))
        .unwrap_err();
    assert_eq!(
        err,
        BindError::validation("donald@duck is not a valid email")
    );
}

#[test]
fn test_toggle() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    assert!(!player.current(&Player::active()).unwrap());
    player.toggle(&Player::active()).unwrap();
    assert!(player.current(&Player::active()).unwrap());
    player.toggle(&Player::active()).unwrap();
    assert!(!player.current(&Player::active()).unwrap());
}

// =============================================================================
// Uniqueness Tests
// =============================================================================

#[test]
fn test_uniqueness() {
    let (_store, context) = fresh_store();
    saved_player(&context, "A", 1.0).unwrap();
    let other = saved_player(&context, "C", 1.0).unwrap();

    let err = other.set(&Player::name(), "A".to_string()).unwrap_err();
    assert_eq!(
        err,
        BindError::UniqueConstraintViolated {
            field: "name".to_string(),
            value: "A".to_string(),
            model: "Player".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "A Player with the value A for the field name already exists."
    );

    other.set(&Player::name(), "B".to_string()).unwrap();
    // Its own current value is not a conflict
    other.set(&Player::name(), "B".to_string()).unwrap();
}

#[test]
fn test_uniqueness_sees_unsaved_records() {
    let (_store, context) = fresh_store();
    new_player(&context, "A", 1.0).unwrap();

    let err = new_player(&context, "A", 2.0).unwrap_err();
    assert!(err.is_validation());
}

// =============================================================================
// Save And Remove
// =============================================================================

#[test]
fn test_assign_saves() {
    let (store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();
    assert!(store.has_changes());

    player.assign(&Player::score(), 30.0).unwrap();
    assert!(!store.has_changes());
}

#[test]
fn test_save_failure_is_wrapped() {
    let (_store, context) = fresh_store();
    let player = Player::create_in(&context).unwrap();
    player.set(&Player::name(), "Incomplete".to_string()).unwrap();

    let err = player.save().unwrap_err();
    match err {
        BindError::SaveFailure(reason) => assert!(reason.contains("active"), "{}", reason),
        other => panic!("expected SaveFailure, got {:?}", other),
    }
}

#[test]
fn test_assign_validation_error_is_not_save_failure() {
    let (_store, context) = fresh_store();
    let player = new_player(&context, "Donald", 20.0).unwrap();

    let err = player.assign(&Player::score(), -1.0).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_remove() {
    let (store, context) = fresh_store();
    let player = saved_player(&context, "Donald", 20.0).unwrap();

    player.remove().unwrap();
    player.save().unwrap();
    assert_eq!(store.count("PlayerEntity"), 0);
}

#[test]
fn test_remove_detached_record() {
    let player = Player::from_record(RecordHandle::detached("PlayerEntity"));
    assert_eq!(
        player.remove().unwrap_err(),
        BindError::Store(StoreError::Detached)
    );

    let orphan = {
        let (_store, context) = fresh_store();
        saved_player(&context, "Donald", 20.0).unwrap()
    };
    assert_eq!(
        orphan.remove().unwrap_err(),
        BindError::Store(StoreError::Detached)
    );
}

// =============================================================================
// Relationship Tests
// =============================================================================

#[test]
fn test_parent_relationship() {
    let (_store, context) = fresh_store();
    let team = saved_team(&context, "Ducks").unwrap();
    let player = saved_player(&context, "Donald", 20.0).unwrap();

    assert_eq!(player.parent(&Player::team()).unwrap(), None);
    player.set_parent(&Player::team(), Some(&team)).unwrap();
    assert_eq!(player.parent(&Player::team()).unwrap(), Some(team.clone()));
    assert_eq!(
        Player::team()
            .value_of(player.record(), &Team::name())
            .unwrap(),
        Some("Ducks".to_string())
    );

    player.set_parent(&Player::team(), None).unwrap();
    assert_eq!(player.parent(&Player::team()).unwrap(), None);
    player.save().unwrap();
}

#[test]
fn test_children_relationship() {
    let (_store, context) = fresh_store();
    let team = saved_team(&context, "Ducks").unwrap();
    let riri = saved_player(&context, "Riri", 20.0).unwrap();
    let fifi = saved_player(&context, "Fifi", 10.0).unwrap();
    let loulou = saved_player(&context, "Loulou", 40.0).unwrap();

    team.add_child(&Team::players(), &riri).unwrap();
    team.add_child(&Team::players(), &fifi).unwrap();
    // Adding twice keeps one entry in place
    team.add_child(&Team::players(), &riri).unwrap();
    assert_eq!(names(&team.children(&Team::players()).unwrap()), ["Riri", "Fifi"]);

    Team::players().insert(&loulou, 0, team.record()).unwrap();
    assert_eq!(
        names(&team.children(&Team::players()).unwrap()),
        ["Loulou", "Riri", "Fifi"]
    );

    team.remove_child(&Team::players(), &riri).unwrap();
    assert_eq!(names(&team.children(&Team::players()).unwrap()), ["Loulou", "Fifi"]);

    Team::players().remove_at(0, team.record()).unwrap();
    assert_eq!(names(&team.children(&Team::players()).unwrap()), ["Fifi"]);
    assert!(Team::players().remove_at(5, team.record()).is_err());

    team.save().unwrap();
}

#[test]
fn test_dangling_child_reference() {
    let (store, context) = fresh_store();
    let team = saved_team(&context, "Ducks").unwrap();
    let riri = saved_player(&context, "Riri", 20.0).unwrap();
    team.add_child(&Team::players(), &riri).unwrap();

    store.delete(riri.record()).unwrap();
    let err = team.children(&Team::players()).unwrap_err();
    assert_eq!(err.code(), "BIND_STORE_FAILED");
}

// =============================================================================
// Collection Tests
// =============================================================================

#[test]
fn test_map_current() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();
    let players = Player::request().all().fetch_in(&context).unwrap();

    assert_eq!(
        players.map_current(&Player::score()).unwrap(),
        vec![20.0, 10.0, 40.0, 20.0]
    );
    assert_eq!(
        players[..2].map_current(&Player::display_name()).unwrap(),
        ["Rookie", "Rookie"]
    );
    let nobody: &[Player] = &[];
    assert!(nobody.map_current(&Player::score()).unwrap().is_empty());
}

#[test]
fn test_map_current_propagates_conversion_error() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();
    let players = Player::request().all().fetch_in(&context).unwrap();
    players[2]
        .record()
        .write("role", StorageValue::String("goalie".to_string()));

    let err = players.map_current(&Player::role()).unwrap_err();
    assert_eq!(err.code(), "BIND_OUTPUT_CONVERSION");
}

#[test]
fn test_compact_map_current_skips_missing_values() {
    let (_store, context) = fresh_store();
    seed_ducks(&context).unwrap();
    let players = Player::request().all().fetch_in(&context).unwrap();
    players[1]
        .set(&Player::nickname(), Some("Fi".to_string()))
        .unwrap();
    players[3]
        .set(&Player::nickname(), Some("Don".to_string()))
        .unwrap();

    assert_eq!(
        players.compact_map_current(&Player::nickname()).unwrap(),
        ["Fi", "Don"]
    );
}

#[test]
fn test_flat_map_current_concatenates_in_order() {
    let (_store, context) = fresh_store();
    let nephews = saved_team(&context, "Nephews").unwrap();
    let uncles = saved_team(&context, "Uncles").unwrap();
    let mut expected = Vec::new();
    for (team, name) in [(&nephews, "Riri"), (&nephews, "Fifi"), (&uncles, "Donald")] {
        let player = saved_player(&context, name, 10.0).unwrap();
        team.add_child(&Team::players(), &player).unwrap();
        expected.push(player.id());
    }
    let empty = saved_team(&context, "Cousins").unwrap();

    let teams = vec![nephews, empty, uncles];
    assert_eq!(teams.flat_map_current(&Team::player_ids()).unwrap(), expected);
}
