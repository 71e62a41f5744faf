//! Shared fixture: players and teams over a `MemoryStore`

#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, OnceLock};

use recordbind::convert::{JsonCodec, Overflow, Rule};
use recordbind::field::{ChildrenBinding, FieldBinding, ParentBinding};
use recordbind::schema::{Attribute, AttributeKind, Entity, EntitySchema};
use recordbind::store::{MemoryStore, RecordHandle, RecordId, SharedContext};
use recordbind::{BindResult, DatabaseModel};
use serde::{Deserialize, Serialize};

// =============================================================================
// Entities
// =============================================================================

pub struct PlayerEntity;

impl Entity for PlayerEntity {
    const NAME: &'static str = "PlayerEntity";

    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new(Self::NAME)
                .attribute("name", AttributeKind::String)
                .optional("nickname", AttributeKind::String)
                .attribute("score", AttributeKind::Double)
                .attribute("level", AttributeKind::Integer16)
                .attribute("active", AttributeKind::Boolean)
                .attribute("role", AttributeKind::String)
                .optional("email", AttributeKind::String)
                .optional("stats", AttributeKind::Binary)
                .to_one("team")
        })
    }
}

pub struct TeamEntity;

impl Entity for TeamEntity {
    const NAME: &'static str = "TeamEntity";

    fn schema() -> &'static EntitySchema {
        static SCHEMA: OnceLock<EntitySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            EntitySchema::new(Self::NAME)
                .attribute("name", AttributeKind::String)
                .to_many("players")
        })
    }
}

// =============================================================================
// Domain values
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Forward,
    Defender,
    Keeper,
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, String> {
        match raw.as_str() {
            "forward" => Ok(Role::Forward),
            "defender" => Ok(Role::Defender),
            "keeper" => Ok(Role::Keeper),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> String {
        match role {
            Role::Forward => "forward",
            Role::Defender => "defender",
            Role::Keeper => "keeper",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub goals: u32,
    pub assists: u32,
}

// =============================================================================
// Models
// =============================================================================

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Player(RecordHandle);

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.current(&Player::name()).unwrap_or_default();
        f.debug_tuple("Player").field(&name).finish()
    }
}

impl DatabaseModel for Player {
    type Entity = PlayerEntity;

    fn from_record(record: RecordHandle) -> Self {
        Player(record)
    }

    fn record(&self) -> &RecordHandle {
        &self.0
    }
}

impl Player {
    pub fn name() -> FieldBinding<PlayerEntity, String, String> {
        FieldBinding::new(Attribute::new("name"))
            .validated_by(Rule::not_empty())
            .unique()
    }

    pub fn nickname() -> FieldBinding<PlayerEntity, Option<String>, Option<String>> {
        FieldBinding::new(Attribute::new("nickname")).validated_when_present(Rule::not_empty())
    }

    /// Nickname read as a plain string, "Rookie" when unset
    pub fn display_name() -> FieldBinding<PlayerEntity, Option<String>, String> {
        FieldBinding::unwrapped(Attribute::new("nickname")).with_default("Rookie".to_string())
    }

    pub fn score() -> FieldBinding<PlayerEntity, f64, f64> {
        FieldBinding::new(Attribute::new("score")).validated_by(Rule::is_in(0.0..=100.0))
    }

    pub fn level() -> FieldBinding<PlayerEntity, i16, i64> {
        FieldBinding::narrowing(Attribute::new("level"), Overflow::Reject)
    }

    pub fn clamped_level() -> FieldBinding<PlayerEntity, i16, i64> {
        FieldBinding::narrowing(Attribute::new("level"), Overflow::Saturate)
    }

    pub fn active() -> FieldBinding<PlayerEntity, bool, bool> {
        FieldBinding::new(Attribute::new("active")).with_default(false)
    }

    pub fn role() -> FieldBinding<PlayerEntity, String, Role> {
        FieldBinding::raw(Attribute::new("role"))
    }

    pub fn email() -> FieldBinding<PlayerEntity, Option<String>, Option<String>> {
        FieldBinding::new(Attribute::new("email")).validated_when_present(Rule::is_email())
    }

    pub fn stats() -> FieldBinding<PlayerEntity, Option<Vec<u8>>, Option<Stats>> {
        FieldBinding::optional_codec(Attribute::new("stats"), JsonCodec)
    }

    pub fn team() -> ParentBinding<PlayerEntity, Team> {
        ParentBinding::new(Attribute::new("team"))
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Team(RecordHandle);

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.current(&Team::name()).unwrap_or_default();
        f.debug_tuple("Team").field(&name).finish()
    }
}

impl DatabaseModel for Team {
    type Entity = TeamEntity;

    fn from_record(record: RecordHandle) -> Self {
        Team(record)
    }

    fn record(&self) -> &RecordHandle {
        &self.0
    }
}

impl Team {
    pub fn name() -> FieldBinding<TeamEntity, String, String> {
        FieldBinding::new(Attribute::new("name")).validated_by(Rule::not_empty())
    }

    pub fn players() -> ChildrenBinding<TeamEntity, Player> {
        ChildrenBinding::new(Attribute::new("players"))
    }

    /// The raw reference list behind `players`
    pub fn player_ids() -> FieldBinding<TeamEntity, Vec<RecordId>, Vec<RecordId>> {
        FieldBinding::new(Attribute::new("players"))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Store with both entities registered for save-time schema checks
pub fn fresh_store() -> (Arc<MemoryStore>, SharedContext) {
    let store = MemoryStore::new();
    store.register::<PlayerEntity>();
    store.register::<TeamEntity>();
    let context: SharedContext = store.clone();
    (store, context)
}

/// Insert a player with every required field set, without saving
pub fn new_player(context: &SharedContext, name: &str, score: f64) -> BindResult<Player> {
    let player = Player::create_in(context)?;
    player.set(&Player::name(), name.to_string())?;
    player.set(&Player::score(), score)?;
    player.set(&Player::level(), 1)?;
    player.set(&Player::role(), Role::Forward)?;
    player.set(&Player::active(), false)?;
    Ok(player)
}

/// Insert and save a player
pub fn saved_player(context: &SharedContext, name: &str, score: f64) -> BindResult<Player> {
    let player = new_player(context, name, score)?;
    player.save()?;
    Ok(player)
}

pub fn saved_team(context: &SharedContext, name: &str) -> BindResult<Team> {
    let team = Team::create_in(context)?;
    team.set(&Team::name(), name.to_string())?;
    team.save()?;
    Ok(team)
}

/// The nephews plus Donald, saved
pub fn seed_ducks(context: &SharedContext) -> BindResult<()> {
    for (name, score) in [("Riri", 20.0), ("Fifi", 10.0), ("Loulou", 40.0), ("Donald", 20.0)] {
        saved_player(context, name, score)?;
    }
    Ok(())
}

pub fn names(players: &[Player]) -> Vec<String> {
    players
        .iter()
        .map(|player| player.current(&Player::name()).unwrap_or_default())
        .collect()
}
