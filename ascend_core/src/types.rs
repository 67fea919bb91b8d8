//! Core domain types for the Ascend progression tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Movement categories and leveled movements
//! - Work measurements (reps vs held duration)
//! - Wave records and completed workout entries
//! - The progression catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Global rep target: the default unlock threshold for rep-based movements
/// and the target communicated to the recommendation collaborator.
pub const TARGET_REPS: u32 = 50;

/// Highest reachable progression level in any category.
pub const MAX_LEVEL: u8 = 10;

// ============================================================================
// Categories
// ============================================================================

/// The fixed, closed set of movement categories.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Push,
    Pull,
    Dips,
    Legs,
    Core,
}

impl CategoryId {
    /// All categories, in workout order
    pub const ALL: [CategoryId; 5] = [
        CategoryId::Push,
        CategoryId::Pull,
        CategoryId::Dips,
        CategoryId::Legs,
        CategoryId::Core,
    ];

    /// Stable catalog id (`push`, `pull`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryId::Push => "push",
            CategoryId::Pull => "pull",
            CategoryId::Dips => "dips",
            CategoryId::Legs => "legs",
            CategoryId::Core => "core",
        }
    }

    /// Human-readable name (`Push`, `Pull`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            CategoryId::Push => "Push",
            CategoryId::Pull => "Pull",
            CategoryId::Dips => "Dips",
            CategoryId::Legs => "Legs",
            CategoryId::Core => "Core",
        }
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CategoryId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" => Ok(CategoryId::Push),
            "pull" => Ok(CategoryId::Pull),
            "dips" => Ok(CategoryId::Dips),
            "legs" => Ok(CategoryId::Legs),
            "core" => Ok(CategoryId::Core),
            other => Err(format!("Unknown category: {}", other)),
        }
    }
}

// ============================================================================
// Movements
// ============================================================================

/// How a movement is measured. The two flavors are mutually exclusive:
/// a movement is either counted in reps or held for a duration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measure {
    /// Rep-counted movement
    Reps {
        /// Reps needed at the frontier level to unlock the next one.
        /// Falls back to the configured rep target when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reps_to_unlock: Option<u32>,
    },
    /// Timed hold
    Hold {
        /// Default hold target in seconds, also the countdown duration
        default_seconds: u32,
        /// Seconds needed at the frontier level to unlock the next one.
        /// Falls back to `default_seconds` when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds_to_unlock: Option<u32>,
    },
}

/// A single leveled movement variant within a category's progression
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movement {
    pub name: String,
    /// Progression level 1-10; level 0 marks an always-available warm-up
    pub level: u8,
    pub measure: Measure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Movement {
    pub fn is_rep_based(&self) -> bool {
        matches!(self.measure, Measure::Reps { .. })
    }

    pub fn is_warmup(&self) -> bool {
        self.level == 0
    }

    /// Hold target in seconds, if this is a timed movement
    pub fn hold_seconds(&self) -> Option<u32> {
        match self.measure {
            Measure::Hold {
                default_seconds, ..
            } => Some(default_seconds),
            Measure::Reps { .. } => None,
        }
    }

    /// Work value required at the frontier to unlock the next level.
    /// Rep movements without their own threshold use `target_reps`.
    pub fn unlock_threshold(&self, target_reps: u32) -> u32 {
        match self.measure {
            Measure::Reps { reps_to_unlock } => reps_to_unlock.unwrap_or(target_reps),
            Measure::Hold {
                default_seconds,
                seconds_to_unlock,
            } => seconds_to_unlock.unwrap_or(default_seconds),
        }
    }

    /// Wrap a raw work value in the unit matching this movement's measure
    pub fn work(&self, value: u32) -> Work {
        if self.is_rep_based() {
            Work::Reps(value)
        } else {
            Work::DurationSeconds(value)
        }
    }
}

/// A movement category with its ordered progression ladder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovementCategory {
    pub id: CategoryId,
    pub name: String,
    /// Icon reference for the frontend layer
    pub icon: String,
    /// Ordered by level; may start with level-0 warm-up variants
    pub progressions: Vec<Movement>,
}

// ============================================================================
// Waves and Entries
// ============================================================================

/// Performed work for one wave, in the unit matching the movement's measure.
///
/// Serialized flattened, so a wave carries exactly one of `reps` /
/// `duration_seconds`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Work {
    Reps(u32),
    DurationSeconds(u32),
}

/// One discrete performance attempt within a movement.
///
/// Ephemeral: lives only while a movement is in progress, then is folded
/// into a [`WorkoutEntry`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaveRecord {
    /// 1-based, increasing per movement attempt
    pub wave: u32,
    pub level: u8,
    #[serde(flatten)]
    pub work: Work,
}

/// A completed movement, as appended to the workout history.
///
/// Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub category: CategoryId,
    pub movement: String,
    /// Highest level among the waves (level-0 warm-ups excluded), or the
    /// selected level if no waves qualify
    pub level_achieved: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    pub waves: Vec<WaveRecord>,
}
