//! Built-in catalog of movement categories and progression ladders.
//!
//! The catalog is static reference data: five categories, each with ten
//! leveled movement variants plus always-available level-0 warm-ups.
//! It is loaded once at process start and never mutated.

use crate::types::*;
use once_cell::sync::Lazy;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// The complete catalog of movement categories
#[derive(Clone, Debug)]
pub struct Catalog {
    pub categories: Vec<MovementCategory>,
}

impl Catalog {
    /// Look up a category by id. Callers must handle absence.
    pub fn category(&self, id: CategoryId) -> Option<&MovementCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for category in &self.categories {
            if category.name.is_empty() {
                errors.push(format!("Category '{}' has empty name", category.id.as_str()));
            }
            if category.progressions.is_empty() {
                errors.push(format!(
                    "Category '{}' has no progressions",
                    category.id.as_str()
                ));
            }

            let mut seen_levels = Vec::new();
            let mut last_level = 0u8;
            for movement in &category.progressions {
                if movement.name.is_empty() {
                    errors.push(format!(
                        "Category '{}' has a movement with empty name",
                        category.id.as_str()
                    ));
                }
                if movement.level > MAX_LEVEL {
                    errors.push(format!(
                        "Movement '{}' has level {} above max {}",
                        movement.name, movement.level, MAX_LEVEL
                    ));
                }
                // Levels must be unique except for level-0 warm-ups, and the
                // list must be ordered by level
                if movement.level > 0 && seen_levels.contains(&movement.level) {
                    errors.push(format!(
                        "Category '{}' has duplicate level {}",
                        category.id.as_str(),
                        movement.level
                    ));
                }
                if movement.level < last_level {
                    errors.push(format!(
                        "Category '{}' progressions not ordered at '{}'",
                        category.id.as_str(),
                        movement.name
                    ));
                }
                seen_levels.push(movement.level);
                last_level = movement.level;

                if let Measure::Hold {
                    default_seconds, ..
                } = movement.measure
                {
                    if default_seconds == 0 {
                        errors.push(format!(
                            "Hold movement '{}' has zero default duration",
                            movement.name
                        ));
                    }
                }
            }
        }

        // Every category in the closed set must be present
        for id in CategoryId::ALL {
            if self.category(id).is_none() {
                errors.push(format!("Catalog missing category '{}'", id.as_str()));
            }
        }

        errors
    }
}

impl MovementCategory {
    /// Movement at an exact level, if the ladder has one
    pub fn movement_at_level(&self, level: u8) -> Option<&Movement> {
        self.progressions.iter().find(|m| m.level == level)
    }

    /// Movement by display name
    pub fn movement_named(&self, name: &str) -> Option<&Movement> {
        self.progressions.iter().find(|m| m.name == name)
    }

    /// Progressions with level > 0 in ladder order (warm-ups excluded)
    pub fn working_progressions(&self) -> Vec<&Movement> {
        self.progressions.iter().filter(|m| !m.is_warmup()).collect()
    }

    /// Lowest non-warm-up movement, if any
    pub fn lowest_working(&self) -> Option<&Movement> {
        self.progressions.iter().find(|m| !m.is_warmup())
    }

    /// Absolute lowest entry, warm-ups included
    pub fn lowest(&self) -> Option<&Movement> {
        self.progressions.first()
    }
}

fn reps(name: &str, level: u8) -> Movement {
    Movement {
        name: name.into(),
        level,
        measure: Measure::Reps {
            reps_to_unlock: None,
        },
        description: None,
    }
}

fn reps_to(name: &str, level: u8, to_unlock: u32) -> Movement {
    Movement {
        name: name.into(),
        level,
        measure: Measure::Reps {
            reps_to_unlock: Some(to_unlock),
        },
        description: None,
    }
}

fn hold(name: &str, level: u8, default_seconds: u32) -> Movement {
    Movement {
        name: name.into(),
        level,
        measure: Measure::Hold {
            default_seconds,
            seconds_to_unlock: None,
        },
        description: None,
    }
}

/// Builds the default catalog with the built-in progression ladders
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> Catalog {
    let push = MovementCategory {
        id: CategoryId::Push,
        name: "Push".into(),
        icon: "push".into(),
        progressions: vec![
            reps("Scapular Push-up", 0),
            reps("Wall Push-up", 1),
            reps("Incline Push-up", 2),
            reps("Knee Push-up", 3),
            reps("Full Push-up", 4),
            reps("Diamond Push-up", 5),
            reps_to("Pseudo Planche Push-up", 6, 30),
            reps_to("Pike Push-up", 7, 30),
            reps_to("Archer Push-up", 8, 20),
            reps_to("One-Arm Incline Push-up", 9, 15),
            reps_to("One-Arm Push-up", 10, 10),
        ],
    };

    let pull = MovementCategory {
        id: CategoryId::Pull,
        name: "Pull".into(),
        icon: "pull".into(),
        progressions: vec![
            hold("Dead Hang", 0, 30),
            reps("Scapular Pull", 1),
            hold("Arch Hang", 2, 30),
            reps("Body Row", 3),
            reps_to("Negative Pull-up", 4, 15),
            reps_to("Pull-up", 5, 20),
            reps_to("L-sit Pull-up", 6, 15),
            reps_to("Archer Pull-up", 7, 12),
            reps_to("Typewriter Pull-up", 8, 10),
            reps_to("One-Arm Negative Pull-up", 9, 8),
            reps_to("One-Arm Pull-up", 10, 5),
        ],
    };

    let dips = MovementCategory {
        id: CategoryId::Dips,
        name: "Dips".into(),
        icon: "dips".into(),
        progressions: vec![
            reps("Shoulder Shrug", 0),
            hold("Parallel Bar Support Hold", 1, 30),
            reps("Bench Dip", 2),
            reps_to("Negative Dip", 3, 15),
            reps("Assisted Dip", 4),
            reps_to("Parallel Bar Dip", 5, 25),
            reps_to("Straight Bar Dip", 6, 20),
            reps_to("L-sit Dip", 7, 15),
            reps_to("Ring Dip", 8, 15),
            reps_to("Korean Dip", 9, 12),
            reps_to("Weighted Dip", 10, 10),
        ],
    };

    let legs = MovementCategory {
        id: CategoryId::Legs,
        name: "Legs".into(),
        icon: "legs".into(),
        progressions: vec![
            reps("Leg Swing", 0),
            reps("Assisted Squat", 1),
            reps("Air Squat", 2),
            reps("Split Squat", 3),
            reps("Bulgarian Split Squat", 4),
            reps_to("Step-up", 5, 40),
            reps_to("Beginner Shrimp Squat", 6, 30),
            reps_to("Shrimp Squat", 7, 20),
            reps_to("Assisted Pistol Squat", 8, 20),
            reps_to("Pistol Squat", 9, 15),
            reps_to("Weighted Pistol Squat", 10, 10),
        ],
    };

    let core = MovementCategory {
        id: CategoryId::Core,
        name: "Core".into(),
        icon: "core".into(),
        progressions: vec![
            reps("Dead Bug", 0),
            hold("Plank", 1, 60),
            hold("Side Plank", 2, 45),
            hold("Hollow Hold", 3, 45),
            reps("Lying Leg Raise", 4),
            reps("Hanging Knee Raise", 5),
            reps_to("Hanging Leg Raise", 6, 30),
            hold("L-sit", 7, 20),
            reps_to("Toes-to-Bar", 8, 15),
            reps_to("Dragon Flag", 9, 10),
            hold("Front Lever", 10, 10),
        ],
    };

    Catalog {
        categories: vec![push, pull, dips, legs, core],
    }
}
