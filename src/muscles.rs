//! Muscle taxonomy - muscle groups, recovery constants and workout splits

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecoveryError;

/// Taxonomy revision, bumped whenever half-lives, normalizers or split
/// memberships change.
pub const TAXONOMY_VERSION: u32 = 1;

/// Muscle groups tracked by the recovery engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Back,
    Quads,
    Hamstrings,
    Glutes,
    Shoulders,
    Biceps,
    Triceps,
    Core,
    Calves,
}

/// Workout splits the recommendation engine chooses between
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    Push,
    Pull,
    Legs,
    Core,
    FullBody,
}

/// Outcome of a recommendation: one of the trainable splits, or rest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedWorkout {
    Push,
    Pull,
    Legs,
    FullBody,
    Rest,
}

impl MuscleGroup {
    /// Wire id (`"chest"`, `"hamstrings"`, ...)
    pub fn id(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Core => "core",
            MuscleGroup::Calves => "calves",
        }
    }

    /// All muscle groups for iteration, in display order
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Core,
            MuscleGroup::Calves,
        ]
    }

    /// Lookup by wire id. Unknown ids are a caller bug and fail loudly.
    pub fn from_id(id: &str) -> Result<Self, RecoveryError> {
        let needle = id.trim();
        Self::all()
            .iter()
            .copied()
            .find(|m| m.id().eq_ignore_ascii_case(needle))
            .ok_or_else(|| RecoveryError::UnknownMuscleGroup(id.to_string()))
    }

    /// Hours for accumulated fatigue to halve.
    /// Large groups recover slower than small ones.
    pub fn recovery_half_life_hours(&self) -> f64 {
        match self {
            MuscleGroup::Quads | MuscleGroup::Back => 72.0,
            MuscleGroup::Chest | MuscleGroup::Hamstrings | MuscleGroup::Glutes => 60.0,
            MuscleGroup::Shoulders => 48.0,
            MuscleGroup::Biceps | MuscleGroup::Triceps | MuscleGroup::Calves => 36.0,
            MuscleGroup::Core => 24.0,
        }
    }

    /// Session volume (kg x reps) that maps to one point of fatigue
    pub fn volume_normalizer(&self) -> f64 {
        match self {
            MuscleGroup::Quads => 90.0,
            MuscleGroup::Glutes => 80.0,
            MuscleGroup::Back | MuscleGroup::Hamstrings => 70.0,
            MuscleGroup::Chest => 60.0,
            MuscleGroup::Shoulders | MuscleGroup::Calves => 40.0,
            MuscleGroup::Triceps => 30.0,
            MuscleGroup::Biceps => 25.0,
            MuscleGroup::Core => 20.0,
        }
    }

    /// Split categories this muscle belongs to (full body excluded, it spans everything)
    pub fn splits(&self) -> &'static [SplitType] {
        match self {
            MuscleGroup::Chest | MuscleGroup::Shoulders | MuscleGroup::Triceps => &[SplitType::Push],
            MuscleGroup::Back | MuscleGroup::Biceps => &[SplitType::Pull],
            MuscleGroup::Quads | MuscleGroup::Hamstrings | MuscleGroup::Glutes | MuscleGroup::Calves => {
                &[SplitType::Legs]
            }
            MuscleGroup::Core => &[SplitType::Core],
        }
    }

    /// Core never blocks a split
    pub fn counts_toward_readiness(&self) -> bool {
        *self != MuscleGroup::Core
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MuscleGroup {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

impl SplitType {
    /// Splits that can be suggested, in preference order for exact ties
    pub fn trainable() -> &'static [SplitType] {
        &[SplitType::Push, SplitType::Pull, SplitType::Legs, SplitType::FullBody]
    }

    pub fn id(&self) -> &'static str {
        match self {
            SplitType::Push => "push",
            SplitType::Pull => "pull",
            SplitType::Legs => "legs",
            SplitType::Core => "core",
            SplitType::FullBody => "full_body",
        }
    }

    /// Muscle groups scored for this split's readiness
    pub fn members(&self) -> Vec<MuscleGroup> {
        MuscleGroup::all()
            .iter()
            .copied()
            .filter(|m| match self {
                SplitType::FullBody => m.counts_toward_readiness(),
                split => m.splits().contains(split),
            })
            .collect()
    }
}

impl SuggestedWorkout {
    pub fn id(&self) -> &'static str {
        match self {
            SuggestedWorkout::Push => "push",
            SuggestedWorkout::Pull => "pull",
            SuggestedWorkout::Legs => "legs",
            SuggestedWorkout::FullBody => "full_body",
            SuggestedWorkout::Rest => "rest",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "push" => Some(SuggestedWorkout::Push),
            "pull" => Some(SuggestedWorkout::Pull),
            "legs" => Some(SuggestedWorkout::Legs),
            "full_body" => Some(SuggestedWorkout::FullBody),
            "rest" => Some(SuggestedWorkout::Rest),
            _ => None,
        }
    }

    /// The split behind this suggestion, `None` for rest
    pub fn split(&self) -> Option<SplitType> {
        match self {
            SuggestedWorkout::Push => Some(SplitType::Push),
            SuggestedWorkout::Pull => Some(SplitType::Pull),
            SuggestedWorkout::Legs => Some(SplitType::Legs),
            SuggestedWorkout::FullBody => Some(SplitType::FullBody),
            SuggestedWorkout::Rest => None,
        }
    }
}

impl From<SplitType> for SuggestedWorkout {
    fn from(split: SplitType) -> Self {
        match split {
            SplitType::Push => SuggestedWorkout::Push,
            SplitType::Pull => SuggestedWorkout::Pull,
            SplitType::Legs => SuggestedWorkout::Legs,
            // Core alone is never suggested; it folds into a full body day
            SplitType::Core | SplitType::FullBody => SuggestedWorkout::FullBody,
        }
    }
}

impl fmt::Display for SuggestedWorkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(MuscleGroup::from_id("chest").unwrap(), MuscleGroup::Chest);
        assert_eq!(MuscleGroup::from_id(" Quads ").unwrap(), MuscleGroup::Quads);
        assert_eq!("calves".parse::<MuscleGroup>().unwrap(), MuscleGroup::Calves);
    }

    #[test]
    fn test_unknown_muscle_group_fails() {
        let err = MuscleGroup::from_id("forearms").unwrap_err();
        assert!(matches!(err, RecoveryError::UnknownMuscleGroup(ref id) if id == "forearms"));
    }

    #[test]
    fn test_ids_round_trip_through_serde() {
        for group in MuscleGroup::all() {
            let json = serde_json::to_string(group).unwrap();
            assert_eq!(json, format!("\"{}\"", group.id()));
        }
    }

    #[test]
    fn test_large_groups_recover_slower() {
        assert!(MuscleGroup::Quads.recovery_half_life_hours() > MuscleGroup::Biceps.recovery_half_life_hours());
        assert!(MuscleGroup::Back.recovery_half_life_hours() > MuscleGroup::Calves.recovery_half_life_hours());
    }

    #[test]
    fn test_split_members() {
        assert_eq!(
            SplitType::Push.members(),
            vec![MuscleGroup::Chest, MuscleGroup::Shoulders, MuscleGroup::Triceps]
        );
        assert_eq!(SplitType::Pull.members(), vec![MuscleGroup::Back, MuscleGroup::Biceps]);
        assert_eq!(SplitType::Legs.members().len(), 4);

        let full_body = SplitType::FullBody.members();
        assert_eq!(full_body.len(), MuscleGroup::all().len() - 1);
        assert!(!full_body.contains(&MuscleGroup::Core));
    }

    #[test]
    fn test_every_non_core_muscle_is_in_a_trainable_split() {
        for group in MuscleGroup::all().iter().filter(|m| m.counts_toward_readiness()) {
            let in_split = [SplitType::Push, SplitType::Pull, SplitType::Legs]
                .iter()
                .any(|s| s.members().contains(group));
            assert!(in_split, "{} is not covered by push/pull/legs", group);
        }
    }

    #[test]
    fn test_suggested_workout_ids() {
        assert_eq!(SuggestedWorkout::FullBody.id(), "full_body");
        assert_eq!(SuggestedWorkout::from_id("rest"), Some(SuggestedWorkout::Rest));
        assert_eq!(SuggestedWorkout::from_id("arms"), None);
        assert_eq!(SuggestedWorkout::from(SplitType::Legs), SuggestedWorkout::Legs);
        assert_eq!(SuggestedWorkout::Rest.split(), None);
    }
}
