//! Per-user profile document and study goals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::SubjectStat;

/// Daily goal floor: 30 minutes.
pub const MIN_DAILY_GOAL_SECS: u64 = 1_800;
/// Weekly goal floor: 1 hour.
pub const MIN_WEEKLY_GOAL_SECS: u64 = 3_600;

pub const DEFAULT_DAILY_GOAL_SECS: u64 = 14_400;
pub const DEFAULT_WEEKLY_GOAL_SECS: u64 = 72_000;

/// Daily and weekly study targets in seconds.
///
/// Always at or above the floors; the only constructors clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    daily_goal: u64,
    weekly_goal: u64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL_SECS,
            weekly_goal: DEFAULT_WEEKLY_GOAL_SECS,
        }
    }
}

impl Goals {
    pub fn new(daily_secs: u64, weekly_secs: u64) -> Self {
        Self {
            daily_goal: daily_secs.max(MIN_DAILY_GOAL_SECS),
            weekly_goal: weekly_secs.max(MIN_WEEKLY_GOAL_SECS),
        }
    }

    /// Goals as entered in hours. Non-finite or negative input falls to the floor.
    pub fn from_hours(daily_hours: f64, weekly_hours: f64) -> Self {
        Self::new(hours_to_secs(daily_hours), hours_to_secs(weekly_hours))
    }

    pub fn daily_secs(&self) -> u64 {
        self.daily_goal
    }

    pub fn weekly_secs(&self) -> u64 {
        self.weekly_goal
    }
}

fn hours_to_secs(hours: f64) -> u64 {
    if hours.is_finite() && hours > 0.0 {
        (hours * 3600.0).round() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// The user document held by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub subject_stats: BTreeMap<String, SubjectStat>,
    #[serde(default)]
    pub total_study_time: u64,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u64,
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u64,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub reminders_enabled: bool,
}

fn default_daily_goal() -> u64 {
    DEFAULT_DAILY_GOAL_SECS
}
fn default_weekly_goal() -> u64 {
    DEFAULT_WEEKLY_GOAL_SECS
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::with_goals(Goals::default())
    }
}

impl UserProfile {
    /// Empty profile with the given goals, as written on first sign-in.
    pub fn with_goals(goals: Goals) -> Self {
        Self {
            subjects: Vec::new(),
            subject_stats: BTreeMap::new(),
            total_study_time: 0,
            daily_goal: goals.daily_secs(),
            weekly_goal: goals.weekly_secs(),
            streak: 0,
            theme: Theme::default(),
            reminders_enabled: false,
        }
    }

    /// Goals re-clamped, in case the stored document predates the floors.
    pub fn goals(&self) -> Goals {
        Goals::new(self.daily_goal, self.weekly_goal)
    }

    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(subjects) = &update.subjects {
            self.subjects = subjects.clone();
        }
        if let Some(stats) = &update.subject_stats {
            self.subject_stats = stats.clone();
        }
        if let Some(total) = update.total_study_time {
            self.total_study_time = total;
        }
        if let Some(daily) = update.daily_goal {
            self.daily_goal = daily;
        }
        if let Some(weekly) = update.weekly_goal {
            self.weekly_goal = weekly;
        }
        if let Some(streak) = update.streak {
            self.streak = streak;
        }
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(reminders) = update.reminders_enabled {
            self.reminders_enabled = reminders;
        }
    }
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_stats: Option<BTreeMap<String, SubjectStat>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_study_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_goal: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders_enabled: Option<bool>,
}

impl ProfileUpdate {
    pub fn subjects(subjects: Vec<String>) -> Self {
        Self {
            subjects: Some(subjects),
            ..Self::default()
        }
    }

    pub fn goals(goals: Goals) -> Self {
        Self {
            daily_goal: Some(goals.daily_secs()),
            weekly_goal: Some(goals.weekly_secs()),
            ..Self::default()
        }
    }
}
