use serde::{Deserialize, Serialize};

use crate::storage::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    TenPomodoros,
    FiftyPomodoros,
    HundredPomodoros,
    DeepFocusDay,
    WeeklyWarrior,
    SevenDayStreak,
}

impl Achievement {
    pub const ALL: [Achievement; 6] = [
        Achievement::TenPomodoros,
        Achievement::FiftyPomodoros,
        Achievement::HundredPomodoros,
        Achievement::DeepFocusDay,
        Achievement::WeeklyWarrior,
        Achievement::SevenDayStreak,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::TenPomodoros => "10 Pomodoros",
            Achievement::FiftyPomodoros => "50 Pomodoros",
            Achievement::HundredPomodoros => "100 Pomodoros",
            Achievement::DeepFocusDay => "Deep Focus Day",
            Achievement::WeeklyWarrior => "Weekly Warrior",
            Achievement::SevenDayStreak => "7-Day Streak",
        }
    }

    pub fn is_unlocked(&self, stats: &Stats) -> bool {
        match self {
            Achievement::TenPomodoros => stats.completed_pomodoros >= 10,
            Achievement::FiftyPomodoros => stats.completed_pomodoros >= 50,
            Achievement::HundredPomodoros => stats.completed_pomodoros >= 100,
            Achievement::DeepFocusDay => stats.today_pomodoros >= 8,
            Achievement::WeeklyWarrior => stats.week_pomodoros >= 40,
            Achievement::SevenDayStreak => stats.streak_days >= 7,
        }
    }
}

/// Badges unlocked by `stats`, in display order.
pub fn achievements(stats: &Stats) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| a.is_unlocked(stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_unlocked_at_start() {
        assert!(achievements(&Stats::default()).is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let stats = Stats {
            completed_pomodoros: 50,
            today_pomodoros: 8,
            week_pomodoros: 39,
            streak_days: 7,
            ..Stats::default()
        };
        assert_eq!(
            achievements(&stats),
            vec![
                Achievement::TenPomodoros,
                Achievement::FiftyPomodoros,
                Achievement::DeepFocusDay,
                Achievement::SevenDayStreak,
            ]
        );
    }

    #[test]
    fn titles_match_badges() {
        assert_eq!(Achievement::WeeklyWarrior.title(), "Weekly Warrior");
        assert_eq!(Achievement::SevenDayStreak.title(), "7-Day Streak");
    }
}
