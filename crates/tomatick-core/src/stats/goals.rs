use serde::{Deserialize, Serialize};

use crate::storage::{GoalsConfig, Stats};

/// Completed pomodoros measured against the configured targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub today: u64,
    pub daily_goal: u64,
    pub week: u64,
    pub weekly_goal: u64,
}

impl GoalProgress {
    pub fn new(stats: &Stats, goals: &GoalsConfig) -> Self {
        Self {
            today: stats.today_pomodoros,
            daily_goal: u64::from(goals.daily.max(1)),
            week: stats.week_pomodoros,
            weekly_goal: u64::from(goals.weekly.max(1)),
        }
    }

    /// Percentage of the daily goal reached, capped at 100.
    pub fn daily_pct(&self) -> u8 {
        pct(self.today, self.daily_goal)
    }

    /// Percentage of the weekly goal reached, capped at 100.
    pub fn weekly_pct(&self) -> u8 {
        pct(self.week, self.weekly_goal)
    }

    pub fn daily_met(&self) -> bool {
        self.today >= self.daily_goal
    }

    pub fn weekly_met(&self) -> bool {
        self.week >= self.weekly_goal
    }
}

fn pct(done: u64, goal: u64) -> u8 {
    if goal == 0 {
        return 100;
    }
    (done.saturating_mul(100) / goal).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_capped() {
        let stats = Stats {
            today_pomodoros: 12,
            week_pomodoros: 10,
            ..Stats::default()
        };
        let progress = GoalProgress::new(&stats, &GoalsConfig::default());
        assert_eq!(progress.daily_pct(), 100);
        assert!(progress.daily_met());
        assert_eq!(progress.weekly_pct(), 25);
        assert!(!progress.weekly_met());
    }

    #[test]
    fn zero_goal_is_treated_as_one() {
        let goals = GoalsConfig { daily: 0, weekly: 0 };
        let progress = GoalProgress::new(&Stats::default(), &goals);
        assert_eq!(progress.daily_goal, 1);
        assert_eq!(progress.daily_pct(), 0);
    }
}
