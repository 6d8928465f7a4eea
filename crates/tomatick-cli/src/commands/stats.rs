use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use tomatick_core::{achievements, Achievement, Config, Database, GoalProgress};

const BAR_WIDTH: u64 = 40;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// Focus sessions per day
    History {
        /// Number of days, ending today
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Most recent completions
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Unlocked and locked badges
    Achievements,
    /// Daily and weekly goal progress
    Goals,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Utc::now().date_naive();

    match action {
        StatsAction::Today => {
            let stats = db.stats(today)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::History { days } => {
            let counts = db.daily_counts(today, days)?;
            let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
            for (day, count) in counts {
                println!("{}  {:>3}  {}", day, count, bar(count, max));
            }
        }
        StatsAction::Recent { limit } => {
            let sessions = db.recent_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        StatsAction::Achievements => {
            let stats = db.stats(today)?;
            let unlocked = achievements(&stats);
            let badges: Vec<_> = Achievement::ALL
                .iter()
                .map(|badge| {
                    json!({
                        "id": badge,
                        "title": badge.title(),
                        "unlocked": unlocked.contains(badge),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&badges)?);
        }
        StatsAction::Goals => {
            let config = Config::load()?;
            let stats = db.stats(today)?;
            let progress = GoalProgress::new(&stats, &config.goals);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "today": progress.today,
                    "daily_goal": progress.daily_goal,
                    "daily_pct": progress.daily_pct(),
                    "daily_met": progress.daily_met(),
                    "week": progress.week,
                    "weekly_goal": progress.weekly_goal,
                    "weekly_pct": progress.weekly_pct(),
                    "weekly_met": progress.weekly_met(),
                }))?
            );
        }
    }
    Ok(())
}

/// Horizontal bar scaled so the busiest day fills `BAR_WIDTH`.
fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let width = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(width as usize)
}
