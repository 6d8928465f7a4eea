//! Statistics built on top of recorded completions.
//!
//! Achievement badges and goal progress are pure functions of
//! [`Stats`](crate::storage::Stats); the database does the counting.

mod achievements;
mod goals;

pub use achievements::{achievements, Achievement};
pub use goals::GoalProgress;
