use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use tomatick_core::calendar::ICS_FILE_NAME;
use tomatick_core::{Config, Database, FocusDayExport};

#[derive(Subcommand)]
pub enum ExportAction {
    /// Write today's focus time as an iCalendar event
    Ics {
        /// Destination file
        #[arg(long, short, default_value = ICS_FILE_NAME)]
        output: PathBuf,
        /// Print to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
}

pub fn run(action: ExportAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ExportAction::Ics { output, stdout } => {
            let config = Config::load()?;
            let db = Database::open()?;
            let now = Utc::now();
            let stats = db.stats(now.date_naive())?;

            let export =
                FocusDayExport::new(stats.today_pomodoros, config.durations().focus, now)?;
            let ics = export.to_ics();
            if stdout {
                print!("{ics}");
            } else {
                std::fs::write(&output, ics)?;
                eprintln!(
                    "Exported {} pomodoros to {}",
                    export.pomodoros,
                    output.display()
                );
            }
        }
    }
    Ok(())
}
