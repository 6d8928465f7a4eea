use clap::Subcommand;
use tomatick_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. `schedule.focus_duration` or `timer.auto_start`
    Get { key: String },
    /// Change one setting; durations are minutes and must be at least 1
    Set { key: String, value: String },
    /// Print every setting as JSON
    List,
    /// Restore the default durations, goals and timer settings
    Reset,
    /// Print where config.toml lives
    Path,
}

fn lookup(config: &Config, key: &str) -> Result<String, ConfigError> {
    config
        .get(key)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            println!("{}", lookup(&Config::load()?, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{key} = {}", lookup(&config, &key)?);
        }
        ConfigAction::List => {
            println!("{}", serde_json::to_string_pretty(&Config::load()?)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            eprintln!("Restored defaults in {}", Config::path()?.display());
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reports_unknown_keys() {
        let config = Config::default();
        assert_eq!(lookup(&config, "goals.daily").unwrap(), "8");
        assert!(matches!(
            lookup(&config, "goals.monthly"),
            Err(ConfigError::UnknownKey(key)) if key == "goals.monthly"
        ));
    }
}
