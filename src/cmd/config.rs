//! Configuration inspection — `blogsmith config`.

use anyhow::Result;

use blogsmith::config::AppConfig;

pub fn cmd_config(validate: bool) -> Result<()> {
    match AppConfig::from_env() {
        Ok(config) => {
            if validate {
                println!("Configuration OK");
            } else {
                println!("{}", config.redacted());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}
