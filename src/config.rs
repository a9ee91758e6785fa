use std::path;
use std::time;

use ::config as settings;
use failure;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub poll: Poll,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    /// Base URL of the realtime database, e.g. `https://my-farm.firebaseio.com`.
    pub url: String,
    /// Database secret or ID token, sent as the `auth` query parameter.
    pub auth: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Poll {
    pub interval_secs: u64,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            url: String::new(),
            auth: None,
            timeout_secs: 10,
        }
    }
}

impl Default for Poll {
    fn default() -> Self {
        Poll { interval_secs: 5 }
    }
}

impl Config {
    /// Layers the config file (if it exists), `PLANTCARE_*` environment
    /// variables and the command line override, in increasing precedence.
    pub fn load(file: &path::Path, database_url: Option<&str>) -> Result<Config, failure::Error> {
        let raw = settings::Config::builder()
            .add_source(settings::File::from(file).required(false))
            .add_source(
                settings::Environment::with_prefix("PLANTCARE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("database.url", database_url)?
            .build()?;

        let config = raw.try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), failure::Error> {
        if self.poll.interval_secs == 0 {
            bail!("poll.interval_secs must be greater than zero");
        }
        if self.database.timeout_secs == 0 {
            bail!("database.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> time::Duration {
        time::Duration::from_secs(self.poll.interval_secs)
    }
}
