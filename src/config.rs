use anyhow::{anyhow, Result};
use argh::FromArgs;
use mail_header_analyzer::{Options, Strings};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use time::UtcOffset;

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header file to analyze, standard input when `None`
    #[serde(skip)]
    pub input: Option<PathBuf>,
    pub display: Display,
    pub strings: Strings,
    pub output: Output,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Display {
    /// Offset from UTC at which dates are shown
    pub utc_offset_minutes: i32,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct Output {
    pub pretty: bool,
}

impl Config {
    pub fn options(&self) -> Result<Options> {
        let seconds = self.display.utc_offset_minutes.checked_mul(60)
            .ok_or_else(|| anyhow!("UTC offset {} is out of range", self.display.utc_offset_minutes))?;

        Ok(Options {
            utc_offset: UtcOffset::from_whole_seconds(seconds)?,
            strings: self.strings.clone(),
        })
    }
}

/// Mail header analyzer
#[derive(FromArgs)]
struct Args {
    /// header file to analyze (standard input when not given)
    #[argh(positional)]
    input: Option<PathBuf>,
    /// configuration file to use
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
    /// offset from UTC, in minutes, at which to show dates
    #[argh(option)]
    utc_offset: Option<i32>,
    /// pretty-print output
    #[argh(switch)]
    pretty: bool,
}

pub fn load() -> Result<Config> {
    let args: Args = argh::from_env();

    let mut config = match args.config {
        None => Config::default(),
        Some(path) => {
            let data = fs::read_to_string(path)?;
            toml::from_str(&data)?
        }
    };

    config.input = args.input;

    if let Some(minutes) = args.utc_offset {
        config.display.utc_offset_minutes = minutes;
    }

    if args.pretty {
        config.output.pretty = true;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file() {
        let config: Config = toml::from_str("\
            [display]\n\
            utc_offset_minutes = -90\n\
            [strings]\n\
            minute = \"minuta\"\n\
        ").unwrap();

        let options = config.options().unwrap();
        assert_eq!(options.utc_offset.whole_seconds(), -5400);
        assert_eq!(options.strings.minute, "minuta");
        assert_eq!(options.strings.minutes, "minutes");
        assert!(!config.output.pretty);
    }

    #[test]
    fn offset_out_of_range() {
        let mut config = Config::default();
        config.display.utc_offset_minutes = 48 * 60;
        assert!(config.options().is_err());
        config.display.utc_offset_minutes = i32::MAX;
        assert!(config.options().is_err());
    }
}
