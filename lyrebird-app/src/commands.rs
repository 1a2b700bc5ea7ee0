use clap::builder::RangedU64ValueParser;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::time::Duration;

/// Terminal music player with time-synced lyrics
#[derive(Debug, Parser)]
#[command(name = "lyrebird", author, version, about, long_about = None)]
pub struct Cli {
    /// Song manifest, as a path or an http(s) URL; overrides `library.manifest`
    pub manifest: Option<String>,
}

/// A line of user input from the terminal
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "lyrebird")]
pub enum Command {
    /// Play a song by its number in the list
    Play {
        #[arg(value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        number: usize,
    },
    /// Play or pause; starts the first song if none is selected
    #[command(visible_alias = "p", alias = "pause")]
    Toggle,
    /// Toggle looping the current song
    #[command(visible_alias = "l")]
    Loop,
    /// Play the next song
    #[command(visible_alias = "n")]
    Next,
    /// Jump to a position in the current song
    Seek {
        /// Position in seconds
        #[arg(value_parser = parse_position)]
        position: Duration,
    },
    /// Set the volume
    #[command(alias = "volume")]
    Vol {
        /// 0 to 100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Show the song list
    #[command(alias = "ls")]
    List,
    /// Show what is playing
    Status,
    /// Exit the program
    #[command(visible_alias = "q", alias = "exit")]
    Quit,
}

impl Command {
    /// Parse one line typed at the prompt. `help` comes back as an error
    /// whose message is the command list.
    ///
    /// # Errors
    ///
    /// Returns a clap error describing the unknown command or bad argument.
    pub fn parse(input: &str) -> Result<Self, clap::Error> {
        let input_vec: Vec<String> = std::iter::once(String::new())
            .chain(shlex::split(input).unwrap_or_default())
            .collect();

        let matches = Self::command()
            .override_usage("<COMMAND> [ARGS]")
            .disable_help_flag(true)
            .try_get_matches_from(input_vec.iter().map(String::as_str))?;

        Self::from_arg_matches(&matches)
    }
}

fn parse_position(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{value}' is not a valid position"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("p").unwrap(), Command::Toggle);
        assert_eq!(Command::parse("pause").unwrap(), Command::Toggle);
        assert_eq!(Command::parse("loop").unwrap(), Command::Loop);
        assert_eq!(Command::parse("n").unwrap(), Command::Next);
        assert_eq!(Command::parse("ls").unwrap(), Command::List);
        assert_eq!(Command::parse("q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_play() {
        assert_eq!(
            Command::parse("play 3").unwrap(),
            Command::Play { number: 3 }
        );
        assert!(Command::parse("play").is_err());
        assert!(Command::parse("play 0").is_err());
    }

    #[test]
    fn test_parse_seek() {
        assert_eq!(
            Command::parse("seek 12.5").unwrap(),
            Command::Seek {
                position: Duration::from_millis(12_500)
            }
        );
        assert!(Command::parse("seek soon").is_err());
        assert!(Command::parse("seek -3").is_err());
    }

    #[test]
    fn test_parse_volume() {
        assert_eq!(
            Command::parse("vol 40").unwrap(),
            Command::Vol { percent: 40 }
        );
        assert!(Command::parse("vol 101").is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn test_help_lists_commands() {
        let err = Command::parse("help").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("seek"));
    }

    #[test]
    fn test_cli_manifest_argument() {
        let cli = Cli::try_parse_from(["lyrebird", "music/songs.json"]).unwrap();
        assert_eq!(cli.manifest.as_deref(), Some("music/songs.json"));

        let cli = Cli::try_parse_from(["lyrebird"]).unwrap();
        assert_eq!(cli.manifest, None);
    }
}
