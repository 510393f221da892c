//! Line commands read from stdin.
//!
//! | Input | Meaning |
//! |-------|---------|
//! | *(empty)*, `a` | one activity unit |
//! | `a N` | `N` activity units |
//! | `skip H` | jump `H` hours (debug) |
//! | `status` | print the farm |
//! | `build SPECIES` | buy housing for a species |
//! | `buy SPECIES` | buy an animal into free housing |
//! | `feed SPECIES N` | buy `N` units of feed |
//! | `sell` | sell every good on hand |
//! | `save` | save now |
//! | `help` | list commands |
//! | `quit` | save and exit |

use std::str::FromStr;

use ranch_types::{ParseEnumError, Species};

/// A parsed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Report activity units.
    Activity(u64),
    /// Jump forward whole hours.
    Skip(u64),
    /// Print the farm.
    Status,
    /// Buy housing for a species.
    Build(Species),
    /// Buy an animal.
    Buy(Species),
    /// Buy feed units for a species.
    Feed(Species, u64),
    /// Sell all goods.
    Sell,
    /// Save now.
    Save,
    /// List commands.
    Help,
    /// Save and exit.
    Quit,
}

/// Why a line did not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command {input:?} (try `help`)")]
    Unknown {
        /// The offending word.
        input: String,
    },

    /// A required argument is missing.
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        /// The command.
        command: &'static str,
        /// What it needed.
        expected: &'static str,
    },

    /// A count was not a positive whole number.
    #[error("expected a positive whole number, got {value:?}")]
    BadCount {
        /// The rejected text.
        value: String,
    },

    /// A species name was not recognised.
    #[error(transparent)]
    BadSpecies(#[from] ParseEnumError),
}

/// Help text for `help`.
pub const HELP: &str = "\
commands:
  <enter> | a      one activity unit
  a N              N activity units
  skip H           jump H hours
  status           show the farm
  build SPECIES    buy housing (chicken, pig, cow)
  buy SPECIES      buy an animal
  feed SPECIES N   buy N units of feed
  sell             sell all goods
  save             save now
  quit             save and exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Activity(1));
        };
        let mut arg = |command: &'static str, expected: &'static str| {
            words
                .next()
                .ok_or(CommandError::MissingArgument { command, expected })
        };

        match head.to_ascii_lowercase().as_str() {
            "a" | "activity" => arg("a", "a count").map_or(Ok(Self::Activity(1)), |count| {
                count_of(count).map(Self::Activity)
            }),
            "skip" => Ok(Self::Skip(count_of(arg("skip", "a number of hours")?)?)),
            "status" | "s" => Ok(Self::Status),
            "build" => Ok(Self::Build(arg("build", "a species")?.parse()?)),
            "buy" => Ok(Self::Buy(arg("buy", "a species")?.parse()?)),
            "feed" => {
                let species = arg("feed", "a species and a count")?.parse()?;
                let units = count_of(arg("feed", "a count")?)?;
                Ok(Self::Feed(species, units))
            }
            "sell" => Ok(Self::Sell),
            "save" => Ok(Self::Save),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown {
                input: head.to_owned(),
            }),
        }
    }
}

fn count_of(text: &str) -> Result<u64, CommandError> {
    match text.parse::<u64>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(CommandError::BadCount {
            value: text.to_owned(),
        }),
    }
}
