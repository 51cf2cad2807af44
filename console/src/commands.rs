//! Console command parsing.

use kinxplore_bookings::board::BoardAction;
use kinxplore_bookings::projection::PriorityFilter;
use kinxplore_bookings::{BookingId, BookingStatus, Priority};
use std::str::FromStr;

/// Shown for `help` and after a parse error
pub const HELP: &str = "\
Commands:
  open <id>              show a booking
  close                  close the detail panel
  status <status>        set status (pending, confirmed, cancelled, completed)
  priority <priority>    edit draft priority (low, medium, high, urgent)
  notes <text>           edit draft notes (empty clears)
  save                   save draft priority and notes
  delete                 delete the open booking
  search <text>          filter cards by name, email or destination (empty clears)
  filter <priority|all>  filter cards by priority
  refresh                reload bookings and statistics
  stats                  print statistics
  help                   show this help
  quit                   exit";

/// A parsed console line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show a booking
    Open(BookingId),
    /// Close the detail panel
    Close,
    /// Commit a status change
    Status(BookingStatus),
    /// Edit draft priority
    Priority(Priority),
    /// Edit draft notes
    Notes(String),
    /// Save the draft
    Save,
    /// Delete the open booking
    Delete,
    /// Set the search text
    Search(String),
    /// Set the priority facet
    Filter(PriorityFilter),
    /// Reload from the backend
    Refresh,
    /// Print statistics
    Stats,
    /// Print help
    Help,
    /// Exit
    Quit,
}

/// Reasons a line is not a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Blank line
    #[error("Empty command")]
    Empty,

    /// First word is not a command
    #[error("Unknown command '{0}'")]
    Unknown(String),

    /// Command needs an argument
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    /// Argument does not parse
    #[error("{0}")]
    InvalidArgument(String),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "open" => Ok(Self::Open(BookingId::new(argument("open")?))),
            "close" => Ok(Self::Close),
            "status" => argument("status")?
                .parse()
                .map(Self::Status)
                .map_err(ParseError::InvalidArgument),
            "priority" => argument("priority")?
                .parse()
                .map(Self::Priority)
                .map_err(ParseError::InvalidArgument),
            "notes" => Ok(Self::Notes(rest.to_string())),
            "save" => Ok(Self::Save),
            "delete" => Ok(Self::Delete),
            "search" => Ok(Self::Search(rest.to_string())),
            "filter" => parse_filter(argument("filter")?).map(Self::Filter),
            "refresh" => Ok(Self::Refresh),
            "stats" => Ok(Self::Stats),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_filter(raw: &str) -> Result<PriorityFilter, ParseError> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(PriorityFilter::All);
    }
    raw.parse()
        .map(PriorityFilter::Only)
        .map_err(ParseError::InvalidArgument)
}

impl Command {
    /// Board action for commands the board handles
    ///
    /// `None` for commands the console runs itself.
    #[must_use]
    pub fn into_action(self) -> Option<BoardAction> {
        match self {
            Self::Open(booking_id) => Some(BoardAction::Open { booking_id }),
            Self::Close => Some(BoardAction::Close),
            Self::Status(status) => Some(BoardAction::ChangeStatus { status }),
            Self::Priority(priority) => Some(BoardAction::EditPriority { priority }),
            Self::Notes(notes) => Some(BoardAction::EditNotes { notes }),
            Self::Save => Some(BoardAction::Save),
            Self::Delete => Some(BoardAction::Delete),
            Self::Search(query) => Some(BoardAction::SetSearch { query }),
            Self::Filter(filter) => Some(BoardAction::SetPriorityFilter { filter }),
            Self::Refresh | Self::Stats | Self::Help | Self::Quit => None,
        }
    }
}
