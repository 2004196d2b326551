//! Parsing of command-loop input.

use std::fmt;

/// A note addressed by id or by its position in the last rendered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteRef {
    Id(String),
    /// 1-based position, written `#n`.
    Index(usize),
}

impl fmt::Display for NoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.write_str(id),
            Self::Index(n) => write!(f, "#{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SignUp {
        email: String,
        password: String,
        confirm_password: String,
    },
    LogIn {
        email: String,
        password: String,
    },
    LogOut,
    List,
    Refresh,
    Show(NoteRef),
    New,
    Edit(NoteRef),
    Delete(NoteRef),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command `{0}`. Type `help` for a list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("`{0}` is not a valid note number")]
    BadIndex(String),
}

pub const HELP: &str = "\
Commands:
  signup <email> <password> <confirm>   create an account
  login <email> <password>              sign in
  logout                                sign out
  list                                  show your notes
  refresh                               reload notes from the server
  show <id|#n>                          show one note
  new                                   create a note
  edit <id|#n>                          edit a note
  delete <id|#n>                        delete a note
  help                                  show this help
  quit                                  exit";

impl Command {
    /// Parse one input line. Returns `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("signup", [email, password, confirm]) => Self::SignUp {
                email: email.to_string(),
                password: password.to_string(),
                confirm_password: confirm.to_string(),
            },
            ("signup", _) => return Err(CommandError::Usage("signup <email> <password> <confirm>")),
            ("login", [email, password]) => Self::LogIn {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("login", _) => return Err(CommandError::Usage("login <email> <password>")),
            ("logout", []) => Self::LogOut,
            ("list" | "ls", []) => Self::List,
            ("refresh", []) => Self::Refresh,
            ("show", [target]) => Self::Show(parse_ref(target)?),
            ("show", _) => return Err(CommandError::Usage("show <id|#n>")),
            ("new", []) => Self::New,
            ("edit", [target]) => Self::Edit(parse_ref(target)?),
            ("edit", _) => return Err(CommandError::Usage("edit <id|#n>")),
            ("delete" | "rm", [target]) => Self::Delete(parse_ref(target)?),
            ("delete" | "rm", _) => return Err(CommandError::Usage("delete <id|#n>")),
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    /// `true` for commands that need a signed-in user.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Self::LogOut
                | Self::List
                | Self::Refresh
                | Self::Show(_)
                | Self::New
                | Self::Edit(_)
                | Self::Delete(_)
        )
    }
}

fn parse_ref(word: &str) -> Result<NoteRef, CommandError> {
    match word.strip_prefix('#') {
        Some(n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(NoteRef::Index(n)),
            _ => Err(CommandError::BadIndex(word.to_string())),
        },
        None => Ok(NoteRef::Id(word.to_string())),
    }
}
