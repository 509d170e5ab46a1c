use crate::document_model::Tag;
use thiserror::Error;

/// Everything that can abort a single editor command.
///
/// None of these are fatal: the session reports the error and reads the
/// next command. Whatever returned the error has left the document and the
/// undo buffers untouched.
#[derive(Debug, Error)]
pub enum EdError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("address out of range")]
    AddressOutOfRange,

    #[error("addresses out of order: {from},{to} (did you mean {to},{from}?)")]
    AddressOrder { from: usize, to: usize },

    #[error("mark not set: '{0}'")]
    UnsetMark(char),

    #[error("invalid mark character: '{0}' (marks must be between '!' and '~')")]
    InvalidMark(char),

    #[error("no match")]
    NoMatch,

    #[error("no previous pattern")]
    NoPreviousPattern,

    #[error("no previous substitution")]
    NoPreviousSubstitution,

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("unterminated {0}")]
    Unterminated(&'static str),

    #[error("unknown command: '{0}'")]
    UnknownCommand(char),

    #[error("invalid command suffix")]
    InvalidSuffix,

    #[error("invalid destination")]
    InvalidDestination,

    #[error("cannot nest global commands")]
    NestedGlobal,

    #[error("command not allowed inside a global command list")]
    NotInGlobal,

    #[error("already at the latest change")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("undo history does not match a '{0}' step")]
    CorruptHistory(Tag),

    #[error("cut buffer is empty")]
    EmptyCutBuffer,

    #[error("no write since last change (use '{0}' to override)")]
    UnsavedChanges(char),

    #[error("no current filename")]
    NoFilename,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("shell command failed: {0}")]
    Shell(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EdResult<T> = Result<T, EdError>;

impl From<regex::Error> for EdError {
    fn from(e: regex::Error) -> Self {
        EdError::InvalidPattern(e.to_string())
    }
}
