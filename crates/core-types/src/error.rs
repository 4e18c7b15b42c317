use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("No command matches input '{0}'")]
    NotFound(String),

    #[error("Command '{0}' has no display label configured")]
    MissingLabel(String),

    #[error("Command code {0} is declared more than once")]
    DuplicateCode(i32),
}
