use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallerError {
    #[error("version specifier is empty")]
    EmptyVersion,
}
