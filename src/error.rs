use std::path::PathBuf;

/// Failures the setup workflow reports by name.
///
/// Anything not listed here travels as a plain `anyhow::Error` with context.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("this command must be run as root")]
    NotPrivileged,

    #[error("base backup from the primary failed (exit status {code:?})")]
    BaseBackupFailed { code: Option<i32> },

    #[error("`{command}` failed (exit status {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("refusing to overwrite existing backup directory {0}")]
    BackupPathExists(PathBuf),

    #[error("operating system user `{0}` does not exist")]
    UnknownOsUser(String),
}
