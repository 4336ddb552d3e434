use std::fmt::Display;
use std::io::ErrorKind;

/// Well-defined errors for the utility. All of them map to a nonzero process
/// exit, but carrying the category around makes the failure messages and the
/// tests a lot less vague than a bare io::Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    GeneralFailure = 1,
    BadCliArguments = 2,
    FileNotFound = 3,
    OsError = 4,
}

impl ExitCode {
    /// the process exit value reported for this category. The CLI contract
    /// is 0 on success and -1 on any startup failure.
    pub fn as_process_code(&self) -> i32 {
        -1
    }
}

#[derive(Debug, Clone)]
pub struct DmcError {
    exit_code: ExitCode,
    message: String,
}

impl Display for DmcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error code: {:?} {}", self.exit_code, self.message)
    }
}

impl std::error::Error for DmcError {}

impl DmcError {
    pub fn new(exit_code: ExitCode, message: &str) -> DmcError {
        DmcError {
            exit_code,
            message: message.to_owned(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }
}

impl From<std::io::Error> for DmcError {
    fn from(e: std::io::Error) -> Self {
        let exit_code = match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => ExitCode::FileNotFound,
            _ => ExitCode::OsError,
        };

        DmcError::new(exit_code, &e.to_string())
    }
}
