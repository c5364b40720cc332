use std::fmt;

/// Machine-readable error codes for scripts and agents driving the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    PitchNotFound,
    AmbiguousId,
    DuplicatePitch,
    InvalidUser,
    CategoryNotFound,
    InvalidIngestPayload,
    CorruptStore,
    StoreBusy,
    StoreWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PitchNotFound => "E2001",
            Self::AmbiguousId => "E2002",
            Self::DuplicatePitch => "E2003",
            Self::InvalidUser => "E2004",
            Self::CategoryNotFound => "E2005",
            Self::InvalidIngestPayload => "E3001",
            Self::CorruptStore => "E4001",
            Self::StoreBusy => "E5001",
            Self::StoreWriteFailed => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::PitchNotFound => "Pitch not found",
            Self::AmbiguousId => "Ambiguous pitch ID",
            Self::DuplicatePitch => "Pitch already exists",
            Self::InvalidUser => "Invalid user identity",
            Self::CategoryNotFound => "Category not found",
            Self::InvalidIngestPayload => "Invalid ingestion payload",
            Self::CorruptStore => "Corrupt pitch store",
            Self::StoreBusy => "Pitch store is busy",
            Self::StoreWriteFailed => "Pitch store write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `pl init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .pitched/config.toml and retry."),
            Self::PitchNotFound => Some("Use `pl list` to see available pitches."),
            Self::AmbiguousId => Some("Use a longer pitch ID prefix to disambiguate."),
            Self::DuplicatePitch => Some("Use `pl ingest` to merge mentions into the existing pitch."),
            Self::InvalidUser => Some("Pass --user or set PITCHED_USER to a non-empty name."),
            Self::CategoryNotFound => Some("Use `pl categories` to see known category slugs."),
            Self::InvalidIngestPayload => {
                Some("Provide a JSON array of objects with meta_data.final_url set.")
            }
            Self::CorruptStore => Some("Run `pl rebuild` to recompute cached pitch fields."),
            Self::StoreBusy => Some("Retry after the other `pl` process finishes its write."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
