use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Verification state of an ownership claim.
///
/// Only verified claims make a pitch count as claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    #[default]
    Verified,
    Rejected,
}

impl ClaimStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown claim status strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown claim status '{0}': expected pending, verified, or rejected")]
pub struct ParseClaimStatusError(pub String);

impl FromStr for ClaimStatus {
    type Err = ParseClaimStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseClaimStatusError(other.to_string())),
        }
    }
}

/// A user's ownership claim on a pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub pitch_id: String,
    pub user_id: String,
    pub status: ClaimStatus,
    pub claimed_at_us: i64,
    pub updated_at_us: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_status() {
        for status in [ClaimStatus::Pending, ClaimStatus::Verified, ClaimStatus::Rejected] {
            assert_eq!(status.as_str().parse::<ClaimStatus>(), Ok(status));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(" Verified ".parse::<ClaimStatus>(), Ok(ClaimStatus::Verified));
        assert!("approved".parse::<ClaimStatus>().is_err());
    }

    #[test]
    fn default_is_verified() {
        assert_eq!(ClaimStatus::default(), ClaimStatus::Verified);
    }
}
