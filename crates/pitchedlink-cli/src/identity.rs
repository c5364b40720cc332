//! User identity resolution for clap and claim commands.
//!
//! The resolution chain: `--user` flag > `PITCHED_USER` env > `user` in the
//! user config file > `USER` env (TTY only). Read-only commands never need
//! an identity.

use std::env;

/// Error returned when no identity can be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("User identity required for this command. Set --user or PITCHED_USER.")]
pub struct MissingUser;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve_user_with(
    cli_flag: Option<&str>,
    config_user: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(user) = non_blank(cli_flag) {
        return Some(user);
    }

    if let Some(user) = env.get("PITCHED_USER") {
        return Some(user.trim().to_string());
    }

    if let Some(user) = non_blank(config_user) {
        return Some(user);
    }

    if env.is_tty() {
        return env.get("USER").map(|u| u.trim().to_string());
    }

    None
}

/// Identity inputs gathered from the command line and user config.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSources<'a> {
    pub flag: Option<&'a str>,
    pub config: Option<&'a str>,
}

impl UserSources<'_> {
    /// Resolve the acting user, or `None` when nothing is configured.
    pub fn resolve(self) -> Option<String> {
        resolve_user_with(self.flag, self.config, &RealEnv)
    }

    /// Resolve the acting user for a mutating command.
    ///
    /// # Errors
    ///
    /// Returns [`MissingUser`] when no source yields a non-blank identity.
    pub fn require(self) -> Result<String, MissingUser> {
        self.resolve().ok_or(MissingUser)
    }
}
