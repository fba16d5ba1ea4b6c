//! Configuration for invitations and slug generation.
//!
//! # Example
//!
//! ```rust
//! use palisade::config::{InviteConfig, PalisadeConfig, SlugConfig};
//!
//! // Use defaults
//! let config = PalisadeConfig::default();
//!
//! // Or customize
//! let config = PalisadeConfig {
//!     invites: InviteConfig {
//!         expiry_days: 14,
//!         join_link_base: "https://app.example.com/join".to_owned(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! ```

use crate::crypto::DEFAULT_TOKEN_LENGTH;

/// Top-level configuration, injected into the actions that need it.
#[derive(Debug, Clone, Default)]
pub struct PalisadeConfig {
    /// Invitation settings.
    pub invites: InviteConfig,
    /// Slug collision-retry settings.
    pub slugs: SlugConfig,
}

impl PalisadeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration suitable for development/testing:
    /// short-lived invites against a localhost join link.
    #[must_use]
    pub fn development() -> Self {
        Self {
            invites: InviteConfig {
                expiry_days: 1,
                token_length: DEFAULT_TOKEN_LENGTH,
                join_link_base: "http://localhost:3000/join".to_owned(),
            },
            slugs: SlugConfig::default(),
        }
    }
}

/// Settings for workspace invitations.
#[derive(Debug, Clone)]
pub struct InviteConfig {
    /// Number of days until an invitation expires. Default: 7.
    pub expiry_days: i64,
    /// Length of generated invite tokens in characters.
    ///
    /// Default is 48 alphanumeric characters (~285 bits of entropy);
    /// going below 44 drops under the 256-bit floor.
    pub token_length: usize,
    /// Base URL the invite token is appended to as a path segment when
    /// building the join link sent to the invitee.
    pub join_link_base: String,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            token_length: DEFAULT_TOKEN_LENGTH,
            join_link_base: "https://app.example.com/join".to_owned(),
        }
    }
}

impl InviteConfig {
    /// The join link for a plain invite token.
    #[must_use]
    pub fn join_link(&self, token: &str) -> String {
        format!("{}/{}", self.join_link_base.trim_end_matches('/'), token)
    }
}

/// Settings for slug collision retry.
#[derive(Debug, Clone)]
pub struct SlugConfig {
    /// Maximum write attempts before giving up on a slug. Each attempt
    /// appends the next numeric suffix; exhausting this bound surfaces an
    /// internal error rather than looping forever.
    pub max_attempts: u32,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self { max_attempts: 64 }
    }
}
