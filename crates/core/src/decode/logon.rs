//! `$`-delimited logon credential payloads.

use serde::{Deserialize, Serialize};

/// Server/database/credential bundle decoded from a logon payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogonInfo {
    /// Server (or DSN) name, trimmed.
    pub server_name: String,
    /// Database name, trimmed.
    pub database_name: String,
    /// User id, untrimmed; present only when the payload has at least
    /// four fields.
    pub user_id: Option<String>,
    /// Password, untrimmed; present only when the payload has at least
    /// four fields.
    pub password: Option<String>,
}

impl LogonInfo {
    /// Decode a `server$database[$user$password]` payload.
    ///
    /// Fewer than two `$`-separated fields is not a credential bundle and
    /// yields `None`. A third field without a fourth is tolerated but
    /// ignored. No further validation is performed.
    pub fn decode(payload: &str) -> Option<Self> {
        let parts: Vec<&str> = payload.split('$').collect();
        if parts.len() < 2 {
            return None;
        }
        let (user_id, password) = if parts.len() >= 4 {
            (Some(parts[2].to_owned()), Some(parts[3].to_owned()))
        } else {
            (None, None)
        };
        Some(Self {
            server_name: parts[0].trim().to_owned(),
            database_name: parts[1].trim().to_owned(),
            user_id,
            password,
        })
    }
}
