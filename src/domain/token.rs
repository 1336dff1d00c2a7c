// Access token domain model
use std::fmt;

/// Opaque tenant token taken from the `token` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns `None` for an absent or blank token.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let value = raw?.trim();
        if value.is_empty() {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens end up in logs, only show a prefix.
impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "{}…", prefix)
    }
}
