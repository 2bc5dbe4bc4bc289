use std::{fmt, ops::Deref, str::FromStr};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionIdError {
    #[error("empty action id")]
    Empty,
}

/// Identifier of one configured device-action instance.
///
/// Opaque to the server: it keys both the content registry and the
/// connection tracker, and is embedded verbatim in view and static URLs.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize
)]
#[serde(try_from = "String", into = "String")]
pub struct ActionId(CompactString);

impl ActionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = ActionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl TryFrom<&str> for ActionId {
    type Error = ActionIdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Err(ActionIdError::Empty);
        }
        Ok(Self(s.into()))
    }
}

impl TryFrom<String> for ActionId {
    type Error = ActionIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Err(ActionIdError::Empty);
        }
        Ok(Self(s.into()))
    }
}

impl From<ActionId> for String {
    fn from(id: ActionId) -> Self {
        id.0.into()
    }
}

impl Deref for ActionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
