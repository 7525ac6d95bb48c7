//! Activity event kinds.

use std::fmt;
use std::str::FromStr;

use pulse_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::values::Weight;

/// The closed set of activity signals a user can emit against a community.
///
/// `Leave` is the only negative signal; every other kind adds to momentum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Passive view, low signal.
    View,
    /// Strong commitment signal.
    Join,
    /// Negative signal; subtracts from momentum.
    Leave,
    /// High engagement signal.
    Post,
    /// Active participation.
    Comment,
    /// Lightweight engagement.
    Reaction,
    /// Distribution signal.
    Share,
}

impl EventKind {
    /// All kinds, in weight-table order.
    pub const ALL: [EventKind; 7] = [
        Self::View,
        Self::Join,
        Self::Leave,
        Self::Post,
        Self::Comment,
        Self::Reaction,
        Self::Share,
    ];

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Post => "post",
            Self::Comment => "comment",
            Self::Reaction => "reaction",
            Self::Share => "share",
        }
    }

    /// The default momentum weight for this kind.
    ///
    /// Weights reflect relative importance for discovery. `Leave` stores its
    /// magnitude; the sign is applied by the momentum contribution.
    pub fn default_weight(&self) -> Weight {
        let v = match self {
            Self::View => 0.5,
            Self::Reaction => 1.0,
            Self::Leave => 2.0,
            Self::Join => 3.0,
            Self::Comment => 3.0,
            Self::Share => 4.0,
            Self::Post => 5.0,
        };
        // Every entry above sits inside the valid weight range.
        Weight::new(v).unwrap_or_default()
    }

    /// Whether this kind contributes positively to momentum.
    pub fn is_positive_signal(&self) -> bool {
        !matches!(self, Self::Leave)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    /// Case-sensitive parse: only the exact lowercase names are valid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "join" => Ok(Self::Join),
            "leave" => Ok(Self::Leave),
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            "reaction" => Ok(Self::Reaction),
            "share" => Ok(Self::Share),
            other => Err(AppError::invalid_input(format!(
                "invalid event kind: {other}"
            ))),
        }
    }
}
