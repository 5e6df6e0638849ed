//! Utilities to help with API request validation.

use derive_more::derive::{AsRef, Deref, Display};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use strum_macros::{AsRefStr, EnumString};
use thiserror::Error;

/// The primary key of any row.
///
/// Deserializes from either a JSON number or a numeric string, since IDs arrive both in JSON
/// bodies and in query strings.
#[serde_as]
#[derive(
    Deserialize,
    Serialize,
    sqlx::Type,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EntityId(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] pub i32);

impl EntityId {
    /// Checks a required ID field, returning `None` if it's absent or can't name a row.
    pub fn required(id: Option<Self>) -> Option<Self> {
        id.filter(|id| id.0 > 0)
    }
}

/// A [`String`] with surrounding whitespace trimmed that is guaranteed not to be empty.
#[derive(Deref, AsRef, Display, Clone, PartialEq, Eq, Hash, Debug)]
#[as_ref(forward)]
pub struct NonBlank(String);

impl NonBlank {
    /// Trims a field's value, returning `None` if the field is absent or only whitespace.
    pub fn trimmed(value: Option<String>) -> Option<Self> {
        let value = value?;
        let trimmed = value.trim();

        if trimmed.is_empty() {
            None
        } else if trimmed.len() == value.len() {
            Some(Self(value))
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Keeps a field's value exactly as sent, returning `None` if it's absent or empty.
    ///
    /// Used for secrets, where whitespace is significant.
    pub fn verbatim(value: Option<String>) -> Option<Self> {
        value.filter(|value| !value.is_empty()).map(Self)
    }

    /// Gets a reference to the wrapped string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the [`NonBlank`], returning the wrapped [`String`].
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Whether a forum topic accepts new replies.
#[derive(
    EnumString,
    AsRefStr,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    /// The topic accepts replies. New topics start open.
    #[default]
    Open,

    /// The topic was closed by a moderator or its author.
    Closed,
}

/// An error decoding a stored [`TopicStatus`].
#[derive(Error, Debug)]
#[error("unknown topic status {0:?}")]
pub struct UnknownTopicStatus(String);

impl TryFrom<String> for TopicStatus {
    type Error = UnknownTopicStatus;

    fn try_from(status: String) -> Result<Self, Self::Error> {
        status.parse().map_err(|_| UnknownTopicStatus(status))
    }
}
