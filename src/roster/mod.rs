//! Responder roster
//!
//! The roster is the ordered list of people who take weekend/holiday
//! on-call duty. Order is significant: it is the rotation order the
//! scheduler walks through, so it comes from configuration and is never
//! derived from stored assignments.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Errors raised while building a roster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// Roster has no responders
    #[error("Roster must contain at least one responder")]
    Empty,

    /// Two responders share a display name
    #[error("Duplicate responder name in roster: {0}")]
    DuplicateName(String),

    /// Responder name is blank
    #[error("Responder name cannot be empty")]
    BlankName,
}

/// A single on-call responder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Responder {
    /// Display name, unique within the roster
    pub name: String,

    /// Messaging handle used for mentions (Slack user or DM id)
    pub slack_id: String,

    /// Phone/contact string shown in reminders
    pub phone: String,
}

impl Responder {
    /// Create a new responder
    pub fn new(
        name: impl Into<String>,
        slack_id: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slack_id: slack_id.into(),
            phone: phone.into(),
        }
    }

    /// Slack mention markup for this responder
    pub fn mention(&self) -> String {
        format!("<@{}>", self.slack_id)
    }
}

impl fmt::Display for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered, non-empty list of responders with unique names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Responder>", into = "Vec<Responder>")]
pub struct Roster {
    responders: Vec<Responder>,
}

impl Roster {
    /// Build a roster, rejecting empty lists and duplicate names
    pub fn new(responders: Vec<Responder>) -> Result<Self, RosterError> {
        if responders.is_empty() {
            return Err(RosterError::Empty);
        }

        let mut seen = HashSet::with_capacity(responders.len());
        for responder in &responders {
            if responder.name.trim().is_empty() {
                return Err(RosterError::BlankName);
            }
            if !seen.insert(responder.name.as_str()) {
                return Err(RosterError::DuplicateName(responder.name.clone()));
            }
        }

        Ok(Self { responders })
    }

    /// Number of responders
    pub fn len(&self) -> usize {
        self.responders.len()
    }

    /// Always false; a roster cannot be constructed empty
    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Responder at a rotation index (wraps modulo roster size)
    pub fn at(&self, index: usize) -> &Responder {
        &self.responders[index % self.responders.len()]
    }

    /// Position of a responder in rotation order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.responders.iter().position(|r| r.name == name)
    }

    /// Look up a responder by name
    pub fn find(&self, name: &str) -> Option<&Responder> {
        self.responders.iter().find(|r| r.name == name)
    }

    /// Index following `index` in rotation order
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.responders.len()
    }

    /// Iterate responders in rotation order
    pub fn iter(&self) -> impl Iterator<Item = &Responder> {
        self.responders.iter()
    }

    /// Responder names in rotation order
    pub fn names(&self) -> Vec<&str> {
        self.responders.iter().map(|r| r.name.as_str()).collect()
    }
}

impl TryFrom<Vec<Responder>> for Roster {
    type Error = RosterError;

    fn try_from(responders: Vec<Responder>) -> Result<Self, Self::Error> {
        Self::new(responders)
    }
}

impl From<Roster> for Vec<Responder> {
    fn from(roster: Roster) -> Self {
        roster.responders
    }
}
