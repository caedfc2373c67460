//! Fixed member roster.
//!
//! # Responsibility
//! - Hold the configured, ordered list of member display names.
//! - Answer membership questions for strict sign-in validation.
//!
//! # Invariants
//! - Names are trimmed, non-empty and unique; first occurrence wins.
//! - Configured order is preserved for statistics output.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Roster construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    Empty,
    BlankName { index: usize },
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "roster must contain at least one member"),
            Self::BlankName { index } => write!(f, "roster entry #{index} is blank"),
        }
    }
}

impl Error for RosterError {}

/// Ordered set of known member names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberRoster {
    members: Vec<String>,
}

impl MemberRoster {
    /// Builds a roster from configured names.
    ///
    /// # Errors
    /// - `Empty` when no names are given.
    /// - `BlankName` when any entry is blank after trimming.
    pub fn new<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut members: Vec<String> = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            let trimmed = name.as_ref().trim();
            if trimmed.is_empty() {
                return Err(RosterError::BlankName { index });
            }
            if !members.iter().any(|existing| existing == trimmed) {
                members.push(trimmed.to_string());
            }
        }

        if members.is_empty() {
            return Err(RosterError::Empty);
        }
        Ok(Self { members })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.iter().any(|member| member == name)
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
