use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ordered, duplicate-free set of the user's subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectSet {
    names: Vec<String>,
}

impl SubjectSet {
    /// Build from a stored list, dropping blanks and repeats.
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self::default();
        for name in names {
            let _ = set.add(&name);
        }
        set
    }

    /// Add a subject. Returns the trimmed name that was stored.
    pub fn add(&mut self, name: &str) -> Result<String, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        if self.contains(trimmed) {
            return Err(ValidationError::DuplicateSubject(trimmed.to_string()));
        }
        self.names.push(trimmed.to_string());
        Ok(trimmed.to_string())
    }

    /// Returns whether the subject was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.clone()
    }
}
