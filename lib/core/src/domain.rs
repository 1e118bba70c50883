use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// Separator between the two ids of a serialized pair key.
pub const PAIR_DELIMITER: char = '|';

/// A news topic node in the domain tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub name: String,
    /// `None` marks a root
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Domain {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            description: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, None)
    }

    #[inline]
    #[must_use]
    pub fn child(id: impl Into<String>, name: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::new(id, name, Some(parent_id.into()))
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Text handed to the vector source when embedding this domain
    pub fn descriptive_text(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.name, desc),
            _ => self.name.clone(),
        }
    }

    /// Check the id and name of this domain, independent of any tree.
    ///
    /// Parent links are not followed here; loops are caught by ancestry walks.
    pub fn validate(&self) -> Result<()> {
        validate_id(&self.id)?;
        if let Some(parent) = &self.parent_id {
            validate_id(parent)?;
        }
        if self.name.trim().is_empty() {
            return Err(Error::InvalidDomain(format!("domain {} has an empty name", self.id)));
        }
        Ok(())
    }
}

/// Ids must be non-empty and must not contain the pair delimiter, otherwise
/// `"a|b"` keys could not be split back unambiguously.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(PAIR_DELIMITER) {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Request to register a new domain; the store assigns the id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDomain {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewDomain {
    pub fn new(name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent_id,
            description: None,
        }
    }

    pub fn into_domain(self, id: String) -> Domain {
        Domain {
            id,
            name: self.name.trim().to_string(),
            parent_id: self.parent_id.filter(|p| !p.is_empty()),
            description: self.description.filter(|d| !d.trim().is_empty()),
        }
    }
}
