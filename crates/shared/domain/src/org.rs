//! Org-structure and app event payloads.

use std::borrow::Cow;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::constants::{ORG_TYPE_CONTACTOR, ORG_TYPE_DEPARTMENT, ORG_TYPE_GROUP, ORG_TYPE_USER};

/// Kind of org object an event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgObjectType {
    User,
    Department,
    Group,
    Contactor,
    Other(String),
}

impl From<&str> for OrgObjectType {
    fn from(s: &str) -> Self {
        match s {
            ORG_TYPE_USER => OrgObjectType::User,
            ORG_TYPE_DEPARTMENT => OrgObjectType::Department,
            ORG_TYPE_GROUP => OrgObjectType::Group,
            ORG_TYPE_CONTACTOR => OrgObjectType::Contactor,
            other => OrgObjectType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for OrgObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrgObjectType::User => write!(f, "{}", ORG_TYPE_USER),
            OrgObjectType::Department => write!(f, "{}", ORG_TYPE_DEPARTMENT),
            OrgObjectType::Group => write!(f, "{}", ORG_TYPE_GROUP),
            OrgObjectType::Contactor => write!(f, "{}", ORG_TYPE_CONTACTOR),
            OrgObjectType::Other(other) => write!(f, "{}", other),
        }
    }
}

/// Event carrying a single object ID (user, department or app deleted)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IdEvent {
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
}

/// Event carrying a list of object IDs
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IdsEvent {
    #[validate(custom(function = "validate_ids"))]
    pub ids: Vec<String>,
}

/// Reject ID lists containing an empty ID. An empty list is allowed.
pub fn validate_ids(ids: &[String]) -> Result<(), ValidationError> {
    if ids.iter().any(String::is_empty) {
        let mut err = ValidationError::new("empty_id");
        err.message = Some(Cow::Borrowed("ids cannot contain an empty id"));
        return Err(err);
    }
    Ok(())
}

/// Org object renamed
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrgNameChangedEvent {
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "new_name cannot be empty"))]
    pub new_name: String,
    #[serde(rename = "type")]
    pub object_type: String,
}

impl OrgNameChangedEvent {
    pub fn object_type(&self) -> OrgObjectType {
        OrgObjectType::from(self.object_type.as_str())
    }
}

/// App renamed
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppRenamedEvent {
    #[validate(length(min = 1, message = "id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "new_name cannot be empty"))]
    pub new_name: String,
}
