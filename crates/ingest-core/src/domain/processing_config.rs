//! Processing configuration form fields (already localised for the caller).

use serde::{Deserialize, Serialize};

/// The chain link a choice applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliesTo {
    pub link_id: String,
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChoice {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub applies_to: Vec<AppliesTo>,
}

/// One field of the processing configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigField {
    pub id: String,
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub choices: Vec<ConfigChoice>,
}
