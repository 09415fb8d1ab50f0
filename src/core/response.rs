// src/core/response.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::cube::{Field, FlowParameter};

/// User-authored annotations, keyed by an item's display name.
pub type DescriptionMap = BTreeMap<String, DescriptionEntry>;

/// A free-text note for one item plus notes for its parameters, the
/// latter keyed by parameter display name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DescriptionEntry {
    #[serde(rename = "queryDescription")]
    pub note: String,
    pub parameters: BTreeMap<String, String>,
}

impl DescriptionEntry {
    pub fn is_empty(&self) -> bool {
        self.note.is_empty() && self.parameters.is_empty()
    }
}

/// The document posted back to the host on save.
///
/// The four leading fields are the legacy substructure used for direct
/// mutation of the underlying node's own parameters; the optional slots
/// carry the widget-level state. Older saved documents name the
/// description slots `userDescriptions`/`toolDescriptions`, hence the
/// aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowResponse {
    #[serde(rename = "Parameters")]
    pub parameters: Vec<FlowParameter>,
    #[serde(rename = "Fields")]
    pub fields: Vec<Field>,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "iframeFieldsToFilter")]
    pub iframe_fields_to_filter: BTreeMap<String, String>,
    #[serde(
        rename = "connectedCubesDescriptions",
        alias = "userDescriptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_cubes_descriptions: Option<DescriptionMap>,
    #[serde(
        rename = "toolCubeDescriptions",
        alias = "toolDescriptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_cube_descriptions: Option<DescriptionMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// Serializer for the minimal projection: only slots that hold values
/// appear as keys, and the legacy substructure is omitted entirely.
#[derive(Serialize)]
struct MinimalResponse<'a> {
    #[serde(
        rename = "connectedCubesDescriptions",
        skip_serializing_if = "Option::is_none"
    )]
    connected_cubes_descriptions: Option<&'a DescriptionMap>,
    #[serde(
        rename = "toolCubeDescriptions",
        skip_serializing_if = "Option::is_none"
    )]
    tool_cube_descriptions: Option<&'a DescriptionMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a str>,
}

impl FlowResponse {
    /// JSON encoding of the full document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// JSON encoding of the minimal projection: empty maps and empty
    /// strings count as unset and produce no key at all.
    pub fn to_minimal_json(&self) -> Result<String, serde_json::Error> {
        let minimal = MinimalResponse {
            connected_cubes_descriptions: self
                .connected_cubes_descriptions
                .as_ref()
                .filter(|map| !map.is_empty()),
            tool_cube_descriptions: self
                .tool_cube_descriptions
                .as_ref()
                .filter(|map| !map.is_empty()),
            prompt: self.prompt.as_deref().filter(|s| !s.is_empty()),
            plan: self.plan.as_deref().filter(|s| !s.is_empty()),
        };
        serde_json::to_string(&minimal)
    }

    /// A patch view of the legacy substructure, for replaying a saved
    /// document into a builder.
    pub fn as_patch(&self) -> ResponsePatch {
        ResponsePatch {
            parameters: Some(self.parameters.clone()),
            fields: Some(self.fields.clone()),
            display_name: Some(self.display_name.clone()),
            iframe_fields_to_filter: Some(self.iframe_fields_to_filter.clone()),
        }
    }
}

/// A partial response document, as delivered in the host's `query`
/// snapshot. Absent fields stay `None` so overlay loading can tell
/// "not present" apart from "present but empty".
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResponsePatch {
    #[serde(rename = "Parameters")]
    pub parameters: Option<Vec<FlowParameter>>,
    #[serde(rename = "Fields")]
    pub fields: Option<Vec<Field>>,
    #[serde(rename = "DisplayName")]
    pub display_name: Option<String>,
    #[serde(rename = "iframeFieldsToFilter")]
    pub iframe_fields_to_filter: Option<BTreeMap<String, String>>,
}
