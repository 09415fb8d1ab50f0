// src/core/cube.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scalar the host serializes as either a string or a boolean.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Flag(bool),
    Text(String),
}

/// One entry of a parameter's option list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameValue {
    #[serde(rename = "Name")]
    pub name: Scalar,
    #[serde(rename = "Value")]
    pub value: Scalar,
}

/// The value slot of a parameter: a bare scalar, a single name/value
/// pair, or a list of pairs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Text(String),
    Single(NameValue),
    Many(Vec<NameValue>),
}

impl Default for ParameterValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// A configuration slot belonging to a cube.
///
/// Every field is optional on the wire: the host routinely sends partial
/// parameter records, and the response document carries partial overrides.
/// Absent fields stay `None` instead of being coalesced at each use site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowParameter {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "DisplayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<ParameterValue>,
    #[serde(rename = "DefaultValue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<ParameterValue>,
    #[serde(rename = "IsSingleValue", skip_serializing_if = "Option::is_none")]
    pub is_single_value: Option<bool>,
    #[serde(rename = "IsRequired", skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "HiddenFromUser", skip_serializing_if = "Option::is_none")]
    pub hidden_from_user: Option<bool>,
    #[serde(rename = "HideFromList", skip_serializing_if = "Option::is_none")]
    pub hide_from_list: Option<String>,
    #[serde(rename = "AutoCompleteProvider", skip_serializing_if = "Option::is_none")]
    pub auto_complete_provider: Option<String>,
    #[serde(rename = "OptionsProvider", skip_serializing_if = "Option::is_none")]
    pub options_provider: Option<String>,
    #[serde(rename = "Options", skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NameValue>>,
    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "ParameterSubtitle", skip_serializing_if = "Option::is_none")]
    pub parameter_subtitle: Option<String>,
    // lowercase on the wire, unlike its siblings
    #[serde(rename = "visible", skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(rename = "Role", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "OntologyType", skip_serializing_if = "Option::is_none")]
    pub ontology_type: Option<Value>,
    #[serde(
        rename = "IsServerFilterAutoComplete",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_server_filter_auto_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FlowParameter {
    /// The name a user sees for this parameter: `DisplayName` when present
    /// and non-empty, then `Name`, then nothing.
    pub fn display_label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
    }
}

/// An output field descriptor attached to a cube or a response document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Field {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "Type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(rename = "OntologyType", skip_serializing_if = "Option::is_none")]
    pub ontology_type: Option<String>,
    #[serde(rename = "GeoContent", skip_serializing_if = "Option::is_none")]
    pub geo_content: Option<bool>,
    #[serde(rename = "ShowOnGrid", skip_serializing_if = "Option::is_none")]
    pub show_on_grid: Option<bool>,
    #[serde(rename = "Attributes", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CubeMetadata {
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Tags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "DataStore", skip_serializing_if = "Option::is_none")]
    pub data_store: Option<String>,
    #[serde(rename = "CategoriesOrder", skip_serializing_if = "Option::is_none")]
    pub categories_order: Option<String>,
    #[serde(rename = "OwnerEmail", skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

/// An opaque unit of configuration supplied by the host: a connected data
/// query or a registered tool. The widget treats it as read-only and only
/// attaches side-channel annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlowCube {
    pub id: String,
    #[serde(rename = "UniqueName")]
    pub unique_name: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Type")]
    pub cube_type: String,
    #[serde(rename = "Parameters")]
    pub parameters: Vec<FlowParameter>,
    #[serde(rename = "Fields")]
    pub fields: Vec<Field>,
    #[serde(rename = "Metadata")]
    pub metadata: CubeMetadata,
    #[serde(rename = "Processes")]
    pub processes: Vec<Value>,
    #[serde(rename = "ViewConfig")]
    pub view_config: Value,
    #[serde(rename = "SavedProperties")]
    pub saved_properties: Value,
}

impl FlowCube {
    /// The display name the rest of the system keys on: `Name`, falling
    /// back to the machine name when empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.unique_name
        } else {
            &self.name
        }
    }

    /// Tool cubes carry a `tool-` id prefix; everything else is a
    /// connected query.
    pub fn is_tool(&self) -> bool {
        self.id.starts_with("tool-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn cube_deserializes_from_host_payload() {
        let raw = json!({
            "id": "tool-data-analyzer",
            "UniqueName": "data_analyzer",
            "Name": "Data Analyzer",
            "Description": "Analyze data patterns and generate insights",
            "Type": "query",
            "Parameters": [
                {
                    "Name": "data_source",
                    "DisplayName": "Data Source",
                    "Type": "String",
                    "IsSingleValue": true,
                    "IsRequired": true,
                    "Description": "Select the data source to analyze",
                    "Options": [],
                    "Category": "Input",
                    "Value": "",
                    "visible": true,
                    "Role": "",
                    "OntologyType": null,
                    "IsServerFilterAutoComplete": false
                }
            ],
            "Fields": [],
            "Metadata": { "Owner": "system" },
            "Processes": [],
            "ViewConfig": {},
            "SavedProperties": {}
        });

        let cube: FlowCube = serde_json::from_value(raw).unwrap();
        assert_eq!(cube.display_name(), "Data Analyzer");
        assert!(cube.is_tool());
        assert_eq!(cube.parameters.len(), 1);
        assert_eq!(cube.parameters[0].display_label(), Some("Data Source"));
        assert_eq!(cube.parameters[0].visible, Some(true));
    }

    #[test]
    fn display_name_falls_back_to_unique_name() {
        let cube = FlowCube {
            id: "q1".to_string(),
            unique_name: "orders_by_region".to_string(),
            ..Default::default()
        };
        assert_eq!(cube.display_name(), "orders_by_region");
        assert!(!cube.is_tool());
    }

    #[test]
    fn parameter_label_falls_back_to_machine_name() {
        let named = FlowParameter {
            name: Some("x_axis".to_string()),
            display_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(named.display_label(), Some("x_axis"));

        let anonymous = FlowParameter::default();
        assert_eq!(anonymous.display_label(), None);
    }

    #[test]
    fn parameter_value_accepts_all_wire_shapes() {
        let flag: ParameterValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(flag, ParameterValue::Flag(true));

        let text: ParameterValue = serde_json::from_value(json!("bar")).unwrap();
        assert_eq!(text, ParameterValue::Text("bar".to_string()));

        let many: ParameterValue =
            serde_json::from_value(json!([{ "Name": "a", "Value": "1" }])).unwrap();
        assert!(matches!(many, ParameterValue::Many(ref list) if list.len() == 1));
    }
}
