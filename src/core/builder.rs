// src/core/builder.rs
use std::collections::BTreeMap;

use crate::core::cube::{Field, FlowParameter, NameValue, ParameterValue};
use crate::core::response::{FlowResponse, ResponsePatch};

/// Optional overrides for [`FlowResponseBuilder::add_parameter`]. The
/// identity arguments (name, display name, type, value) are always taken
/// from the call itself and cannot appear here.
#[derive(Debug, Clone, Default)]
pub struct ParameterOverrides {
    pub description: Option<String>,
    pub is_single_value: Option<bool>,
    pub is_required: Option<bool>,
    pub hidden_from_user: Option<bool>,
    pub visible: Option<bool>,
    pub category: Option<String>,
    pub parameter_subtitle: Option<String>,
    pub options: Option<Vec<NameValue>>,
    pub role: Option<String>,
}

/// Accumulates the legacy substructure of a response document across a
/// load → mutate → save cycle. Methods chain and perform no I/O;
/// [`build`](Self::build) snapshots without resetting, so further
/// mutations keep accumulating on top.
#[derive(Debug, Clone, Default)]
pub struct FlowResponseBuilder {
    parameters: Vec<FlowParameter>,
    fields: Vec<Field>,
    display_name: String,
    iframe_fields_to_filter: BTreeMap<String, String>,
}

impl FlowResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlays an existing partial document onto the working state.
    /// Fields present in the patch replace the working copy wholesale;
    /// absent fields keep whatever was accumulated so far. An empty
    /// display name counts as absent.
    pub fn load_from_object(&mut self, patch: &ResponsePatch) -> &mut Self {
        if let Some(parameters) = &patch.parameters {
            self.parameters = parameters.clone();
        }
        if let Some(fields) = &patch.fields {
            self.fields = fields.clone();
        }
        if let Some(display_name) = &patch.display_name {
            if !display_name.is_empty() {
                self.display_name = display_name.clone();
            }
        }
        if let Some(filters) = &patch.iframe_fields_to_filter {
            self.iframe_fields_to_filter = filters.clone();
        }
        self
    }

    /// Appends a parameter. Defaults: hidden from the user, single-value,
    /// required, no description, invisible. Each default is individually
    /// overridable through `overrides`.
    pub fn add_parameter(
        &mut self,
        name: &str,
        display_name: &str,
        param_type: &str,
        value: ParameterValue,
        overrides: ParameterOverrides,
    ) -> &mut Self {
        let parameter = FlowParameter {
            name: Some(name.to_string()),
            display_name: Some(display_name.to_string()),
            param_type: Some(param_type.to_string()),
            value: Some(value),
            hidden_from_user: overrides.hidden_from_user.or(Some(true)),
            is_single_value: overrides.is_single_value.or(Some(true)),
            is_required: overrides.is_required.or(Some(true)),
            visible: overrides.visible.or(Some(false)),
            description: overrides.description,
            category: overrides.category,
            parameter_subtitle: overrides.parameter_subtitle,
            options: overrides.options,
            role: overrides.role,
            ..Default::default()
        };
        self.parameters.push(parameter);
        self
    }

    pub fn add_field(&mut self, name: &str, display_name: &str, field_type: &str) -> &mut Self {
        self.fields.push(Field {
            name: name.to_string(),
            display_name: display_name.to_string(),
            field_type: field_type.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn set_display_name(&mut self, display_name: &str) -> &mut Self {
        self.display_name = display_name.to_string();
        self
    }

    /// Upserts one entry of the field-filter map.
    pub fn add_iframe_field_to_filter(&mut self, field_name: &str, filter_value: &str) -> &mut Self {
        self.iframe_fields_to_filter
            .insert(field_name.to_string(), filter_value.to_string());
        self
    }

    /// First-match lookup by machine name; `None` when no parameter with
    /// that name carries a value.
    pub fn parameter_value(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
            .and_then(|p| p.value.as_ref())
    }

    /// Snapshot of everything accumulated so far.
    pub fn build(&self) -> FlowResponse {
        FlowResponse {
            parameters: self.parameters.clone(),
            fields: self.fields.clone(),
            display_name: self.display_name.clone(),
            iframe_fields_to_filter: self.iframe_fields_to_filter.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_parameter(name: &str) -> FlowParameter {
        FlowParameter {
            name: Some(name.to_string()),
            value: Some(ParameterValue::Text("v".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn load_is_an_overlay_not_a_reset() {
        let mut builder = FlowResponseBuilder::new();
        builder.load_from_object(&ResponsePatch {
            parameters: Some(vec![sample_parameter("p1")]),
            ..Default::default()
        });
        builder.load_from_object(&ResponsePatch {
            display_name: Some("X".to_string()),
            ..Default::default()
        });

        let built = builder.build();
        assert_eq!(built.display_name, "X");
        assert_eq!(built.parameters.len(), 1);
        assert_eq!(built.parameters[0].name.as_deref(), Some("p1"));
    }

    #[test]
    fn empty_display_name_in_patch_is_ignored() {
        let mut builder = FlowResponseBuilder::new();
        builder.set_display_name("kept");
        builder.load_from_object(&ResponsePatch {
            display_name: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(builder.build().display_name, "kept");
    }

    #[test]
    fn add_parameter_applies_defaults_and_overrides() {
        let mut builder = FlowResponseBuilder::new();
        builder.add_parameter(
            "custom_param",
            "Custom Parameter",
            "String",
            ParameterValue::Text("set by widget".to_string()),
            ParameterOverrides {
                is_required: Some(false),
                ..Default::default()
            },
        );

        let built = builder.build();
        let param = &built.parameters[0];
        assert_eq!(param.name.as_deref(), Some("custom_param"));
        assert_eq!(param.hidden_from_user, Some(true));
        assert_eq!(param.is_single_value, Some(true));
        assert_eq!(param.is_required, Some(false));
        assert_eq!(param.visible, Some(false));
        assert_eq!(param.description, None);
    }

    #[test]
    fn parameter_lookup_is_first_match_by_machine_name() {
        let mut builder = FlowResponseBuilder::new();
        builder
            .add_parameter(
                "dup",
                "First",
                "String",
                ParameterValue::Text("one".to_string()),
                ParameterOverrides::default(),
            )
            .add_parameter(
                "dup",
                "Second",
                "String",
                ParameterValue::Text("two".to_string()),
                ParameterOverrides::default(),
            );

        assert_eq!(
            builder.parameter_value("dup"),
            Some(&ParameterValue::Text("one".to_string()))
        );
        assert_eq!(builder.parameter_value("missing"), None);
    }

    #[test]
    fn build_does_not_reset_accumulated_state() {
        let mut builder = FlowResponseBuilder::new();
        builder.add_field("f1", "Field One", "string");
        let first = builder.build();
        builder.add_field("f2", "Field Two", "int");
        let second = builder.build();

        assert_eq!(first.fields.len(), 1);
        assert_eq!(second.fields.len(), 2);
    }

    #[test]
    fn filter_entries_upsert() {
        let mut builder = FlowResponseBuilder::new();
        builder
            .add_iframe_field_to_filter("region", "emea")
            .add_iframe_field_to_filter("region", "apac");
        assert_eq!(
            builder.build().iframe_fields_to_filter.get("region"),
            Some(&"apac".to_string())
        );
    }
}
