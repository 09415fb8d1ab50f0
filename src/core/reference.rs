// src/core/reference.rs
use serde::{Deserialize, Serialize};

use crate::core::cube::FlowCube;

/// What a dragged reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Tool,
    Query,
    Parameter,
}

/// A transient pointer created on drag start and consumed on drop. Never
/// persisted; its only durable form is the text marker produced by
/// [`Reference::marker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "itemName")]
    pub item_name: String,
    #[serde(rename = "parameterId", skip_serializing_if = "Option::is_none")]
    pub parameter_ordinal: Option<usize>,
    #[serde(rename = "parameterName", skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
}

impl Reference {
    /// A reference to the item itself.
    pub fn to_item(cube: &FlowCube) -> Self {
        let kind = if cube.is_tool() {
            ReferenceKind::Tool
        } else {
            ReferenceKind::Query
        };
        Self {
            id: format!("{}-{}", kind_tag(kind), cube.id),
            kind,
            item_id: cube.id.clone(),
            item_name: cube.display_name().to_string(),
            parameter_ordinal: None,
            parameter_name: None,
        }
    }

    /// A reference to one of the item's parameters, addressed by ordinal.
    /// `None` when the ordinal is out of range or the parameter has no
    /// usable label.
    pub fn to_parameter(cube: &FlowCube, ordinal: usize) -> Option<Self> {
        let parameter = cube.parameters.get(ordinal)?;
        let label = parameter.display_label()?;
        let base = if cube.is_tool() {
            ReferenceKind::Tool
        } else {
            ReferenceKind::Query
        };
        Some(Self {
            id: format!("{}-{}-param-{}", kind_tag(base), cube.id, ordinal),
            kind: ReferenceKind::Parameter,
            item_id: cube.id.clone(),
            item_name: cube.display_name().to_string(),
            parameter_ordinal: Some(ordinal),
            parameter_name: Some(label.to_string()),
        })
    }

    /// The marker tag: tool cubes keep their tag through parameter
    /// references via the `tool-` id prefix.
    fn marker_kind(&self) -> MarkerKind {
        match self.kind {
            ReferenceKind::Tool => MarkerKind::Tool,
            ReferenceKind::Query => MarkerKind::Connected,
            ReferenceKind::Parameter => {
                if self.item_id.starts_with("tool-") {
                    MarkerKind::Tool
                } else {
                    MarkerKind::Connected
                }
            }
        }
    }

    /// The inert text token embedded in the prompt:
    /// `[[<kind>:<item>]]` or `[[<kind>:<item>:<parameter>]]`.
    pub fn marker(&self) -> String {
        let kind = self.marker_kind().tag();
        match &self.parameter_name {
            Some(parameter) => format!(
                "[[{}:{}:{}]]",
                kind,
                escape_segment(&self.item_name),
                escape_segment(parameter)
            ),
            None => format!("[[{}:{}]]", kind, escape_segment(&self.item_name)),
        }
    }
}

fn kind_tag(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Tool => "tool",
        ReferenceKind::Query => "query",
        ReferenceKind::Parameter => "parameter",
    }
}

/// The two literal tags a marker can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Tool,
    Connected,
}

impl MarkerKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Tool => "toolCube",
            Self::Connected => "connectedCube",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "toolCube" => Some(Self::Tool),
            "connectedCube" => Some(Self::Connected),
            _ => None,
        }
    }
}

/// A marker decoded back into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarker {
    pub kind: MarkerKind,
    pub item_name: String,
    pub parameter_name: Option<String>,
}

/// Decodes one `[[...]]` token. `None` for anything that is not a
/// well-formed marker.
pub fn parse_marker(text: &str) -> Option<ParsedMarker> {
    let inner = text.strip_prefix("[[")?.strip_suffix("]]")?;
    let mut segments = inner.split(':');
    let kind = MarkerKind::from_tag(segments.next()?)?;
    let item_name = unescape_segment(segments.next()?);
    let parameter_name = segments.next().map(unescape_segment);
    if segments.next().is_some() || item_name.is_empty() {
        return None;
    }
    Some(ParsedMarker {
        kind,
        item_name,
        parameter_name,
    })
}

/// Replaces every well-formed marker in `text` through `expand`; anything
/// that merely looks like a marker stays verbatim.
pub fn expand_markers(text: &str, expand: impl Fn(&ParsedMarker) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[[") {
        let Some(end) = rest[start..].find("]]") else {
            break;
        };
        let token = &rest[start..start + end + 2];
        out.push_str(&rest[..start]);
        match parse_marker(token) {
            Some(parsed) => out.push_str(&expand(&parsed)),
            None => out.push_str(token),
        }
        rest = &rest[start + end + 2..];
    }
    out.push_str(rest);
    out
}

/// Inserts `marker`, padded with a single space on each side, at the
/// cursor (byte offset, clamped to a char boundary; end of text when
/// absent). Returns the cursor position immediately after the trailing
/// pad.
pub fn insert_marker(prompt: &mut String, cursor: Option<usize>, marker: &str) -> usize {
    let mut at = cursor.unwrap_or(prompt.len()).min(prompt.len());
    while !prompt.is_char_boundary(at) {
        at -= 1;
    }
    let padded = format!(" {marker} ");
    prompt.insert_str(at, &padded);
    at + padded.len()
}

// The grammar reserves `%`, `:`, `[` and `]`; display names containing
// them are percent-encoded inside marker segments and decoded on parse.
fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '[' => out.push_str("%5B"),
            ']' => out.push_str("%5D"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_segment(segment: &str) -> String {
    segment
        .replace("%3A", ":")
        .replace("%5B", "[")
        .replace("%5D", "]")
        .replace("%25", "%")
}
