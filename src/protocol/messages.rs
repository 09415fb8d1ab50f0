// src/protocol/messages.rs
//
// Wire types for the three-inbound/two-outbound message protocol spoken
// with the embedding host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::core::cube::FlowCube;
use crate::core::response::{FlowResponse, ResponsePatch};

/// Which shape of save payload the host expects.
///
/// `Full` hosts receive the entire response document; `Minimal` hosts
/// receive only the slots that hold values, with the legacy substructure
/// omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolGeneration {
    Full,
    #[default]
    Minimal,
}

/// Inbound host messages, discriminated by `type`. Anything else on the
/// message channel is not for us.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "send_iframe_data")]
    SendIframeData(DataEnvelope),
    #[serde(rename = "save_parameter_value")]
    SaveParameterValue,
    #[serde(rename = "cancel_parameter_value")]
    CancelParameterValue,
}

/// Raw payload of a data delivery. Individual fields are decoded
/// leniently in [`DataEnvelope::into_load_data`] so one malformed entry
/// never sinks the whole delivery.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataEnvelope {
    #[serde(rename = "connectedCubes")]
    pub connected_cubes: Vec<Value>,
    /// Legacy snapshot of the node's own parameter document.
    pub query: Option<Value>,
    /// Previously saved response document, already decomposed.
    pub value: Option<Value>,
    /// Previously saved response document as a JSON-encoded string
    /// (older hosts).
    #[serde(rename = "iframeResponse")]
    pub iframe_response: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
}

impl DataEnvelope {
    /// Decodes the envelope into application state. Malformed cubes are
    /// skipped with a warning; a malformed embedded response is logged
    /// and treated as absent.
    pub fn into_load_data(self) -> LoadData {
        let mut connected_cubes = Vec::with_capacity(self.connected_cubes.len());
        for (index, raw) in self.connected_cubes.into_iter().enumerate() {
            match serde_json::from_value::<FlowCube>(raw) {
                Ok(cube) => connected_cubes.push(cube),
                Err(err) => warn!("skipping malformed connected cube #{index}: {err}"),
            }
        }

        let mut previous_response = self.value.and_then(|raw| {
            serde_json::from_value::<FlowResponse>(raw)
                .map_err(|err| warn!("ignoring malformed value payload: {err}"))
                .ok()
        });
        if previous_response.is_none() {
            if let Some(text) = self.iframe_response {
                match serde_json::from_str::<FlowResponse>(&text) {
                    Ok(response) => previous_response = Some(response),
                    Err(err) => error!("failed to parse iframeResponse: {err}"),
                }
            }
        }

        let node_snapshot = self.query.and_then(|raw| {
            serde_json::from_value::<ResponsePatch>(raw)
                .map_err(|err| warn!("ignoring malformed query snapshot: {err}"))
                .ok()
        });

        LoadData {
            connected_cubes,
            previous_response,
            node_snapshot,
            user_name: self.user_name,
        }
    }
}

/// A decoded data delivery, ready for the widget.
#[derive(Debug, Clone, Default)]
pub struct LoadData {
    pub connected_cubes: Vec<FlowCube>,
    pub previous_response: Option<FlowResponse>,
    pub node_snapshot: Option<ResponsePatch>,
    pub user_name: Option<String>,
}

/// Outbound messages posted to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum WidgetMessage {
    #[serde(rename = "iframe_is_ready")]
    IframeIsReady,
    #[serde(rename = "set_parameter_value")]
    SetParameterValue { value: String },
}
