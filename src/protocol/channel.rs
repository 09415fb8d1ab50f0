// src/protocol/channel.rs
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::core::response::FlowResponse;
use crate::protocol::messages::{
    HostMessage, LoadData, ProtocolGeneration, WidgetMessage,
};

/// Receives host events on behalf of the channel's owner.
///
/// The defaults mirror an unregistered callback: a save with no delegate
/// behavior still replies with an empty document, and a cancel is
/// acknowledged by doing nothing.
pub trait FlowDelegate {
    fn on_load_data(&mut self, data: LoadData);

    fn on_save(&mut self) -> FlowResponse {
        FlowResponse::default()
    }

    fn on_cancel(&mut self) {}
}

/// What a dispatched message turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Loaded,
    Saved,
    Cancelled,
    /// Not one of ours; dropped without side effects.
    Ignored,
}

/// The widget's end of the host message channel.
///
/// Inbound events are handed to [`dispatch`](Self::dispatch) in the order
/// the host posted them; the channel never reorders or buffers. Outbound
/// messages are queued on the receiver returned by [`new`](Self::new),
/// which stands in for the host window in tests and in the simulator.
#[derive(Debug)]
pub struct FlowChannel {
    outbox: UnboundedSender<WidgetMessage>,
    generation: ProtocolGeneration,
    ready_sent: bool,
}

impl FlowChannel {
    pub fn new(
        generation: ProtocolGeneration,
    ) -> (Self, UnboundedReceiver<WidgetMessage>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        (
            Self {
                outbox,
                generation,
                ready_sent: false,
            },
            inbox,
        )
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.generation
    }

    /// Tells the host the widget may now receive data. Posted exactly
    /// once per channel; repeat calls are no-ops and return false.
    pub fn announce_ready(&mut self) -> bool {
        if self.ready_sent {
            return false;
        }
        self.ready_sent = true;
        let _ = self.outbox.send(WidgetMessage::IframeIsReady);
        true
    }

    /// Routes one raw host message to the delegate. Messages whose
    /// discriminator is not one of ours are ignored without error. A save
    /// request replies synchronously with the encoded response document;
    /// if encoding fails nothing is posted rather than something
    /// malformed.
    pub fn dispatch<D: FlowDelegate>(&self, raw: Value, delegate: &mut D) -> Dispatch {
        let message = match serde_json::from_value::<HostMessage>(raw) {
            Ok(message) => message,
            Err(err) => {
                debug!("ignoring unrecognized host message: {err}");
                return Dispatch::Ignored;
            }
        };

        match message {
            HostMessage::SendIframeData(envelope) => {
                delegate.on_load_data(envelope.into_load_data());
                Dispatch::Loaded
            }
            HostMessage::SaveParameterValue => {
                let response = delegate.on_save();
                let encoded = match self.generation {
                    ProtocolGeneration::Full => response.to_json(),
                    ProtocolGeneration::Minimal => response.to_minimal_json(),
                };
                match encoded {
                    Ok(value) => {
                        let _ = self.outbox.send(WidgetMessage::SetParameterValue { value });
                    }
                    Err(err) => {
                        error!("could not encode response document, dropping save reply: {err}");
                    }
                }
                Dispatch::Saved
            }
            HostMessage::CancelParameterValue => {
                delegate.on_cancel();
                Dispatch::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::response::{DescriptionEntry, DescriptionMap};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Recording {
        loads: Vec<LoadData>,
        cancels: usize,
        response: FlowResponse,
    }

    impl FlowDelegate for Recording {
        fn on_load_data(&mut self, data: LoadData) {
            self.loads.push(data);
        }

        fn on_save(&mut self) -> FlowResponse {
            self.response.clone()
        }

        fn on_cancel(&mut self) {
            self.cancels += 1;
        }
    }

    fn decoded_save(message: WidgetMessage) -> Value {
        match message {
            WidgetMessage::SetParameterValue { value } => {
                serde_json::from_str(&value).unwrap()
            }
            other => panic!("expected a save reply, got {other:?}"),
        }
    }

    #[test]
    fn ready_is_announced_exactly_once() {
        let (mut channel, mut host) = FlowChannel::new(ProtocolGeneration::Minimal);
        assert!(channel.announce_ready());
        assert!(!channel.announce_ready());

        assert_eq!(host.try_recv().unwrap(), WidgetMessage::IframeIsReady);
        assert!(host.try_recv().is_err());
    }

    #[test]
    fn unrecognized_messages_are_ignored() {
        let (channel, mut host) = FlowChannel::new(ProtocolGeneration::Minimal);
        let mut delegate = Recording::default();

        let verdicts = [
            channel.dispatch(json!({"type": "resize_iframe"}), &mut delegate),
            channel.dispatch(json!({"no": "type"}), &mut delegate),
            channel.dispatch(json!("just a string"), &mut delegate),
        ];
        assert_eq!(verdicts, [Dispatch::Ignored; 3]);
        assert!(delegate.loads.is_empty());
        assert!(host.try_recv().is_err());
    }

    #[test]
    fn data_delivery_reaches_the_delegate() {
        let (channel, _host) = FlowChannel::new(ProtocolGeneration::Minimal);
        let mut delegate = Recording::default();

        let verdict = channel.dispatch(
            json!({
                "type": "send_iframe_data",
                "connectedCubes": [{"id": "q1", "UniqueName": "orders"}],
                "userName": "dana"
            }),
            &mut delegate,
        );
        assert_eq!(verdict, Dispatch::Loaded);

        let data = &delegate.loads[0];
        assert_eq!(data.connected_cubes.len(), 1);
        assert_eq!(data.user_name.as_deref(), Some("dana"));
    }

    #[test]
    fn minimal_save_contains_no_keys_for_unset_slots() {
        let (channel, mut host) = FlowChannel::new(ProtocolGeneration::Minimal);
        let mut delegate = Recording::default();

        let verdict = channel.dispatch(json!({"type": "save_parameter_value"}), &mut delegate);
        assert_eq!(verdict, Dispatch::Saved);
        assert_eq!(decoded_save(host.try_recv().unwrap()), json!({}));
    }

    #[test]
    fn minimal_save_carries_populated_slots() {
        let (channel, mut host) = FlowChannel::new(ProtocolGeneration::Minimal);
        let mut descriptions = DescriptionMap::new();
        descriptions.insert(
            "Data Analyzer".to_string(),
            DescriptionEntry {
                note: "primary".to_string(),
                ..Default::default()
            },
        );
        let mut delegate = Recording {
            response: FlowResponse {
                tool_cube_descriptions: Some(descriptions),
                prompt: Some("<p>go</p>".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        channel.dispatch(json!({"type": "save_parameter_value"}), &mut delegate);
        let decoded = decoded_save(host.try_recv().unwrap());
        assert_eq!(
            decoded["toolCubeDescriptions"]["Data Analyzer"]["queryDescription"],
            json!("primary")
        );
        assert_eq!(decoded["prompt"], json!("<p>go</p>"));
        assert!(decoded.get("Parameters").is_none());
    }

    #[test]
    fn full_generation_posts_the_whole_document() {
        let (channel, mut host) = FlowChannel::new(ProtocolGeneration::Full);
        let mut delegate = Recording::default();

        channel.dispatch(json!({"type": "save_parameter_value"}), &mut delegate);
        let decoded = decoded_save(host.try_recv().unwrap());
        assert_eq!(decoded["Parameters"], json!([]));
        assert_eq!(decoded["DisplayName"], json!(""));
    }

    #[test]
    fn cancel_invokes_the_delegate_and_sends_nothing() {
        let (channel, mut host) = FlowChannel::new(ProtocolGeneration::Minimal);
        let mut delegate = Recording::default();

        let verdict =
            channel.dispatch(json!({"type": "cancel_parameter_value"}), &mut delegate);
        assert_eq!(verdict, Dispatch::Cancelled);
        assert_eq!(delegate.cancels, 1);
        assert!(host.try_recv().is_err());
    }
}
