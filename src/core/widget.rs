// src/core/widget.rs
use std::sync::Arc;

use futures::future;
use tracing::{debug, warn};

use crate::core::builder::FlowResponseBuilder;
use crate::core::cube::FlowCube;
use crate::core::descriptions;
use crate::core::reference::{self, Reference};
use crate::core::response::{DescriptionMap, FlowResponse};
use crate::core::selection::ToolSelection;
use crate::protocol::channel::FlowDelegate;
use crate::protocol::messages::LoadData;
use crate::services::registry::{PlanRequest, RegistryError, ToolRegistry};

/// Replaces `slot` with `next` only when the value actually changed.
/// Returns whether a replacement happened, so callers can skip redundant
/// notifications.
pub fn update_slot<T: PartialEq>(slot: &mut T, next: T) -> bool {
    if *slot == next {
        return false;
    }
    *slot = next;
    true
}

/// The widget engine: single owner of all mutable state between a data
/// delivery and a save. Mutations funnel through its methods, so updates
/// within one dispatch turn are serialized last-write-wins.
pub struct Widget {
    registry: Arc<dyn ToolRegistry>,
    connected_cubes: Vec<FlowCube>,
    connected_descriptions: DescriptionMap,
    selection: ToolSelection,
    prompt: String,
    plan: String,
    user_name: Option<String>,
    builder: FlowResponseBuilder,
    pending_tool_names: Vec<String>,
    pending_tool_descriptions: DescriptionMap,
}

impl Widget {
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            connected_cubes: Vec::new(),
            connected_descriptions: DescriptionMap::new(),
            selection: ToolSelection::new(),
            prompt: String::new(),
            plan: String::new(),
            user_name: None,
            builder: FlowResponseBuilder::new(),
            pending_tool_names: Vec::new(),
            pending_tool_descriptions: DescriptionMap::new(),
        }
    }

    pub fn connected_cubes(&self) -> &[FlowCube] {
        &self.connected_cubes
    }

    pub fn connected_descriptions(&self) -> &DescriptionMap {
        &self.connected_descriptions
    }

    pub fn selection(&self) -> &ToolSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut ToolSelection {
        &mut self.selection
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn plan(&self) -> &str {
        &self.plan
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn builder_mut(&mut self) -> &mut FlowResponseBuilder {
        &mut self.builder
    }

    /// Replaces the prompt buffer; returns whether it changed.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> bool {
        update_slot(&mut self.prompt, prompt.into())
    }

    /// Replaces the connected-cube annotations, pruned against the
    /// current cubes; returns whether the stored map changed.
    pub fn set_connected_descriptions(&mut self, candidate: DescriptionMap) -> bool {
        let cleaned = descriptions::reconcile(&candidate, &self.connected_cubes);
        update_slot(&mut self.connected_descriptions, cleaned)
    }

    /// Replaces the tool annotations, pruned against the selection.
    pub fn set_tool_descriptions(&mut self, candidate: DescriptionMap) {
        self.selection.set_descriptions(candidate);
    }

    /// Drops a dragged reference into the prompt at `cursor` and returns
    /// the new cursor position.
    pub fn insert_reference(&mut self, dropped: &Reference, cursor: Option<usize>) -> usize {
        reference::insert_marker(&mut self.prompt, cursor, &dropped.marker())
    }

    /// Tool names the registry offers that are not attached yet.
    pub async fn available_tools(&self) -> Result<Vec<String>, RegistryError> {
        let mut names = self.registry.list_tools().await?;
        names.retain(|name| {
            !self
                .selection
                .cubes()
                .iter()
                .any(|cube| cube.display_name() == name)
        });
        Ok(names)
    }

    /// Resolves a tool by name and attaches it. Duplicates (by id) are
    /// ignored; any fetch failure leaves the selection unchanged.
    pub async fn attach_tool(&mut self, name: &str) -> Result<bool, RegistryError> {
        let cube = self.registry.fetch_tool(name).await?;
        Ok(self.selection.attach(cube))
    }

    /// Detaches a tool and its annotation entry.
    pub fn detach_tool(&mut self, id: &str) -> Option<FlowCube> {
        self.selection.detach(id)
    }

    /// Re-fetches the tools named by a previously saved document. The
    /// fetches run in parallel and are joined; a failed name is logged
    /// and omitted without cancelling the rest. The saved annotations are
    /// then reconciled against whatever actually arrived.
    pub async fn restore_saved_tools(&mut self) {
        let names = std::mem::take(&mut self.pending_tool_names);
        let candidate = std::mem::take(&mut self.pending_tool_descriptions);
        if names.is_empty() {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let results =
            future::join_all(names.iter().map(|name| registry.fetch_tool(name))).await;

        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(cube) => {
                    self.selection.attach(cube);
                }
                Err(err) => warn!("could not restore tool '{name}': {err}"),
            }
        }
        self.selection.set_descriptions(candidate);
    }

    /// Requests a plan for the current queries, tools and prompt. On
    /// failure the previously generated plan stays in place so the user
    /// can retry.
    pub async fn generate_plan(&mut self) -> Result<&str, RegistryError> {
        let request = PlanRequest {
            queries: self.connected_cubes.clone(),
            tools: self.selection.cubes().to_vec(),
            prompt: self.prompt.clone(),
        };
        let plan = self.registry.generate_plan(&request).await?;
        self.plan = plan;
        Ok(&self.plan)
    }

    /// The response document in its current state: the builder's legacy
    /// substructure plus every slot that holds a value.
    pub fn assemble_response(&self) -> FlowResponse {
        let mut response = self.builder.build();
        if !self.connected_descriptions.is_empty() {
            response.connected_cubes_descriptions = Some(self.connected_descriptions.clone());
        }
        if !self.selection.descriptions().is_empty() {
            response.tool_cube_descriptions = Some(self.selection.descriptions().clone());
        }
        if !self.prompt.is_empty() {
            response.prompt = Some(self.prompt.clone());
        }
        if !self.plan.is_empty() {
            response.plan = Some(self.plan.clone());
        }
        response
    }
}

impl FlowDelegate for Widget {
    fn on_load_data(&mut self, data: LoadData) {
        self.connected_cubes = data.connected_cubes;
        self.user_name = data.user_name;

        if let Some(snapshot) = &data.node_snapshot {
            self.builder.load_from_object(snapshot);
        }

        if let Some(previous) = data.previous_response {
            if data.node_snapshot.is_none() {
                self.builder.load_from_object(&previous.as_patch());
            }

            self.prompt = previous.prompt.unwrap_or_default();
            self.plan = previous.plan.unwrap_or_default();

            self.connected_descriptions = descriptions::reconcile(
                &previous.connected_cubes_descriptions.unwrap_or_default(),
                &self.connected_cubes,
            );

            // tool cubes are re-fetched out of band; remember what to ask for
            if let Some(tool_descriptions) = previous.tool_cube_descriptions {
                self.pending_tool_names = tool_descriptions.keys().cloned().collect();
                self.pending_tool_descriptions = tool_descriptions;
            }
        } else {
            self.connected_descriptions =
                descriptions::reconcile(&self.connected_descriptions, &self.connected_cubes);
        }
    }

    fn on_save(&mut self) -> FlowResponse {
        self.assemble_response()
    }

    fn on_cancel(&mut self) {
        debug!("host cancelled the edit session");
    }
}
