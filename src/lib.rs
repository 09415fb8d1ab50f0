// src/lib.rs

//! Headless engine for an embeddable Flow configuration widget, plus the
//! mock registry backend used during local development.
//!
//! The engine owns the state a user edits between the host's data
//! delivery and its save request: connected cubes and their annotations,
//! the attached tool selection, the prompt buffer with its reference
//! markers, and the generated plan. The host speaks to it over a small
//! typed message protocol ([`protocol`]); the tool registry is an HTTP
//! collaborator ([`services::registry`]).

pub mod core;
pub mod protocol;
pub mod services;

pub use core::builder::{FlowResponseBuilder, ParameterOverrides};
pub use core::cube::{Field, FlowCube, FlowParameter, ParameterValue};
pub use core::reference::Reference;
pub use core::response::{DescriptionEntry, DescriptionMap, FlowResponse, ResponsePatch};
pub use core::selection::ToolSelection;
pub use core::widget::Widget;
pub use protocol::channel::{Dispatch, FlowChannel, FlowDelegate};
pub use protocol::messages::{LoadData, ProtocolGeneration, WidgetMessage};
pub use services::config::FlowletConfig;
pub use services::registry::{PlanRequest, RegistryClient, RegistryError, ToolRegistry};
