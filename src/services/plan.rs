// src/services/plan.rs
//
// Templated plan generation for the mock backend. Real deployments have
// an agent behind this endpoint; local development gets a deterministic
// markdown rendering of the request instead.

use std::fmt::Write as _;

use crate::core::cube::FlowCube;
use crate::core::reference::{expand_markers, MarkerKind};
use crate::services::registry::PlanRequest;

/// Renders a markdown execution plan from the request. Reference markers
/// in the prompt are expanded to readable `item.parameter` names.
pub fn render_plan(request: &PlanRequest) -> String {
    let mut out = String::new();
    out.push_str("# Execution Plan\n\n");

    out.push_str("## Objective\n\n");
    if request.prompt.is_empty() {
        out.push_str("_No prompt provided; deriving a plan from the attached items._\n\n");
    } else {
        let expanded = expand_markers(&request.prompt, |marker| {
            let owner = match marker.kind {
                MarkerKind::Tool => "tool",
                MarkerKind::Connected => "query",
            };
            match &marker.parameter_name {
                Some(parameter) => {
                    format!("**{}.{}** ({owner} parameter)", marker.item_name, parameter)
                }
                None => format!("**{}** ({owner})", marker.item_name),
            }
        });
        let _ = writeln!(out, "{expanded}\n");
    }

    write_item_section(&mut out, "Connected Queries", &request.queries);
    write_item_section(&mut out, "Tools", &request.tools);

    out.push_str("## Steps\n\n");
    let mut step = 1;
    if !request.queries.is_empty() {
        let _ = writeln!(
            out,
            "{step}. Resolve the {} connected quer{} and collect their result sets.",
            request.queries.len(),
            if request.queries.len() == 1 { "y" } else { "ies" }
        );
        step += 1;
    }
    for tool in &request.tools {
        let _ = writeln!(
            out,
            "{step}. Invoke **{}** with its configured parameters.",
            tool.display_name()
        );
        step += 1;
    }
    let _ = writeln!(
        out,
        "{step}. Combine the intermediate results into a single answer for the objective above."
    );

    out
}

fn write_item_section(out: &mut String, title: &str, items: &[FlowCube]) {
    let _ = writeln!(out, "## {title} ({})\n", items.len());
    if items.is_empty() {
        out.push_str("_None._\n\n");
        return;
    }
    for item in items {
        match &item.description {
            Some(description) if !description.is_empty() => {
                let _ = writeln!(out, "- **{}** — {description}", item.display_name());
            }
            _ => {
                let _ = writeln!(out, "- **{}**", item.display_name());
            }
        }
        for parameter in &item.parameters {
            let Some(label) = parameter.display_label() else {
                continue;
            };
            let kind = parameter.param_type.as_deref().unwrap_or("String");
            let _ = writeln!(out, "  - `{label}` ({kind})");
        }
    }
    out.push('\n');
}
