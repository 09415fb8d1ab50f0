// src/services/web_server.rs
//
// Mock registry backend for local development: a static tool catalog and
// a templated plan generator behind the same API the production registry
// exposes.

use axum::{
    extract::rejection::JsonRejection,
    extract::Path,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::core::cube::{CubeMetadata, FlowCube, FlowParameter, ParameterValue};
use crate::services::plan::render_plan;
use crate::services::registry::PlanRequest;

lazy_static! {
    static ref TOOL_CATALOG: Vec<FlowCube> = build_catalog();
}

fn catalog_parameter(
    name: &str,
    display_name: &str,
    param_type: &str,
    description: &str,
    category: &str,
    value: ParameterValue,
) -> FlowParameter {
    FlowParameter {
        name: Some(name.to_string()),
        display_name: Some(display_name.to_string()),
        param_type: Some(param_type.to_string()),
        is_single_value: Some(true),
        is_required: Some(true),
        description: Some(description.to_string()),
        auto_complete_provider: Some(String::new()),
        options_provider: Some(String::new()),
        options: Some(Vec::new()),
        category: Some(category.to_string()),
        value: Some(value),
        visible: Some(true),
        role: Some(String::new()),
        is_server_filter_auto_complete: Some(false),
        ..Default::default()
    }
}

fn catalog_tool(
    id: &str,
    unique_name: &str,
    name: &str,
    description: &str,
    parameters: Vec<FlowParameter>,
) -> FlowCube {
    FlowCube {
        id: id.to_string(),
        unique_name: unique_name.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        cube_type: "query".to_string(),
        parameters,
        metadata: CubeMetadata {
            owner: "system".to_string(),
            ..Default::default()
        },
        view_config: json!({}),
        saved_properties: json!({}),
        ..Default::default()
    }
}

fn build_catalog() -> Vec<FlowCube> {
    vec![
        catalog_tool(
            "tool-data-analyzer",
            "data_analyzer",
            "Data Analyzer",
            "Analyze data patterns and generate insights",
            vec![
                catalog_parameter(
                    "data_source",
                    "Data Source",
                    "String",
                    "Select the data source to analyze",
                    "Input",
                    ParameterValue::Text(String::new()),
                ),
                catalog_parameter(
                    "analysis_type",
                    "Analysis Type",
                    "String",
                    "Type of analysis to perform",
                    "Settings",
                    ParameterValue::Text("statistical".to_string()),
                ),
            ],
        ),
        catalog_tool(
            "tool-report-generator",
            "report_generator",
            "Report Generator",
            "Generate comprehensive reports from your data",
            vec![
                catalog_parameter(
                    "report_template",
                    "Report Template",
                    "String",
                    "Choose a report template",
                    "Configuration",
                    ParameterValue::Text(String::new()),
                ),
                {
                    let mut include_charts = catalog_parameter(
                        "include_charts",
                        "Include Charts",
                        "Boolean",
                        "Include visualizations in the report",
                        "Options",
                        ParameterValue::Flag(true),
                    );
                    include_charts.is_required = Some(false);
                    include_charts
                },
            ],
        ),
        catalog_tool(
            "tool-chart-builder",
            "chart_builder",
            "Chart Builder",
            "Create interactive charts and visualizations",
            vec![
                catalog_parameter(
                    "chart_type",
                    "Chart Type",
                    "String",
                    "Select chart type (bar, line, pie, etc.)",
                    "Chart Settings",
                    ParameterValue::Text("bar".to_string()),
                ),
                catalog_parameter(
                    "x_axis",
                    "X-Axis Field",
                    "String",
                    "Field to use for X-axis",
                    "Chart Settings",
                    ParameterValue::Text(String::new()),
                ),
                catalog_parameter(
                    "y_axis",
                    "Y-Axis Field",
                    "String",
                    "Field to use for Y-axis",
                    "Chart Settings",
                    ParameterValue::Text(String::new()),
                ),
            ],
        ),
    ]
}

async fn list_tools() -> Json<Vec<String>> {
    Json(
        TOOL_CATALOG
            .iter()
            .map(|tool| tool.display_name().to_string())
            .collect(),
    )
}

async fn tool_metadata(Path(name): Path<String>) -> Response {
    match TOOL_CATALOG.iter().find(|tool| tool.display_name() == name) {
        Some(tool) => (StatusCode::OK, Json(tool.clone())).into_response(),
        None => {
            debug!("tool '{name}' not in the catalog");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Tool not found" })),
            )
                .into_response()
        }
    }
}

async fn generate_plan(payload: Result<Json<PlanRequest>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(request)) => {
            debug!(
                "generating plan for {} quer(ies) and {} tool(s)",
                request.queries.len(),
                request.tools.len()
            );
            (StatusCode::OK, Json(json!({ "plan": render_plan(&request) }))).into_response()
        }
        Err(rejection) => {
            debug!("rejecting plan request: {rejection}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid request body" })),
            )
                .into_response()
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

/// The registry API under `/api`, with wide-open CORS so the widget can
/// call it from any embedding origin. Preflight `OPTIONS` requests are
/// answered by the CORS layer itself.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", get(tool_metadata))
        .route("/api/generate-plan", post(generate_plan))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn start_web_server(host: String, port: u16) -> anyhow::Result<()> {
    let ip_addr: std::net::IpAddr = host.parse().unwrap_or_else(|_| {
        warn!("Invalid host '{}', falling back to 127.0.0.1", host);
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    });
    let addr = SocketAddr::from((ip_addr, port));

    info!("Mock registry listening on http://{addr}");
    info!("  GET  /api/tools");
    info!("  GET  /api/tools/{{name}}");
    info!("  POST /api/generate-plan");
    info!(
        "Available tools: {}",
        TOOL_CATALOG
            .iter()
            .map(|tool| tool.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn tools_endpoint_lists_display_names() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/tools")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<String> = serde_json::from_value(body).unwrap();
        assert_eq!(
            names,
            vec!["Data Analyzer", "Report Generator", "Chart Builder"]
        );
    }

    #[tokio::test]
    async fn metadata_lookup_decodes_percent_encoded_names() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/tools/Data%20Analyzer")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "tool-data-analyzer");
        assert_eq!(body["Parameters"][0]["Name"], "data_source");
    }

    #[tokio::test]
    async fn unknown_tools_return_404() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/tools/Nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Tool not found");
    }

    #[tokio::test]
    async fn plan_generation_answers_with_markdown() {
        let request_body = serde_json::to_string(&PlanRequest {
            queries: vec![],
            tools: vec![TOOL_CATALOG[0].clone()],
            prompt: "analyze [[toolCube:Data Analyzer]]".to_string(),
        })
        .unwrap();

        let (status, body) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/generate-plan")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let plan = body["plan"].as_str().unwrap();
        assert!(plan.starts_with("# Execution Plan"));
        assert!(plan.contains("Data Analyzer"));
    }

    #[tokio::test]
    async fn unparsable_plan_bodies_return_400() {
        let (status, body) = send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/generate-plan")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn unknown_routes_return_404() {
        let (status, body) = send(
            Request::builder()
                .uri("/api/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn preflight_requests_short_circuit_with_cors_headers() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/tools")
                    .header(header::ORIGIN, "http://flow.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }
}
