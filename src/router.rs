use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/api/health", get(handlers::healthcheck))
        // Render routes
        .route("/api/render/dry-run", post(handlers::render::dry_run))
        .route("/api/templates/_/variables", get(handlers::render::get_template_variables))
        // Command policy routes
        .route("/api/commands/normalize", post(handlers::render::normalize_commands))
        .route("/api/commands/check", post(handlers::render::check_commands))
        .route("/api/policy", get(handlers::render::get_policy))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_allow_any {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::render::CommandPolicy;

    fn app(strict_by_default: bool) -> Router {
        let state = Arc::new(AppState {
            config: Config {
                listen_addr: "127.0.0.1:0".into(),
                policy_file: None,
                strict_by_default,
                cors_allow_any: true,
            },
            policy: CommandPolicy::builtin().clone(),
        });
        build(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_dry_run_preview() {
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({
                "template": {"id": 1, "content": "interface {{ params.ifname }}\ndescription {{ params.desc }}"},
                "params": {"ifname": "GigabitEthernet0/1", "desc": "uplink"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rendered"], "interface GigabitEthernet0/1\ndescription uplink");
        assert!(body.get("commands").is_none());
        assert!(body.get("safe").is_none());
        assert!(body["render_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_dry_run_with_safety_check() {
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({
                "template": {"id": 1, "content": "sysname {{ device.name }}\nvlan 10\n", "vendors": ["cisco"]},
                "device": {"id": 9, "name": "edge-01", "ip_address": "10.0.0.9", "vendor": "huawei"},
                "check_safety": true
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["safe"], true);
        assert_eq!(body["commands"], json!(["sysname edge-01", "vlan 10"]));
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_policy_rejection() {
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({"template": {"id": 2, "content": "reload"}, "check_safety": true}),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(body["stage"], "policy");
        assert_eq!(body["details"]["rendered"], "reload");
        assert_eq!(body["details"]["violations"][0]["command"], "reload");
        assert_eq!(body["details"]["violations"][0]["reasons"][0]["kind"], "forbidden");
    }

    #[tokio::test]
    async fn test_dry_run_parameter_error() {
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({
                "template": {
                    "id": 3,
                    "content": "vlan {{ params.vlan_id }}",
                    "parameters": "{\"type\":\"object\",\"properties\":{\"vlan_id\":{\"type\":\"integer\"}},\"required\":[\"vlan_id\"]}"
                },
                "params": {"vlan_id": "abc"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["stage"], "validate");
        assert_eq!(body["details"]["issues"][0]["instance_path"], "/vlan_id");
    }

    #[tokio::test]
    async fn test_dry_run_template_errors() {
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({"template": {"id": 4, "content": "vlan {{ params.missing }}"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["stage"], "render");

        let (status, _) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({"template": {"id": 5, "content": "x", "parameters": "{oops"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dry_run_cannot_read_server_environment() {
        std::env::set_var("NETCFG_ROUTER_TEST_SECRET", "s3cret");
        let (status, body) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({"template": {"id": 7, "content": "snmp-agent community {{ get_env(name=\"NETCFG_ROUTER_TEST_SECRET\") }}"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["stage"], "render");
        assert!(!body.to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn test_retired_template_rejected() {
        let (status, _) = post_json(
            app(false),
            "/api/render/dry-run",
            json!({"template": {"id": 6, "content": "vlan 10", "status": "retired"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_check_commands_strict_default() {
        let body = json!({"commands": ["interface Vlanif10", "telnet 10.0.0.1"]});

        let (status, resp) = post_json(app(false), "/api/commands/check", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["safe"], true);
        assert_eq!(resp["checked"], 2);

        let (status, resp) = post_json(app(true), "/api/commands/check", body).await;
        assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
        assert_eq!(resp["details"]["violations"][0]["command"], "telnet 10.0.0.1");
        assert_eq!(resp["details"]["violations"][0]["lines"], json!([2]));
    }

    #[tokio::test]
    async fn test_normalize_endpoint() {
        let (status, body) = post_json(
            app(false),
            "/api/commands/normalize",
            json!({"rendered": "#\nsysname core\n\n! note\n vlan 10 \n"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["commands"], json!(["sysname core", "vlan 10"]));
    }

    #[tokio::test]
    async fn test_policy_and_variables() {
        let (status, body) = get_json(app(false), "/api/policy").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["forbidden_patterns"].as_array().unwrap().is_empty());
        assert!(body["allowed_prefixes"]
            .as_array()
            .unwrap()
            .contains(&json!("interface")));

        let (status, body) = get_json(app(false), "/api/templates/_/variables").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().iter().any(|v| v["name"] == "device.ip_address"));
    }
}
