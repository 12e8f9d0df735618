use httpmock::prelude::*;
use sentry_provider::testing::{
    assert_error_at, assert_plan_creates, assert_plan_no_changes, assert_plan_replaces,
    ProviderTester, TestError,
};
use sentry_provider::SentryProvider;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const DASHBOARDS_PATH: &str = "/api/0/organizations/acme/dashboards/";
const DASHBOARD_PATH: &str = "/api/0/organizations/acme/dashboards/11/";

fn resource_config(title: &str) -> Value {
    json!({
        "organization": "acme",
        "title": title,
        "widget": [{
            "title": "Custom Widget",
            "display_type": "world_map",
            "query": [{
                "name": "Metric",
                "fields": ["count()"],
                "aggregates": ["count()"],
                "conditions": "!event.type:transaction"
            }],
            "layout": [{"x": 0, "y": 0, "w": 2, "h": 1, "min_h": 1}]
        }]
    })
}

fn api_dashboard(title: &str) -> Value {
    json!({
        "id": "11",
        "title": title,
        "dateCreated": "2024-01-01T00:00:00Z",
        "widgets": [{
            "id": "101",
            "title": "Custom Widget",
            "displayType": "world_map",
            "interval": "5m",
            "widgetType": "discover",
            "limit": null,
            "queries": [{
                "name": "Metric",
                "fields": ["count()"],
                "aggregates": ["count()"],
                "columns": [],
                "fieldAliases": [],
                "conditions": "!event.type:transaction",
                "orderby": ""
            }],
            "layout": {"x": 0, "y": 0, "w": 2, "h": 1, "minH": 1}
        }]
    })
}

async fn tester(server: &MockServer) -> ProviderTester<SentryProvider> {
    assert_ok!(ProviderTester::sentry(&server.url("/api/")).await)
}

fn stored_state(title: &str) -> Value {
    json!({
        "id": "acme/11",
        "organization": "acme",
        "internal_id": "11",
        "title": title,
        "widget": []
    })
}

#[tokio::test]
async fn test_create_dashboard_resource() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(DASHBOARDS_PATH)
                .header("authorization", "Bearer test-token")
                .json_body(json!({
                    "title": "Errors",
                    "widgets": [{
                        "title": "Custom Widget",
                        "displayType": "world_map",
                        "queries": [{
                            "name": "Metric",
                            "fields": ["count()"],
                            "aggregates": ["count()"],
                            "columns": [],
                            "fieldAliases": [],
                            "conditions": "!event.type:transaction",
                            "orderby": ""
                        }],
                        "layout": {"x": 0, "y": 0, "w": 2, "h": 1, "minH": 1}
                    }]
                }));
            then.status(201).json_body(api_dashboard("Errors"));
        })
        .await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET).path(DASHBOARD_PATH);
            then.status(200).json_body(api_dashboard("Errors"));
        })
        .await;

    let tester = tester(&server).await;
    let plan = assert_ok!(
        tester
            .plan_create("sentry_dashboard", resource_config("Errors"))
            .await
    );
    assert_plan_creates(&plan);

    let state = assert_ok!(
        tester
            .lifecycle_create("sentry_dashboard", resource_config("Errors"))
            .await
    );
    create.assert_async().await;
    read.assert_async().await;

    assert_eq!(state["id"], "acme/11");
    assert_eq!(state["internal_id"], "11");
    assert_eq!(state["title"], "Errors");
    assert_eq!(state["widget"][0]["interval"], "5m");
    assert_eq!(state["widget"][0]["query"][0]["fields"], json!(["count()"]));
    assert_eq!(
        state["widget"][0]["layout"],
        json!([{"x": 0, "y": 0, "w": 2, "h": 1, "min_h": 1}])
    );

    // Values Sentry filled in do not show up as drift.
    let plan = assert_ok!(
        tester
            .plan_update("sentry_dashboard", state, resource_config("Errors"))
            .await
    );
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_update_dashboard_resource() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(DASHBOARD_PATH)
                .json_body_partial(r#"{"title": "Errors v2"}"#);
            then.status(200).json_body(api_dashboard("Errors v2"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DASHBOARD_PATH);
            then.status(200).json_body(api_dashboard("Errors v2"));
        })
        .await;

    let tester = tester(&server).await;
    let state = assert_ok!(
        tester
            .lifecycle_update(
                "sentry_dashboard",
                stored_state("Errors"),
                resource_config("Errors v2"),
            )
            .await
    );
    update.assert_async().await;
    assert_eq!(state["title"], "Errors v2");
    assert_eq!(state["internal_id"], "11");
}

#[tokio::test]
async fn test_moving_dashboard_organization_replaces() {
    let server = MockServer::start_async().await;
    let tester = tester(&server).await;

    let mut config = resource_config("Errors");
    config["organization"] = json!("other");

    let plan = assert_ok!(
        tester
            .plan_update("sentry_dashboard", stored_state("Errors"), config)
            .await
    );
    assert_plan_replaces(&plan);
}

#[tokio::test]
async fn test_read_removed_dashboard_resource() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DASHBOARD_PATH);
            then.status(404)
                .json_body(json!({"detail": "The requested resource does not exist"}));
        })
        .await;

    let tester = tester(&server).await;
    let result = tester
        .read("sentry_dashboard", stored_state("Errors"))
        .await;
    assert_eq!(assert_ok!(result), None);
}

#[tokio::test]
async fn test_delete_dashboard_resource() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path(DASHBOARD_PATH);
            then.status(204);
        })
        .await;

    let tester = tester(&server).await;
    let state = stored_state("Errors");
    assert_ok!(tester.delete("sentry_dashboard", state).await);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_import_dashboard_resource() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DASHBOARD_PATH);
            then.status(200).json_body(api_dashboard("Errors"));
        })
        .await;

    let tester = tester(&server).await;
    let imported = assert_ok!(tester.import_resource("sentry_dashboard", "acme/11").await);

    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, "sentry_dashboard");
    assert_eq!(imported[0].state["organization"], "acme");
    assert_eq!(imported[0].state["internal_id"], "11");
    assert_eq!(imported[0].state["widget"][0]["display_type"], "world_map");

    let result = tester
        .import_resource("sentry_dashboard", "acme/11/x")
        .await;
    let err = assert_err!(result);
    assert_eq!(err.into_diagnostics()[0].summary, "Import error");
}

#[tokio::test]
async fn test_dashboard_resource_requires_layout() {
    let server = MockServer::start_async().await;
    let tester = tester(&server).await;

    let mut config = resource_config("Errors");
    config["widget"][0]["layout"] = json!([]);

    match tester
        .validate_resource_config("sentry_dashboard", config)
        .await
    {
        Err(TestError::Diagnostics(diags)) => assert_error_at(&diags, "widget.0.layout"),
        other => panic!("expected diagnostics, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_dashboard_data_source() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/0/organizations/acme/dashboards/11/")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({
                "id": "11",
                "title": "Errors",
                "dateCreated": "2024-01-01T00:00:00Z",
                "widgets": [{
                    "id": "101",
                    "title": "Custom Widget",
                    "displayType": "world_map",
                    "interval": "5m",
                    "widgetType": "discover",
                    "limit": null,
                    "queries": [{
                        "name": "Metric",
                        "fields": ["count()"],
                        "aggregates": ["count()"],
                        "columns": [],
                        "fieldAliases": [],
                        "conditions": "!event.type:transaction",
                        "orderby": ""
                    }],
                    "layout": {"x": 0, "y": 0, "w": 2, "h": 1, "minH": 1}
                }]
            }));
        })
        .await;

    let tester = assert_ok!(ProviderTester::sentry(&server.url("/api/")).await);
    let config = json!({"organization": "acme", "internal_id": "11"});

    assert_ok!(
        tester
            .validate_data_source_config("sentry_dashboard", config.clone())
            .await
    );
    let state = assert_ok!(tester.read_data_source("sentry_dashboard", config).await);
    mock.assert_async().await;

    assert_eq!(state["id"], "acme/11");
    assert_eq!(state["title"], "Errors");

    let widgets = state["widget"].as_array().unwrap();
    assert_eq!(widgets.len(), 1);
    let widget = &widgets[0];
    assert_eq!(widget["title"], "Custom Widget");
    assert_eq!(widget["display_type"], "world_map");
    assert_eq!(widget["interval"], "5m");
    assert_eq!(widget["widget_type"], "discover");
    assert_eq!(widget["query"][0]["name"], "Metric");
    assert_eq!(widget["query"][0]["fields"], json!(["count()"]));
    assert_eq!(widget["query"][0]["aggregates"], json!(["count()"]));
    assert_eq!(widget["query"][0]["conditions"], "!event.type:transaction");
    assert_eq!(
        widget["layout"],
        json!([{"x": 0, "y": 0, "w": 2, "h": 1, "min_h": 1}])
    );
}

#[tokio::test]
async fn test_read_missing_dashboard() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/0/organizations/acme/dashboards/404/");
            then.status(404);
        })
        .await;

    let tester = assert_ok!(ProviderTester::sentry(&server.url("/api/")).await);
    let config = json!({"organization": "acme", "internal_id": "404"});
    let result = tester.read_data_source("sentry_dashboard", config).await;
    let err = assert_err!(result);
    assert_eq!(err.into_diagnostics()[0].summary, "Not found");
}

#[tokio::test]
async fn test_missing_internal_id() {
    let server = MockServer::start_async().await;
    let tester = assert_ok!(ProviderTester::sentry(&server.url("/api/")).await);

    match tester
        .validate_data_source_config("sentry_dashboard", json!({"organization": "acme"}))
        .await
    {
        Err(TestError::Diagnostics(diags)) => assert_error_at(&diags, "internal_id"),
        other => panic!("expected diagnostics, got {:?}", other),
    }
}
