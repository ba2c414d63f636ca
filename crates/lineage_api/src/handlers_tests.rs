//! Tests for handlers module

use super::*;
use axum::http::Method;
use lineage_core::{BitstreamId, ItemStage, VersioningSettings};
use std::sync::Arc;

use crate::metrics::PrometheusMetrics;
use crate::routes::create_router;
use crate::test_support::{
    bitstream_uri, request, send, test_state, test_state_with, TestContext, ADMIN_TOKEN, EDITOR_TOKEN,
};

async fn get(context: &TestContext, uri: &str) -> (StatusCode, serde_json::Value) {
    send(
        create_router(context.state.clone()),
        request(Method::GET, uri, None, None),
    )
    .await
}

async fn write(
    context: &TestContext,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, serde_json::Value) {
    send(
        create_router(context.state.clone()),
        request(method, uri, token, body),
    )
    .await
}

fn primary_uri(bundle: BundleId) -> String {
    format!("/api/core/bundles/{bundle}/primaryBitstream")
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_returns_json() {
    let response = health_check().await;

    assert_eq!(response.0.status, "healthy");
    assert_eq!(response.0.version, Some(env!("CARGO_PKG_VERSION").to_string()));
    assert!(chrono::DateTime::parse_from_rfc3339(&response.0.timestamp).is_ok());
}

// ============================================================================
// Version history reads
// ============================================================================

#[tokio::test]
async fn test_positional_queries_over_http() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    context.add_version(history, 98, ItemStage::Workspace);
    context.add_version(history, 7, ItemStage::Archived);

    let base = format!("/api/versioning/versionhistories/{history}");

    let (status, oldest) = get(&context, &format!("{base}/oldestversion")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(oldest["version"], 7);

    let (_, last) = get(&context, &format!("{base}/lastversion")).await;
    assert_eq!(last["version"], 98);

    let (_, current) = get(&context, &format!("{base}/currentversion")).await;
    assert_eq!(current["version"], 7);

    let (status, draft) = get(&context, &format!("{base}/draftVersion")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["version"], 98);

    let (status, summary) = get(&context, &base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["id"], history.value());
    assert_eq!(summary["versionCount"], 2);
    assert_eq!(summary["draftVersion"], true);
}

#[tokio::test]
async fn test_draft_version_no_content_when_last_is_archived() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    context.add_version(history, 1, ItemStage::Archived);

    let (status, body) = get(
        &context,
        &format!("/api/versioning/versionhistories/{history}/draftVersion"),
    )
    .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_empty_history_positional_queries_are_not_found() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();

    for position in ["oldestversion", "currentversion", "lastversion"] {
        let (status, body) = get(
            &context,
            &format!("/api/versioning/versionhistories/{history}/{position}"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{position}");
        assert_eq!(body["error"]["code"], "NotFound");
    }

    let (status, _) = get(
        &context,
        &format!("/api/versioning/versionhistories/{history}/draftVersion"),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_current_version_not_found_when_nothing_archived() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    context.add_version(history, 1, ItemStage::Workflow);

    let (status, _) = get(
        &context,
        &format!("/api/versioning/versionhistories/{history}/currentversion"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_history_is_not_found() {
    let context = test_state();

    let (status, body) = get(&context, "/api/versioning/versionhistories/9999/versions").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"]["entity"], "VersionHistory");
}

#[tokio::test]
async fn test_malformed_history_ids_are_bad_requests() {
    let context = test_state();

    for raw in ["abc", "0", "-3", "1.5"] {
        let (status, body) = get(
            &context,
            &format!("/api/versioning/versionhistories/{raw}/lastversion"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {raw}");
        assert_eq!(body["error"]["code"], "InvalidArgument");
    }
}

#[tokio::test]
async fn test_list_versions_pages_descending() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    for sequence_id in [3, 1, 5, 2, 4] {
        context.add_version(history, sequence_id, ItemStage::Archived);
    }
    let base = format!("/api/versioning/versionhistories/{history}/versions");

    let (status, first) = get(&context, &format!("{base}?page=0&size=2")).await;
    assert_eq!(status, StatusCode::OK);
    let sequence: Vec<i64> = first["versions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["version"].as_i64().unwrap())
        .collect();
    assert_eq!(sequence, vec![5, 4]);
    assert_eq!(first["page"]["totalElements"], 5);
    assert_eq!(first["page"]["totalPages"], 3);

    let (_, last) = get(&context, &format!("{base}?page=2&size=2")).await;
    assert_eq!(last["versions"].as_array().unwrap().len(), 1);
    assert_eq!(last["versions"][0]["version"], 1);

    let (_, beyond) = get(&context, &format!("{base}?page=9&size=2")).await;
    assert!(beyond["versions"].as_array().unwrap().is_empty());
    assert_eq!(beyond["page"]["totalElements"], 5);

    let (_, defaulted) = get(&context, &base).await;
    assert_eq!(defaulted["page"]["size"], lineage_core::DEFAULT_PAGE_SIZE);
    assert_eq!(defaulted["versions"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_versions_rejects_bad_paging() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    let base = format!("/api/versioning/versionhistories/{history}/versions");

    for query in ["size=0", "size=1001", "size=abc", "page=-1"] {
        let (status, body) = get(&context, &format!("{base}?{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["error"]["code"], "InvalidArgument");
    }
}

// ============================================================================
// Versions
// ============================================================================

#[tokio::test]
async fn test_get_version_by_id() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    let version = context.add_version(history, 12, ItemStage::Archived);

    let (status, body) = get(&context, &format!("/api/versioning/versions/{}", version.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 12);
    assert_eq!(body["versionHistoryId"], history.value());

    let (status, _) = get(&context, "/api/versioning/versions/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_version_updates_listing() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    context.add_version(history, 1, ItemStage::Archived);
    let second = context.add_version(history, 2, ItemStage::Archived);
    let uri = format!("/api/versioning/versions/{}", second.id);

    let (status, _) = write(&context, Method::DELETE, &uri, Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listing) = get(
        &context,
        &format!("/api/versioning/versionhistories/{history}/versions"),
    )
    .await;
    assert_eq!(listing["page"]["totalElements"], 1);
    let (_, last) = get(
        &context,
        &format!("/api/versioning/versionhistories/{history}/lastversion"),
    )
    .await;
    assert_eq!(last["version"], 1);

    let (status, _) = write(&context, Method::DELETE, &uri, Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_version_requires_permission() {
    let context = test_state();
    let history = context.state.histories.create().unwrap();
    let version = context.add_version(history, 1, ItemStage::Archived);
    let uri = format!("/api/versioning/versions/{}", version.id);

    let (anonymous, _) = write(&context, Method::DELETE, &uri, None, None).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);

    let (editor, body) = write(&context, Method::DELETE, &uri, Some(EDITOR_TOKEN), None).await;
    assert_eq!(editor, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "Forbidden");

    assert!(context.state.histories.find_version(version.id).is_ok());
}

#[tokio::test]
async fn test_versioning_disabled_closes_routes() {
    let context = test_state_with(VersioningSettings {
        enabled: false,
        ..VersioningSettings::default()
    });
    let history = context.state.histories.create().unwrap();
    let uri = format!("/api/versioning/versionhistories/{history}");

    let (anonymous, _) = write(&context, Method::GET, &uri, None, None).await;
    assert_eq!(anonymous, StatusCode::UNAUTHORIZED);

    let (admin, body) = write(&context, Method::GET, &uri, Some(ADMIN_TOKEN), None).await;
    assert_eq!(admin, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "VersioningDisabled");

    // bundle routes are unaffected
    let (status, _) = get(&context, &primary_uri(context.editable_bundle)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ============================================================================
// Primary bitstream
// ============================================================================

#[tokio::test]
async fn test_primary_bitstream_lifecycle() {
    let context = test_state();
    let bitstreams = context.add_bitstreams(2);
    let (x, y) = (bitstreams[0], bitstreams[1]);
    let uri = primary_uri(context.editable_bundle);

    let (status, _) = write(&context, Method::DELETE, &uri, Some(EDITOR_TOKEN), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bundle) = write(&context, Method::POST, &uri, Some(EDITOR_TOKEN), Some(bitstream_uri(x))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bundle["primaryBitstream"], x.to_string());

    let (status, primary) = get(&context, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(primary["id"], x.to_string());
    assert_eq!(primary["bundleId"], context.editable_bundle.to_string());

    let (status, body) = write(&context, Method::POST, &uri, Some(EDITOR_TOKEN), Some(bitstream_uri(y))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "AlreadySet");
    let (_, primary) = get(&context, &uri).await;
    assert_eq!(primary["id"], x.to_string());

    let (status, bundle) = write(&context, Method::PUT, &uri, Some(EDITOR_TOKEN), Some(bitstream_uri(y))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bundle["primaryBitstream"], y.to_string());

    let (status, _) = write(&context, Method::DELETE, &uri, Some(EDITOR_TOKEN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&context, &uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let snapshot = context.state.bundles.find_bundle(context.editable_bundle).unwrap();
    assert_eq!(snapshot.bitstreams, vec![x, y]);
}

#[tokio::test]
async fn test_replace_without_primary_is_bad_request() {
    let context = test_state();
    let bitstreams = context.add_bitstreams(1);
    let uri = primary_uri(context.editable_bundle);

    let (status, body) = write(
        &context,
        Method::PUT,
        &uri,
        Some(ADMIN_TOKEN),
        Some(bitstream_uri(bitstreams[0])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NothingToModify");
}

#[tokio::test]
async fn test_set_foreign_bitstream_is_unprocessable() {
    let context = test_state();
    context.add_bitstreams(1);
    let other = context.state.bundles.create_bundle("TEXT").unwrap();
    let foreign = context.state.bundles.add_bitstream(other).unwrap();
    let uri = primary_uri(context.editable_bundle);

    let (status, body) = write(&context, Method::POST, &uri, Some(ADMIN_TOKEN), Some(bitstream_uri(foreign))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UnprocessableReference");

    let (status, _) = write(
        &context,
        Method::POST,
        &uri,
        Some(ADMIN_TOKEN),
        Some(bitstream_uri(BitstreamId::new())),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = write(
        &context,
        Method::POST,
        &uri,
        Some(ADMIN_TOKEN),
        Some("http://localhost/api/core/items/x".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(context.state.bundles.get(context.editable_bundle).unwrap(), None);
}

#[tokio::test]
async fn test_unknown_bundle() {
    let context = test_state();
    let uri = primary_uri(BundleId::new());

    let (status, _) = get(&context, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // reported before the unusable body
    let (status, _) = write(&context, Method::POST, &uri, Some(ADMIN_TOKEN), Some("garbage".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = write(&context, Method::DELETE, &uri, Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bundle_id_is_bad_request() {
    let context = test_state();

    let (status, body) = get(&context, "/api/core/bundles/not-a-uuid/primaryBitstream").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "bundle_id");
}

#[tokio::test]
async fn test_primary_bitstream_writes_require_permission() {
    let context = test_state();
    let bitstreams = context.add_bitstreams(1);
    let uri = primary_uri(context.editable_bundle);
    let body = || Some(bitstream_uri(bitstreams[0]));

    let (status, _) = write(&context, Method::POST, &uri, None, body()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = write(&context, Method::POST, &uri, Some("forged"), body()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the editor holds no grant on this bundle
    let other = context.state.bundles.create_bundle("ORIGINAL").unwrap();
    let foreign = context.state.bundles.add_bitstream(other).unwrap();
    let (status, _) = write(
        &context,
        Method::POST,
        &primary_uri(other),
        Some(EDITOR_TOKEN),
        Some(bitstream_uri(foreign)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(context.state.bundles.get(other).unwrap(), None);
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_operations_are_counted() {
    let metrics = Arc::new(PrometheusMetrics::new().unwrap());
    let mut context = test_state();
    context.state = context.state.clone().with_metrics(metrics.clone());
    let bitstreams = context.add_bitstreams(1);
    let uri = primary_uri(context.editable_bundle);

    write(&context, Method::POST, &uri, Some(ADMIN_TOKEN), Some(bitstream_uri(bitstreams[0]))).await;
    write(&context, Method::POST, &uri, Some(ADMIN_TOKEN), Some(bitstream_uri(bitstreams[0]))).await;
    get(&context, "/api/versioning/versionhistories/zero/lastversion").await;

    assert_eq!(metrics.count("set_primary_bitstream", "success"), 1);
    assert_eq!(metrics.count("set_primary_bitstream", "AlreadySet"), 1);
    assert_eq!(metrics.count("last_version", "InvalidArgument"), 1);
    assert_eq!(metrics.count("last_version", "success"), 0);

    let response = super::metrics(State(context.state.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
