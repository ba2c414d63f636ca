//! Shared fixtures for the HTTP tests

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use lineage_core::{
    BitstreamId, BundleId, ItemId, ItemStage, NewVersion, SubmitterId, Version, VersionHistoryId,
    VersioningSettings,
};
use tower::ServiceExt;

use crate::{AppState, ConfiguredAuthorizer};

pub(crate) const ADMIN_TOKEN: &str = "admin-token";
pub(crate) const EDITOR_TOKEN: &str = "editor-token";

/// Application state plus one bundle the editor may modify
pub(crate) struct TestContext {
    pub state: AppState,
    pub editable_bundle: BundleId,
}

impl TestContext {
    /// Add a version whose item is in `stage`
    pub fn add_version(&self, history: VersionHistoryId, sequence_id: i64, stage: ItemStage) -> Version {
        let item = ItemId::new();
        self.state.items.set_stage(item, stage).unwrap();
        self.state
            .histories
            .add_version(
                history,
                NewVersion::new(item, sequence_id, format!("version {sequence_id}"), SubmitterId::new()),
            )
            .unwrap()
    }

    /// Add bitstreams to the editable bundle
    pub fn add_bitstreams(&self, count: usize) -> Vec<BitstreamId> {
        (0..count)
            .map(|_| self.state.bundles.add_bitstream(self.editable_bundle).unwrap())
            .collect()
    }
}

pub(crate) fn test_state() -> TestContext {
    test_state_with(VersioningSettings::default())
}

pub(crate) fn test_state_with(settings: VersioningSettings) -> TestContext {
    let mut state = AppState::new(settings, Arc::new(ConfiguredAuthorizer::new()));
    let editable_bundle = state.bundles.create_bundle("ORIGINAL").unwrap();
    state.authorizer = Arc::new(
        ConfiguredAuthorizer::new()
            .with_admin("admin", ADMIN_TOKEN)
            .with_editor("editor", EDITOR_TOKEN, [editable_bundle]),
    );

    TestContext {
        state,
        editable_bundle,
    }
}

/// Build a request, optionally authenticated and with a `text/uri-list` body
pub(crate) fn request(method: Method, uri: &str, token: Option<&str>, body: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "text/uri-list")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and return the status and the parsed JSON body (Null when empty)
pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response: Response<Body> = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return (status, serde_json::Value::Null);
    }
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// URI of a bitstream as clients send it
pub(crate) fn bitstream_uri(bitstream: BitstreamId) -> String {
    format!("http://localhost:8080/server/api/core/bitstreams/{bitstream}")
}
