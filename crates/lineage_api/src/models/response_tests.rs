use super::*;
use lineage_core::{
    ItemId, PageRequest, SubmitterId, Timestamp, VersionHistoryId, VersionId,
};

fn version(id: i32, sequence_id: i64) -> Version {
    Version {
        id: VersionId::new(id).unwrap(),
        history_id: VersionHistoryId::new(3).unwrap(),
        item_id: ItemId::new(),
        sequence_id,
        summary: format!("v{sequence_id}"),
        submitter_id: SubmitterId::new(),
        created_at: Timestamp::now(),
    }
}

#[test]
fn test_version_response_uses_camel_case() {
    let json = serde_json::to_value(VersionResponse::from(version(4, 98))).unwrap();

    assert_eq!(json["id"], 4);
    assert_eq!(json["version"], 98);
    assert_eq!(json["versionHistoryId"], 3);
    assert!(json.get("itemId").is_some());
    assert!(json.get("submitterId").is_some());
    assert!(chrono::DateTime::parse_from_rfc3339(json["created"].as_str().unwrap()).is_ok());
}

#[test]
fn test_version_page_response_carries_metadata() {
    let page = Page::slice(
        PageRequest::new(0, 2).unwrap(),
        3,
        vec![version(3, 30), version(2, 20), version(1, 10)],
    );

    let json = serde_json::to_value(VersionPageResponse::from(page)).unwrap();

    assert_eq!(json["versions"].as_array().unwrap().len(), 2);
    assert_eq!(json["versions"][0]["version"], 30);
    assert_eq!(json["page"]["totalElements"], 3);
    assert_eq!(json["page"]["totalPages"], 2);
}

#[test]
fn test_bundle_response_serializes_unset_primary_as_null() {
    let snapshot = BundleSnapshot {
        id: BundleId::new(),
        name: "ORIGINAL".to_string(),
        bitstreams: vec![BitstreamId::new()],
        primary_bitstream: None,
    };

    let json = serde_json::to_value(BundleResponse::from(snapshot)).unwrap();

    assert!(json["primaryBitstream"].is_null());
    assert_eq!(json["bitstreams"].as_array().unwrap().len(), 1);
}

#[test]
fn test_history_response() {
    let summary = VersionHistorySummary {
        id: VersionHistoryId::new(1).unwrap(),
        version_count: 2,
        draft_version: true,
    };

    let json = serde_json::to_value(VersionHistoryResponse::from(summary)).unwrap();

    assert_eq!(json["draftVersion"], true);
    assert_eq!(json["versionCount"], 2);
}
