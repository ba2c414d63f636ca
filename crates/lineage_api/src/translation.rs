//! Translation between HTTP input and domain types
//!
//! Path identifiers and paging parameters that cannot be parsed are
//! `InvalidArgument` (400). A bitstream reference that cannot be resolved to
//! a bitstream identifier is `UnprocessableReference` (422).

use lineage_core::{BitstreamId, PageRequest, VersioningError, VersioningResult, VersioningSettings};
use url::Url;

use crate::models::PageQuery;

#[cfg(test)]
#[path = "translation_tests.rs"]
mod tests;

/// Path segment that precedes a bitstream UUID in a bitstream URI
const BITSTREAMS_SEGMENT: &str = "bitstreams";

/// Build a page request from the raw query parameters.
///
/// Missing values fall back to page 0 and the configured default size.
pub fn page_request(settings: &VersioningSettings, query: &PageQuery) -> VersioningResult<PageRequest> {
    let page = parse_page_param("page", query.page.as_deref())?;
    let size = parse_page_param("size", query.size.as_deref())?;

    settings.page_request(page, size)
}

fn parse_page_param(field: &str, raw: Option<&str>) -> VersioningResult<Option<usize>> {
    raw.map(|value| {
        value.trim().parse::<usize>().map_err(|_| {
            VersioningError::invalid_argument(
                field,
                format!("'{}' is not a non-negative integer", value),
            )
        })
    })
    .transpose()
}

/// Resolve a `text/uri-list` body to the bitstream it references.
///
/// The body must hold exactly one URI (comment lines starting with `#` are
/// ignored) whose path ends in `/bitstreams/{uuid}`.
///
/// # Errors
///
/// Returns `VersioningError::UnprocessableReference` when the body is
/// empty, holds several URIs, or the URI does not reference a bitstream.
pub fn parse_bitstream_reference(body: &str) -> VersioningResult<BitstreamId> {
    let uris: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let raw = match uris.as_slice() {
        [single] => *single,
        [] => {
            return Err(VersioningError::unprocessable(
                "",
                "request body must contain a bitstream URI",
            ))
        }
        _ => {
            return Err(VersioningError::unprocessable(
                uris.join(" "),
                "request body must contain exactly one bitstream URI",
            ))
        }
    };

    let url = Url::parse(raw)
        .map_err(|e| VersioningError::unprocessable(raw, format!("not a valid URI: {}", e)))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [.., kind, id] if *kind == BITSTREAMS_SEGMENT => BitstreamId::parse(id).map_err(|_| {
            VersioningError::unprocessable(raw, format!("'{}' is not a valid bitstream UUID", id))
        }),
        _ => Err(VersioningError::unprocessable(
            raw,
            "URI does not reference a bitstream",
        )),
    }
}
