//! Segmentation engine: annotated tutor text in, ordered segments out.
//!
//! Parsing runs in two passes. [`normalize`] strips markdown decoration from the
//! whole message, then a single left-to-right scan pulls out `[TAG:payload]`
//! markers and the text between them. Both the synchronous path and the
//! background worker drive the same [`parse_with`].

pub mod marker;
pub mod normalize;

pub use marker::{marker_pattern, MarkerKind, MetaField, PayloadShape};
pub use normalize::normalize;

use crate::models::segment::Segment;

/// Parse a message into segments. Never returns an empty list.
#[must_use]
pub fn parse(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    parse_with(content, |segment| segments.push(segment));
    segments
}

/// Stream segments to `emit` in document order and return how many were emitted.
///
/// When the scan produces nothing, a single text segment holding the whole
/// cleaned content is emitted, so the count is always at least one.
pub fn parse_with<F>(content: &str, mut emit: F) -> usize
where
    F: FnMut(Segment),
{
    let cleaned = normalize(content);
    let mut emitted = 0;
    let mut last = 0;

    for caps in marker_pattern().captures_iter(&cleaned) {
        let (Some(whole), Some(tag), Some(payload)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let Some(kind) = MarkerKind::from_tag(tag.as_str()) else {
            // not a marker: leave the span inside the surrounding text
            continue;
        };

        if let Some(text) = text_between(&cleaned[last..whole.start()]) {
            emit(text);
            emitted += 1;
        }
        if let Some(segment) = kind.build_segment(payload.as_str()) {
            emit(segment);
            emitted += 1;
        }
        last = whole.end();
    }

    if let Some(text) = text_between(&cleaned[last..]) {
        emit(text);
        emitted += 1;
    }

    if emitted == 0 {
        emit(Segment::text(cleaned));
        emitted = 1;
    }
    emitted
}

/// Text between markers survives when it has visible content or carries a line
/// break. Plain spacing between adjacent markers is dropped.
fn text_between(span: &str) -> Option<Segment> {
    if !span.trim().is_empty() || span.contains('\n') {
        Some(Segment::text(span))
    } else {
        None
    }
}
