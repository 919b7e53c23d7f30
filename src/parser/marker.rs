use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::segment::{Segment, SegmentKind, SegmentMetadata};

/// The fixed set of inline annotation tags recognised in `[TAG:payload]` spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Error,
    Correction,
    Note,
    Tip,
    Important,
    Bold,
    Translation,
    VocabWord,
    GrammarPoint,
    EssaySection,
    BusinessTip,
    StoryElement,
}

/// Which metadata field the key part of a keyed payload lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Word,
    Language,
    Category,
}

/// How a marker's payload is turned into a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// The trimmed payload is the content.
    Plain,
    /// `key|content`. A `strict` marker without a `|` is dropped; a lenient one
    /// keeps the whole payload as content and carries no metadata.
    Keyed { field: MetaField, strict: bool },
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 12] = [
        Self::Error,
        Self::Correction,
        Self::Note,
        Self::Tip,
        Self::Important,
        Self::Bold,
        Self::Translation,
        Self::VocabWord,
        Self::GrammarPoint,
        Self::EssaySection,
        Self::BusinessTip,
        Self::StoryElement,
    ];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Correction => "CORRECTION",
            Self::Note => "NOTE",
            Self::Tip => "TIP",
            Self::Important => "IMPORTANT",
            Self::Bold => "BOLD",
            Self::Translation => "TRANSLATION",
            Self::VocabWord => "VOCAB_WORD",
            Self::GrammarPoint => "GRAMMAR_POINT",
            Self::EssaySection => "ESSAY_SECTION",
            Self::BusinessTip => "BUSINESS_TIP",
            Self::StoryElement => "STORY_ELEMENT",
        }
    }

    /// Case-insensitive tag lookup. Tags outside the fixed set are not markers.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    #[must_use]
    pub fn segment_kind(self) -> SegmentKind {
        match self {
            Self::Error => SegmentKind::Error,
            Self::Correction => SegmentKind::Correction,
            Self::Note => SegmentKind::Note,
            Self::Tip => SegmentKind::Tip,
            Self::Important => SegmentKind::Important,
            Self::Bold => SegmentKind::Bold,
            Self::Translation => SegmentKind::Translation,
            Self::VocabWord => SegmentKind::VocabWord,
            Self::GrammarPoint => SegmentKind::GrammarPoint,
            Self::EssaySection => SegmentKind::EssaySection,
            Self::BusinessTip => SegmentKind::BusinessTip,
            Self::StoryElement => SegmentKind::StoryElement,
        }
    }

    #[must_use]
    pub fn payload_shape(self) -> PayloadShape {
        match self {
            Self::Translation => PayloadShape::Keyed {
                field: MetaField::Language,
                strict: true,
            },
            Self::VocabWord => PayloadShape::Keyed {
                field: MetaField::Word,
                strict: true,
            },
            Self::EssaySection | Self::StoryElement => PayloadShape::Keyed {
                field: MetaField::Category,
                strict: false,
            },
            Self::Error
            | Self::Correction
            | Self::Note
            | Self::Tip
            | Self::Important
            | Self::Bold
            | Self::GrammarPoint
            | Self::BusinessTip => PayloadShape::Plain,
        }
    }

    /// Build the segment for one marker occurrence, or `None` when the marker is dropped
    /// (empty payload, or a strict keyed payload with no `|`).
    #[must_use]
    pub fn build_segment(self, payload: &str) -> Option<Segment> {
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }
        let kind = self.segment_kind();
        match self.payload_shape() {
            PayloadShape::Plain => Some(Segment::new(kind, payload)),
            PayloadShape::Keyed { field, strict } => match payload.split_once('|') {
                Some((key, rest)) => {
                    Some(Segment::new(kind, rest.trim()).with_metadata(field.metadata(key.trim())))
                }
                None if strict => None,
                None => Some(Segment::new(kind, payload)),
            },
        }
    }
}

impl MetaField {
    fn metadata(self, value: &str) -> SegmentMetadata {
        let value = Some(value.to_string());
        match self {
            Self::Word => SegmentMetadata {
                word: value,
                ..SegmentMetadata::default()
            },
            Self::Language => SegmentMetadata {
                language: value,
                ..SegmentMetadata::default()
            },
            Self::Category => SegmentMetadata {
                category: value,
                ..SegmentMetadata::default()
            },
        }
    }
}

/// Non-greedy, case-insensitive `[TAG:payload]` matcher over the fixed tag set.
/// Payloads never span a line break.
pub fn marker_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        let tags: Vec<&str> = MarkerKind::ALL.iter().map(|k| k.tag()).collect();
        Regex::new(&format!(r"(?i)\[({}):(.*?)\]", tags.join("|"))).expect("valid marker regex")
    });
    &PATTERN
}
