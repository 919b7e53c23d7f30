use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The kind of a parsed segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Text,
    Error,
    Correction,
    Note,
    Important,
    Tip,
    Heading,
    Bullet,
    Numbered,
    Bold,
    Translation,
    VocabWord,
    GrammarPoint,
    EssaySection,
    BusinessTip,
    StoryElement,
    /// A kind name this build does not know, kept verbatim from the wire.
    Other(String),
}

impl SegmentKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Error => "error",
            Self::Correction => "correction",
            Self::Note => "note",
            Self::Important => "important",
            Self::Tip => "tip",
            Self::Heading => "heading",
            Self::Bullet => "bullet",
            Self::Numbered => "numbered",
            Self::Bold => "bold",
            Self::Translation => "translation",
            Self::VocabWord => "vocab_word",
            Self::GrammarPoint => "grammar_point",
            Self::EssaySection => "essay_section",
            Self::BusinessTip => "business_tip",
            Self::StoryElement => "story_element",
            Self::Other(s) => s.as_str(),
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "error" => Self::Error,
            "correction" => Self::Correction,
            "note" => Self::Note,
            "important" => Self::Important,
            "tip" => Self::Tip,
            "heading" => Self::Heading,
            "bullet" => Self::Bullet,
            "numbered" => Self::Numbered,
            "bold" => Self::Bold,
            "translation" => Self::Translation,
            "vocab_word" => Self::VocabWord,
            "grammar_point" => Self::GrammarPoint,
            "essay_section" => Self::EssaySection,
            "business_tip" => Self::BusinessTip,
            "story_element" => Self::StoryElement,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for SegmentKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SegmentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Structured fields carried by keyed markers (`[VOCAB_WORD:word|gloss]` and friends).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A typed unit of parser output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub content: String,
    /// Source text before cleaning. Never set by the parser; consumers may fill it.
    #[serde(
        rename = "originalText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_text: Option<String>,
    /// Nesting or heading level. Never set by the parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SegmentMetadata>,
}

impl Segment {
    #[must_use]
    pub fn new(kind: SegmentKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            original_text: None,
            level: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(SegmentKind::Text, content)
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: SegmentMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == SegmentKind::Text
    }
}
