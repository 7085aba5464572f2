//! Inline annotation tag grammar.
//!
//! Scene text may carry at most one overlay tag (`[I-keyword]content[/I]`)
//! and one sound-effect tag (`[S-keyword]content[/S]`). The tagged content
//! is part of the spoken script; only the bracket syntax is annotation.
//! More than one tag of a kind is an explicit unsupported-input error, not
//! a silent first-match.

use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Event mapping and timeline reconciliation for parsed tags.
pub mod events;

static OVERLAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[I-([^\]]+)\](.*?)\[/I\]").expect("overlay tag pattern"));
static SOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[S-([^\]]+)\](.*?)\[/S\]").expect("sound tag pattern"));

/// The two annotation kinds the grammar supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Overlay,
    SoundEffect,
}

impl AnnotationKind {
    fn pattern(self) -> &'static Regex {
        match self {
            AnnotationKind::Overlay => &OVERLAY_RE,
            AnnotationKind::SoundEffect => &SOUND_RE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AnnotationKind::Overlay => "overlay",
            AnnotationKind::SoundEffect => "sound-effect",
        }
    }
}

/// One parsed tag: the asset keyword and the spoken content it anchors to.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTag {
    pub kind: AnnotationKind,
    pub keyword: String,
    pub content: String,
}

/// Finds the tag of the given kind, if any. A second tag of the same kind
/// is an `UnsupportedAnnotation` error.
pub fn find_tag(text: &str, kind: AnnotationKind) -> CoreResult<Option<AnnotationTag>> {
    let mut captures = kind.pattern().captures_iter(text);
    let first = match captures.next() {
        Some(caps) => caps,
        None => return Ok(None),
    };
    if captures.next().is_some() {
        return Err(CoreError::UnsupportedAnnotation(format!(
            "more than one {} tag in scene text",
            kind.label()
        )));
    }
    Ok(Some(AnnotationTag {
        kind,
        keyword: first[1].trim().to_string(),
        content: first[2].to_string(),
    }))
}

/// Parses all tags in scene text (at most one per kind).
pub fn parse_tags(text: &str) -> CoreResult<Vec<AnnotationTag>> {
    let mut tags = Vec::new();
    if let Some(tag) = find_tag(text, AnnotationKind::SoundEffect)? {
        tags.push(tag);
    }
    if let Some(tag) = find_tag(text, AnnotationKind::Overlay)? {
        tags.push(tag);
    }
    Ok(tags)
}

/// Removes tag syntax, keeping the spoken content. The result is what the
/// narration collaborator speaks and what aligned segments contain.
pub fn strip_tags(text: &str) -> String {
    let stripped = OVERLAY_RE.replace_all(text, "$2");
    SOUND_RE.replace_all(&stripped, "$2").into_owned()
}
