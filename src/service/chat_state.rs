//! Rules shared by every path that touches chat state: the assignment
//! transition, content defaulting and media classification.

use uuid::Uuid;

use crate::models::{
    chatmodel::{ChatCategory, ChatStatus, ChatUpdate},
    messagemodel::MediaType,
};

/// Stored instead of empty message content.
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "[Mensagem sem conteúdo]";

/// Display name for contacts that announce neither a push name nor a name.
pub const UNKNOWN_CONTACT_NAME: &str = "Desconhecido";

/// The `{status, category}` pair implied by an assignment.
pub fn assignment_state(assigned_to: Option<Uuid>) -> (ChatStatus, ChatCategory) {
    match assigned_to {
        Some(_) => (ChatStatus::Open, ChatCategory::Mine),
        None => (ChatStatus::Unassigned, ChatCategory::Unassigned),
    }
}

/// A chat update that assigns (or unassigns) and moves status/category with it.
pub fn assignment_update(assigned_to: Option<Uuid>) -> ChatUpdate {
    let (status, category) = assignment_state(assigned_to);
    ChatUpdate {
        assigned_to: Some(assigned_to),
        status: Some(status),
        category: Some(category),
        is_important: None,
    }
}

/// First non-empty candidate, or the placeholder.
pub fn resolve_content<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(EMPTY_CONTENT_PLACEHOLDER)
        .to_string()
}

/// Accepts a MIME type (`image/jpeg`) or a bare kind (`video`).
pub fn classify_media(kind: &str) -> Option<MediaType> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return None;
    }

    let major = kind.split('/').next().unwrap_or_default();
    match major {
        "image" | "sticker" => Some(MediaType::Image),
        "video" => Some(MediaType::Video),
        "audio" | "ptt" => Some(MediaType::Audio),
        _ => Some(MediaType::Document),
    }
}
