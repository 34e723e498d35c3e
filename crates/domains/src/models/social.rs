use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// A user profile mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    /// Lower-case handle used for `@handle` mentions. Unique across users.
    pub handle: String,
    pub is_verified: bool,
    pub joined_at: DateTime<Utc>,
}

/// Profile fields pushed by the client on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSync {
    pub id: UserId,
    pub name: String,
    pub handle: String,
}

/// A directed follow relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Followers,
    Following,
}

/// Final state after a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowToggle {
    pub is_following: bool,
    /// Followers of the followee.
    pub followers_count: u64,
    /// Accounts the follower follows.
    pub following_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

/// Characters a handle keeps after normalization.
fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Punctuation people type inside handles (`jane.doe`, `jane-doe`). Dropped by
/// normalization, and allowed between handle characters in a mention.
fn is_handle_separator(c: char) -> bool {
    matches!(c, '.' | '-')
}

/// Lower-cases a handle and keeps only ASCII alphanumerics and underscores.
/// Returns `None` when nothing usable remains.
pub fn normalize_handle(raw: &str) -> Option<String> {
    let handle: String = raw
        .trim()
        .trim_start_matches('@')
        .chars()
        .filter(|c| is_handle_char(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (!handle.is_empty()).then_some(handle)
}

/// Byte length of the mention token at the start of `rest`: handle characters,
/// plus separators that sit between two of them.
fn mention_len(rest: &str) -> usize {
    let mut end = 0;
    let mut chars = rest.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if is_handle_char(c) {
            end = idx + c.len_utf8();
        } else if is_handle_separator(c)
            && end > 0
            && chars.peek().is_some_and(|(_, next)| is_handle_char(*next))
        {
            continue;
        } else {
            break;
        }
    }
    end
}

/// Distinct `@handle` mentions in a text, in order of first appearance. Each
/// mention goes through [`normalize_handle`], so it matches the stored handle.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut prev: Option<char> = None;
    for (idx, c) in text.char_indices() {
        let at_word_start = prev.map_or(true, |p| !(p.is_alphanumeric() || p == '_'));
        if c == '@' && at_word_start {
            let rest = &text[idx + 1..];
            if let Some(handle) = normalize_handle(&rest[..mention_len(rest)]) {
                if !found.contains(&handle) {
                    found.push(handle);
                }
            }
        }
        prev = Some(c);
    }
    found
}
