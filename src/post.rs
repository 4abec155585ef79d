use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use thiserror::Error;
use url::Url;

/// One feed entry as the API serves it.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    /// The wire format sends `""` for "no media".
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub media: Option<Url>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub author: Author,
}

impl Post {
    /// When the post was last touched, the key the sort orders compare.
    /// An `updated` stamp missing or older than `created` counts as unedited.
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self.updated {
            Some(updated) if updated >= self.created => updated,
            _ => self.created,
        }
    }
}

#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub avatar: Option<Url>,
}

//===================================================
// Outgoing payloads
//===================================================

/// Payload for publishing a new post.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Url>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Payload for rewriting an existing post.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Url>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a post needs a title")]
    MissingTitle,
    #[error("a post needs a body")]
    MissingBody,
}

fn check_required(title: &str, body: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if body.trim().is_empty() {
        return Err(ValidationError::MissingBody);
    }
    Ok(())
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required(&self.title, &self.body)
    }
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_required(&self.title, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_wire_shape() {
        let json = r#"{
            "id": 7,
            "title": "Hello",
            "body": "First post",
            "media": "",
            "tags": ["intro"],
            "created": "2024-01-01T10:00:00Z",
            "updated": "2024-01-02T10:00:00Z",
            "author": { "name": "jane", "avatar": "" }
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 7);
        assert!(post.media.is_none());
        assert!(post.author.avatar.is_none());
        assert_eq!(post.tags, vec!["intro"]);
    }

    #[test]
    fn decodes_missing_optionals() {
        let json = r#"{
            "id": 8,
            "title": "Bare",
            "body": "No frills",
            "media": "https://cdn.example.dev/pic.jpg",
            "created": "2024-01-01T10:00:00Z",
            "author": { "name": "ola" }
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.media.is_some());
        assert!(post.tags.is_empty());
        assert_eq!(post.updated, None);
        assert_eq!(post.updated_at(), post.created);
    }

    #[test]
    fn updated_never_precedes_created() {
        let json = r#"{
            "id": 9,
            "title": "Skewed",
            "body": "clock drift",
            "created": "2024-02-01T00:00:00Z",
            "updated": "2024-01-01T00:00:00Z",
            "author": { "name": "ola" }
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.updated_at(), post.created);
    }

    #[test]
    fn rejects_blank_required_fields() {
        let blank_title = NewPost {
            title: "   ".to_string(),
            body: "text".to_string(),
            media: None,
            tags: Vec::new(),
        };
        assert_eq!(blank_title.validate(), Err(ValidationError::MissingTitle));

        let blank_body = PostPatch {
            title: "ok".to_string(),
            body: "".to_string(),
            media: None,
        };
        assert_eq!(blank_body.validate(), Err(ValidationError::MissingBody));
    }
}
