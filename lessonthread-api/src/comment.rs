use crate::{CommentId, Time};

/// A top-level comment as the server returns it.
///
/// The server's list order is the display order; the client never reorders.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,

    /// Author display name
    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Identity fields used only for ownership comparison
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Time>,

    /// Server-supplied order = display order; missing list = no replies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Reply>,
}

/// A reply, always flattened one level under its top-level comment.
///
/// `reply_to_id`/`reply_to_name` only identify which sibling the reply
/// targets for chain-label display; they are not a structural parent.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Reply {
    pub id: CommentId,

    pub author: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Time>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<CommentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_name: Option<String>,
}

/// Item id plus author candidate strings, for capability resolution.
///
/// Both `Comment` and `Reply` implement this so the resolver does not care
/// which level of the thread it is looking at.
pub trait Authored {
    fn item_id(&self) -> &CommentId;
    fn author_name(&self) -> &str;
    fn author_email(&self) -> Option<&str>;
    fn author_id(&self) -> Option<&str>;

    fn author_candidates(&self) -> Vec<&str> {
        let mut candidates = vec![self.author_name()];
        candidates.extend(self.author_email());
        candidates.extend(self.author_id());
        candidates.retain(|c| !c.is_empty());
        candidates
    }
}

impl Authored for Comment {
    fn item_id(&self) -> &CommentId {
        &self.id
    }

    fn author_name(&self) -> &str {
        &self.author
    }

    fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }
}

impl Authored for Reply {
    fn item_id(&self) -> &CommentId {
        &self.id
    }

    fn author_name(&self) -> &str {
        &self.author
    }

    fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    fn author_id(&self) -> Option<&str> {
        self.author_id.as_deref()
    }
}

/// Envelope of `GET .../comments`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentsPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Body of `POST .../comments`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub text: String,

    #[serde(
        rename = "parentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<CommentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<CommentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_name: Option<String>,
}

/// Response of `POST .../comments`.
///
/// `deletion_token` is present only when the server treated the request as
/// anonymous-but-ownable; it is the device's sole proof of authorship.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CreatedComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_token: Option<String>,
}

/// Body of `PUT .../comments/{id}`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub text: String,
}

/// Body of `POST .../comments/{id}/report`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReportComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_page_wire_format() {
        let raw = r#"{
            "comments": [
                {
                    "id": "c1",
                    "author": "Alice",
                    "role": "teacher",
                    "author_email": "alice@example.com",
                    "text": "welcome to the lesson",
                    "created_at": "2024-03-01T10:00:00Z",
                    "replies": [
                        {
                            "id": "c2",
                            "author": "Bob",
                            "text": "thanks!",
                            "reply_to_name": "Alice"
                        }
                    ]
                },
                {
                    "id": "c3",
                    "author": "Carol",
                    "text": "no replies here"
                }
            ]
        }"#;
        let page: CommentsPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.comments.len(), 2);
        let first = &page.comments[0];
        assert_eq!(first.id, CommentId::new("c1"));
        assert_eq!(first.role.as_deref(), Some("teacher"));
        assert_eq!(first.replies.len(), 1);
        assert_eq!(first.replies[0].reply_to_name.as_deref(), Some("Alice"));
        // Missing reply list deserializes as empty, not as an error
        assert!(page.comments[1].replies.is_empty());
        assert!(page.comments[1].created_at.is_none());
    }

    #[test]
    fn new_comment_body_field_names() {
        let body = NewComment {
            text: String::from("hi"),
            parent_id: Some(CommentId::new("c1")),
            reply_to_id: Some(CommentId::new("c2")),
            reply_to_name: Some(String::from("Bob")),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["parentId"], "c1");
        assert_eq!(json["reply_to_id"], "c2");
        assert_eq!(json["reply_to_name"], "Bob");

        let top_level = NewComment {
            text: String::from("hi"),
            parent_id: None,
            reply_to_id: None,
            reply_to_name: None,
        };
        let json = serde_json::to_string(&top_level).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);
    }

    #[test]
    fn author_candidates_skip_absent_fields() {
        let comment = Comment {
            id: CommentId::new("c1"),
            author: String::from("Alice"),
            role: None,
            author_email: None,
            author_id: Some(String::from("u-1")),
            text: String::from("hello"),
            created_at: None,
            replies: vec![],
        };
        assert_eq!(comment.author_candidates(), vec!["Alice", "u-1"]);
    }
}
