use std::fmt;

mod capability;
pub use capability::CapabilitySet;

mod comment;
pub use comment::{
    Authored, Comment, CommentsPage, CreatedComment, EditComment, NewComment, Reply, ReportComment,
};

mod error;
pub use error::Error;

mod event;
pub use event::FeedEvent;

mod identity;
pub use identity::IdentityClaims;

pub type Time = chrono::DateTime<chrono::Utc>;

/// Header carrying the anonymous deletion credential on DELETE requests.
pub const DELETION_TOKEN_HEADER: &str = "x-deletion-token";

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> $name {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(CourseId);
string_id!(LessonId);
string_id!(CommentId);
