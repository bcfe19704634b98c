use async_trait::async_trait;

use crate::api::{
    Comment, CommentId, CourseId, CreatedComment, Error, LessonId, NewComment,
};

/// What authenticates one request to the comment store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Credential {
    /// Request goes out unauthenticated; the server decides what an
    /// anonymous caller may do.
    None,
    /// Opaque identity assertion, sent as an authorization bearer header.
    Bearer(String),
    /// Server-issued anonymous deletion credential, sent in a side-channel
    /// header. Only meaningful on delete.
    DeletionToken(String),
}

/// The remote comment store, as the engine sees it.
///
/// The HTTP implementation lives in this crate; the mock server implements
/// the same trait so the whole engine runs in-process under test.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn list(&self, course: &CourseId, lesson: &LessonId) -> Result<Vec<Comment>, Error>;

    async fn create(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        comment: &NewComment,
        credential: &Credential,
    ) -> Result<CreatedComment, Error>;

    async fn edit(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        text: &str,
        credential: &Credential,
    ) -> Result<(), Error>;

    async fn delete(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        credential: &Credential,
    ) -> Result<(), Error>;

    async fn report(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        reason: Option<&str>,
        credential: &Credential,
    ) -> Result<(), Error>;
}
