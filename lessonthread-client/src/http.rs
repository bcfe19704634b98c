use async_trait::async_trait;

use crate::{
    api::{
        Comment, CommentId, CommentsPage, CourseId, CreatedComment, EditComment, Error, LessonId,
        NewComment, ReportComment, DELETION_TOKEN_HEADER,
    },
    remote::{CommentStore, Credential},
};

/// reqwest-backed implementation of the comment-store collaborator.
pub struct HttpCommentStore {
    host: String,
    client: reqwest::Client,
}

impl HttpCommentStore {
    pub fn new(host: impl Into<String>) -> HttpCommentStore {
        HttpCommentStore {
            host: host.into(),
            client: reqwest::Client::new(),
        }
    }

    fn comments_url(&self, course: &CourseId, lesson: &LessonId) -> String {
        format!("{}/api/courses/{}/lessons/{}/comments", self.host, course, lesson)
    }

    fn comment_url(&self, course: &CourseId, lesson: &LessonId, id: &CommentId) -> String {
        format!("{}/{}", self.comments_url(course, lesson), id)
    }

    fn with_credential(
        req: reqwest::RequestBuilder,
        credential: &Credential,
    ) -> reqwest::RequestBuilder {
        match credential {
            Credential::None => req,
            Credential::Bearer(token) => req.bearer_auth(token),
            Credential::DeletionToken(token) => req.header(DELETION_TOKEN_HEADER, token),
        }
    }
}

/// Maps transport failures and non-2xx statuses into the error taxonomy,
/// surfacing a structured server message verbatim when the body has one.
async fn check(resp: Result<reqwest::Response, reqwest::Error>) -> Result<reqwest::Response, Error> {
    let resp = resp.map_err(|err| Error::Network(err.to_string()))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    Err(Error::from_response_body(status, &body))
}

#[async_trait]
impl CommentStore for HttpCommentStore {
    async fn list(&self, course: &CourseId, lesson: &LessonId) -> Result<Vec<Comment>, Error> {
        let resp = check(self.client.get(self.comments_url(course, lesson)).send().await).await?;
        let page: CommentsPage = resp
            .json()
            .await
            .map_err(|err| Error::Network(format!("failed parsing comment list: {err}")))?;
        Ok(page.comments)
    }

    async fn create(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        comment: &NewComment,
        credential: &Credential,
    ) -> Result<CreatedComment, Error> {
        let req = self.client.post(self.comments_url(course, lesson)).json(comment);
        let resp = check(Self::with_credential(req, credential).send().await).await?;
        resp.json()
            .await
            .map_err(|err| Error::Network(format!("failed parsing create response: {err}")))
    }

    async fn edit(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        text: &str,
        credential: &Credential,
    ) -> Result<(), Error> {
        let req = self
            .client
            .put(self.comment_url(course, lesson, id))
            .json(&EditComment {
                text: text.to_string(),
            });
        check(Self::with_credential(req, credential).send().await).await?;
        Ok(())
    }

    async fn delete(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        credential: &Credential,
    ) -> Result<(), Error> {
        let req = self.client.delete(self.comment_url(course, lesson, id));
        check(Self::with_credential(req, credential).send().await).await?;
        Ok(())
    }

    async fn report(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        reason: Option<&str>,
        credential: &Credential,
    ) -> Result<(), Error> {
        let req = self
            .client
            .post(format!("{}/report", self.comment_url(course, lesson, id)))
            .json(&ReportComment {
                reason: reason.map(String::from),
            });
        check(Self::with_credential(req, credential).send().await).await?;
        Ok(())
    }
}
