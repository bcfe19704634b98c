//! In-process stand-in for the remote comment store and its push channel,
//! so the whole client engine can be exercised without a network.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;
use lessonthread_client::{
    api::{
        Authored, Comment, CommentId, CourseId, CreatedComment, Error, FeedEvent, IdentityClaims,
        LessonId, NewComment, Reply,
    },
    CommentStore, Credential,
};
use tokio::sync::mpsc;

pub struct MockServer {
    inner: Mutex<Inner>,
}

struct Inner {
    next_id: u64,
    /// bearer token -> decoded claims; unknown bearers act as anonymous
    identities: HashMap<String, IdentityClaims>,
    lessons: BTreeMap<(CourseId, LessonId), Vec<Comment>>,
    deletion_tokens: HashMap<CommentId, String>,
    reports: HashMap<CommentId, Vec<String>>,
    feeds: HashMap<CourseId, Vec<mpsc::UnboundedSender<String>>>,
}

enum Found {
    TopLevel(usize),
    Reply(usize, usize),
}

impl Inner {
    fn claims_for(&self, credential: &Credential) -> Option<IdentityClaims> {
        match credential {
            Credential::Bearer(token) => self.identities.get(token).cloned(),
            _ => None,
        }
    }

    fn find(comments: &[Comment], id: &CommentId) -> Option<Found> {
        for (ci, comment) in comments.iter().enumerate() {
            if comment.id == *id {
                return Some(Found::TopLevel(ci));
            }
            for (ri, reply) in comment.replies.iter().enumerate() {
                if reply.id == *id {
                    return Some(Found::Reply(ci, ri));
                }
            }
        }
        None
    }

    /// Admin, matching identity field, or matching deletion token.
    fn may_mutate(
        &self,
        claims: Option<&IdentityClaims>,
        item: &impl Authored,
        credential: &Credential,
    ) -> bool {
        if let Some(claims) = claims {
            if claims.is_admin() {
                return true;
            }
            let candidates = claims.candidates();
            let authors = item.author_candidates();
            if candidates
                .iter()
                .any(|candidate| authors.iter().any(|author| author == candidate))
            {
                return true;
            }
        }
        if let Credential::DeletionToken(token) = credential {
            if self.deletion_tokens.get(item.item_id()) == Some(token) {
                return true;
            }
        }
        false
    }

    fn relay(&mut self, course: &CourseId, lesson: &LessonId) {
        let event = FeedEvent::comment(Some(lesson.clone()));
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(_) => return,
        };
        if let Some(feeds) = self.feeds.get_mut(course) {
            feeds.retain(|feed| feed.send(payload.clone()).is_ok());
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            inner: Mutex::new(Inner {
                next_id: 1,
                identities: HashMap::new(),
                lessons: BTreeMap::new(),
                deletion_tokens: HashMap::new(),
                reports: HashMap::new(),
                feeds: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a bearer token the server will recognize.
    pub fn register_identity(&self, token: impl Into<String>, claims: IdentityClaims) {
        self.lock().identities.insert(token.into(), claims);
    }

    /// Course-scoped push channel; every comment mutation in the course is
    /// relayed as a `{"type":"comment","lessonId":...}` payload.
    pub fn feed(&self, course: &CourseId) -> mpsc::UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.lock()
            .feeds
            .entry(course.clone())
            .or_insert_with(Vec::new)
            .push(sender);
        receiver
    }

    /// Test helper: the deletion token the server issued for `id`.
    pub fn test_deletion_token(&self, id: &CommentId) -> Option<String> {
        self.lock().deletion_tokens.get(id).cloned()
    }

    /// Test helper: reasons reported against `id`.
    pub fn test_reports(&self, id: &CommentId) -> Vec<String> {
        self.lock().reports.get(id).cloned().unwrap_or_default()
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentStore for MockServer {
    async fn list(&self, course: &CourseId, lesson: &LessonId) -> Result<Vec<Comment>, Error> {
        Ok(self
            .lock()
            .lessons
            .get(&(course.clone(), lesson.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn create(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        comment: &NewComment,
        credential: &Credential,
    ) -> Result<CreatedComment, Error> {
        if comment.text.trim().is_empty() {
            return Err(Error::Rejected(String::from("comment text cannot be empty")));
        }
        let mut inner = self.lock();
        let claims = inner.claims_for(credential);

        let n = inner.next_id;
        inner.next_id += 1;
        let id = CommentId::new(format!("c{n}"));

        let author = claims
            .as_ref()
            .and_then(|c| {
                c.name
                    .clone()
                    .or_else(|| c.preferred_handle.clone())
                    .or_else(|| c.email.clone())
            })
            .unwrap_or_else(|| String::from("Anonymous"));
        let author_email = claims.as_ref().and_then(|c| c.email.clone());
        let author_id = claims.as_ref().and_then(|c| c.subject.clone());
        let role = claims.as_ref().and_then(|c| c.role.clone());

        let comments = inner
            .lessons
            .entry((course.clone(), lesson.clone()))
            .or_insert_with(Vec::new);

        match &comment.parent_id {
            None => comments.push(Comment {
                id: id.clone(),
                author,
                role,
                author_email,
                author_id,
                text: comment.text.clone(),
                created_at: Some(Utc::now()),
                replies: vec![],
            }),
            Some(parent_id) => {
                // Replies flatten onto the nearest top-level comment, even
                // when the client names a reply as the parent.
                let parent_idx = match Inner::find(comments, parent_id) {
                    Some(Found::TopLevel(ci)) | Some(Found::Reply(ci, _)) => ci,
                    None => {
                        return Err(Error::Rejected(String::from("no such parent comment")))
                    }
                };
                comments[parent_idx].replies.push(Reply {
                    id: id.clone(),
                    author,
                    author_email,
                    author_id,
                    text: comment.text.clone(),
                    created_at: Some(Utc::now()),
                    reply_to_id: comment.reply_to_id.clone(),
                    reply_to_name: comment.reply_to_name.clone(),
                });
            }
        }

        // Anonymous creations get a deletion token, the author's only
        // proof of ownership.
        let deletion_token = match claims {
            Some(_) => None,
            None => {
                let token = format!("tok-{n}");
                inner.deletion_tokens.insert(id.clone(), token.clone());
                Some(token)
            }
        };

        inner.relay(course, lesson);
        Ok(CreatedComment {
            id: Some(id),
            deletion_token,
        })
    }

    async fn edit(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        text: &str,
        credential: &Credential,
    ) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::Rejected(String::from("comment text cannot be empty")));
        }
        let mut inner = self.lock();
        let claims = inner.claims_for(credential);
        let key = (course.clone(), lesson.clone());
        let comments = inner
            .lessons
            .get(&key)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        let found = Inner::find(comments, id)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        let allowed = match &found {
            Found::TopLevel(ci) => inner.may_mutate(claims.as_ref(), &comments[*ci], credential),
            Found::Reply(ci, ri) => {
                inner.may_mutate(claims.as_ref(), &comments[*ci].replies[*ri], credential)
            }
        };
        if !allowed {
            return Err(Error::Rejected(String::from(
                "only the author may edit this comment",
            )));
        }
        let comments = inner
            .lessons
            .get_mut(&key)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        match found {
            Found::TopLevel(ci) => comments[ci].text = text.to_string(),
            Found::Reply(ci, ri) => comments[ci].replies[ri].text = text.to_string(),
        }
        inner.relay(course, lesson);
        Ok(())
    }

    async fn delete(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        credential: &Credential,
    ) -> Result<(), Error> {
        let mut inner = self.lock();
        let claims = inner.claims_for(credential);
        let key = (course.clone(), lesson.clone());
        let comments = inner
            .lessons
            .get(&key)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        let found = Inner::find(comments, id)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        let allowed = match &found {
            Found::TopLevel(ci) => inner.may_mutate(claims.as_ref(), &comments[*ci], credential),
            Found::Reply(ci, ri) => {
                inner.may_mutate(claims.as_ref(), &comments[*ci].replies[*ri], credential)
            }
        };
        if !allowed {
            return Err(Error::Rejected(String::from(
                "only the author may delete this comment",
            )));
        }
        let comments = inner
            .lessons
            .get_mut(&key)
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        match found {
            Found::TopLevel(ci) => {
                comments.remove(ci);
            }
            Found::Reply(ci, ri) => {
                comments[ci].replies.remove(ri);
            }
        }
        inner.deletion_tokens.remove(id);
        inner.relay(course, lesson);
        Ok(())
    }

    async fn report(
        &self,
        course: &CourseId,
        lesson: &LessonId,
        id: &CommentId,
        reason: Option<&str>,
        _credential: &Credential,
    ) -> Result<(), Error> {
        let mut inner = self.lock();
        let comments = inner
            .lessons
            .get(&(course.clone(), lesson.clone()))
            .ok_or_else(|| Error::Rejected(String::from("no such comment")))?;
        if Inner::find(comments, id).is_none() {
            return Err(Error::Rejected(String::from("no such comment")));
        }
        inner
            .reports
            .entry(id.clone())
            .or_insert_with(Vec::new)
            .push(reason.unwrap_or("").to_string());
        Ok(())
    }
}
