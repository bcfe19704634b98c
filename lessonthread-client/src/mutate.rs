use std::sync::Arc;

use crate::{
    api::{Authored, CommentId, CourseId, CreatedComment, Error, LessonId, NewComment},
    capability,
    identity::IdentityProvider,
    remote::{CommentStore, Credential},
    store::InteractionStore,
};

/// Issues create/edit/delete/report requests against the comment store.
///
/// Every failure comes back as an `Error` value for the caller to surface;
/// nothing in here panics or aborts the section. A successful mutation is
/// the caller's cue to run a full reconciliation rather than patch the
/// tree locally.
pub struct MutationController {
    course: CourseId,
    remote: Arc<dyn CommentStore>,
    identity: Arc<dyn IdentityProvider>,
    local: Arc<InteractionStore>,
}

impl MutationController {
    pub fn new(
        course: CourseId,
        remote: Arc<dyn CommentStore>,
        identity: Arc<dyn IdentityProvider>,
        local: Arc<InteractionStore>,
    ) -> MutationController {
        MutationController {
            course,
            remote,
            identity,
            local,
        }
    }

    pub fn local(&self) -> &InteractionStore {
        &self.local
    }

    /// Bearer if the caller has one, else nothing. Create, edit and
    /// report only ever carry the identity assertion.
    fn bearer_credential(&self) -> Credential {
        match self.identity.bearer() {
            Some(bearer) => Credential::Bearer(bearer),
            None => Credential::None,
        }
    }

    /// Delete additionally falls back to the stored deletion credential
    /// when this device authored the item anonymously. A caller with
    /// neither gets `Credential::None`; the request goes out without any
    /// usable credential and the server rejects it.
    fn delete_credential(&self, id: &CommentId) -> Credential {
        if let Some(bearer) = self.identity.bearer() {
            return Credential::Bearer(bearer);
        }
        if let Some(token) = self.local.deletion_credential(id) {
            return Credential::DeletionToken(token);
        }
        Credential::None
    }

    /// Creates a comment (or a reply when `parent` is set). On success,
    /// a response carrying both an id and a deletion token means the
    /// server treated the request as anonymous-but-ownable, and this is
    /// the one path that writes a deletion credential.
    pub async fn create(
        &self,
        lesson: &LessonId,
        text: &str,
        parent: Option<&CommentId>,
        reply_target: Option<(&CommentId, &str)>,
    ) -> Result<CreatedComment, Error> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyText);
        }
        let body = NewComment {
            text: text.to_string(),
            parent_id: parent.cloned(),
            reply_to_id: reply_target.map(|(id, _)| id.clone()),
            reply_to_name: reply_target.map(|(_, name)| name.to_string()),
        };
        let created = self
            .remote
            .create(&self.course, lesson, &body, &self.bearer_credential())
            .await
            .map_err(|err| {
                tracing::warn!(%lesson, %err, "comment creation failed");
                err
            })?;
        if let (Some(id), Some(token)) = (&created.id, &created.deletion_token) {
            self.local.remember_deletion_credential(id, token);
        }
        Ok(created)
    }

    /// Edits an item. The capability check here is a UX gate only; the
    /// server remains authoritative and its rejection message is passed
    /// through verbatim.
    pub async fn edit(
        &self,
        lesson: &LessonId,
        item: &(impl Authored + Sync),
        new_text: &str,
    ) -> Result<(), Error> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return Err(Error::EmptyText);
        }
        let claims = self.identity.claims();
        if !capability::resolve(claims.as_ref(), item, &self.local).can_edit {
            return Err(Error::PermissionDenied);
        }
        self.remote
            .edit(
                &self.course,
                lesson,
                item.item_id(),
                new_text,
                &self.bearer_credential(),
            )
            .await
            .map_err(|err| {
                tracing::warn!(%lesson, id = %item.item_id(), %err, "comment edit failed");
                err
            })
    }

    /// Deletes an item. The stored deletion credential is forgotten only
    /// after the server confirmed the delete; a failure leaves local state
    /// untouched.
    pub async fn delete(&self, lesson: &LessonId, id: &CommentId) -> Result<(), Error> {
        self.remote
            .delete(&self.course, lesson, id, &self.delete_credential(id))
            .await
            .map_err(|err| {
                tracing::warn!(%lesson, %id, %err, "comment delete failed");
                err
            })?;
        self.local.forget_deletion_credential(id);
        Ok(())
    }

    /// Fire-and-forget report; an empty reason is fine.
    pub async fn report(
        &self,
        lesson: &LessonId,
        id: &CommentId,
        reason: Option<&str>,
    ) -> Result<(), Error> {
        self.remote
            .report(&self.course, lesson, id, reason, &self.bearer_credential())
            .await
            .map_err(|err| {
                tracing::warn!(%lesson, %id, %err, "comment report failed");
                err
            })
    }
}
