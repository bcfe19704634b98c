use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    api::{Authored, CommentId, CourseId, Error, LessonId},
    capability,
    identity::IdentityProvider,
    mutate::MutationController,
    remote::CommentStore,
    store::InteractionStore,
    thread::{self, RenderNode},
};

/// Lifecycle of one comment section. There is no terminal state; the
/// section keeps cycling through reconciliation for the life of the page.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionState {
    Idle,
    Loading,
    Rendered,
    LoadFailed,
}

/// What the page should currently show for the section. `Empty` ("no
/// comments yet") and `Failed` are distinct conditions on purpose.
#[derive(Clone, Debug, PartialEq)]
pub enum SectionView {
    Loading,
    Empty,
    Thread(Vec<RenderNode>),
    Failed(String),
}

/// Where the drawn section goes. DOM construction is a collaborator; the
/// engine only pushes views. A redraw replaces the whole section, so any
/// transient UI (open reply forms, menus) collapses. Accepted behavior,
/// not a bug.
pub trait RenderSink: Send + Sync {
    fn render(&self, view: SectionView);
}

/// Orchestrates reconciliation for one lesson section: fetch the
/// authoritative list, build the tree, resolve capabilities, push the view.
/// User mutations and push events both funnel into `reconcile`.
///
/// Overlapping reconciliations are not sequenced: the last response to
/// resolve determines the rendered state. Comments are append-mostly and
/// every trigger re-fetches, so a stale winner is corrected by the next
/// cycle.
pub struct RenderCoordinator {
    course: CourseId,
    lesson: LessonId,
    remote: Arc<dyn CommentStore>,
    identity: Arc<dyn IdentityProvider>,
    local: Arc<InteractionStore>,
    sink: Arc<dyn RenderSink>,
    state: Mutex<SectionState>,
    mutations: MutationController,
}

impl RenderCoordinator {
    pub fn new(
        course: CourseId,
        lesson: LessonId,
        remote: Arc<dyn CommentStore>,
        identity: Arc<dyn IdentityProvider>,
        local: Arc<InteractionStore>,
        sink: Arc<dyn RenderSink>,
    ) -> RenderCoordinator {
        let mutations = MutationController::new(
            course.clone(),
            remote.clone(),
            identity.clone(),
            local.clone(),
        );
        RenderCoordinator {
            course,
            lesson,
            remote,
            identity,
            local,
            sink,
            state: Mutex::new(SectionState::Idle),
            mutations,
        }
    }

    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    pub fn state(&self) -> SectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// The single source of rendering truth: re-fetch, rebuild, resolve,
    /// redraw. Output depends only on this fetch, never on prior rendered
    /// state.
    pub async fn reconcile(&self) {
        self.set_state(SectionState::Loading);
        self.sink.render(SectionView::Loading);
        match self.remote.list(&self.course, &self.lesson).await {
            Err(err) => {
                tracing::error!(%err, lesson = %self.lesson, "failed loading comments");
                self.set_state(SectionState::LoadFailed);
                self.sink.render(SectionView::Failed(err.to_string()));
            }
            Ok(comments) if comments.is_empty() => {
                self.set_state(SectionState::Rendered);
                self.sink.render(SectionView::Empty);
            }
            Ok(comments) => {
                let claims = self.identity.claims();
                let mut nodes = thread::build(&comments);
                for node in &mut nodes {
                    node.caps = capability::resolve(claims.as_ref(), &node.comment, &self.local);
                    for reply in &mut node.replies {
                        reply.caps =
                            capability::resolve(claims.as_ref(), &reply.reply, &self.local);
                    }
                }
                self.set_state(SectionState::Rendered);
                self.sink.render(SectionView::Thread(nodes));
            }
        }
    }

    pub async fn post_comment(&self, text: &str) -> Result<(), Error> {
        self.mutations.create(&self.lesson, text, None, None).await?;
        self.reconcile().await;
        Ok(())
    }

    /// Replying to a reply keeps the top-level comment as the structural
    /// parent; `target` only feeds the chain label.
    pub async fn post_reply(
        &self,
        parent: &CommentId,
        text: &str,
        target: Option<(&CommentId, &str)>,
    ) -> Result<(), Error> {
        self.mutations
            .create(&self.lesson, text, Some(parent), target)
            .await?;
        self.reconcile().await;
        Ok(())
    }

    pub async fn edit_item(
        &self,
        item: &(impl Authored + Sync),
        new_text: &str,
    ) -> Result<(), Error> {
        self.mutations.edit(&self.lesson, item, new_text).await?;
        self.reconcile().await;
        Ok(())
    }

    pub async fn delete_item(&self, id: &CommentId) -> Result<(), Error> {
        self.mutations.delete(&self.lesson, id).await?;
        self.reconcile().await;
        Ok(())
    }

    /// Reporting does not change the thread, so no reconciliation.
    pub async fn report_item(&self, id: &CommentId, reason: Option<&str>) -> Result<(), Error> {
        self.mutations.report(&self.lesson, id, reason).await
    }

    /// Like toggles are device-local; repaint one control, no round trip.
    pub fn toggle_like(&self, id: &CommentId) -> u8 {
        self.local.toggle_like(id)
    }

    pub fn like_count(&self, id: &CommentId) -> u8 {
        self.local.like_count(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Comment, NewComment, CreatedComment},
        identity::Anonymous,
        remote::Credential,
        store::MemoryBackend,
    };
    use async_trait::async_trait;

    struct FailingStore;

    #[async_trait]
    impl CommentStore for FailingStore {
        async fn list(&self, _: &CourseId, _: &LessonId) -> Result<Vec<Comment>, Error> {
            Err(Error::Network(String::from("connection refused")))
        }

        async fn create(
            &self,
            _: &CourseId,
            _: &LessonId,
            _: &NewComment,
            _: &Credential,
        ) -> Result<CreatedComment, Error> {
            Err(Error::Network(String::from("connection refused")))
        }

        async fn edit(
            &self,
            _: &CourseId,
            _: &LessonId,
            _: &CommentId,
            _: &str,
            _: &Credential,
        ) -> Result<(), Error> {
            Err(Error::Network(String::from("connection refused")))
        }

        async fn delete(
            &self,
            _: &CourseId,
            _: &LessonId,
            _: &CommentId,
            _: &Credential,
        ) -> Result<(), Error> {
            Err(Error::Network(String::from("connection refused")))
        }

        async fn report(
            &self,
            _: &CourseId,
            _: &LessonId,
            _: &CommentId,
            _: Option<&str>,
            _: &Credential,
        ) -> Result<(), Error> {
            Err(Error::Network(String::from("connection refused")))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<SectionView>>);

    impl RenderSink for RecordingSink {
        fn render(&self, view: SectionView) {
            self.0.lock().unwrap().push(view);
        }
    }

    #[tokio::test]
    async fn network_failure_lands_in_the_failed_state() {
        let sink = Arc::new(RecordingSink::default());
        let course = CourseId::new("algebra-101");
        let coordinator = RenderCoordinator::new(
            course.clone(),
            LessonId::new("l1"),
            Arc::new(FailingStore),
            Arc::new(Anonymous),
            Arc::new(InteractionStore::new(
                course,
                Box::new(MemoryBackend::default()),
            )),
            sink.clone(),
        );
        assert_eq!(coordinator.state(), SectionState::Idle);
        coordinator.reconcile().await;
        assert_eq!(coordinator.state(), SectionState::LoadFailed);
        let views = sink.0.lock().unwrap().clone();
        assert_eq!(views[0], SectionView::Loading);
        assert!(matches!(views[1], SectionView::Failed(_)));
        // a failed create surfaces the error and does not re-render
        let before = sink.0.lock().unwrap().len();
        assert!(coordinator.post_comment("hi").await.is_err());
        assert_eq!(sink.0.lock().unwrap().len(), before);
    }
}
