mod capability;
pub use capability::resolve;

mod feed;
pub use feed::{listen, sse_payloads};

mod http;
pub use crate::http::HttpCommentStore;

mod identity;
pub use identity::{Anonymous, BearerIdentity, IdentityProvider};

mod mutate;
pub use mutate::MutationController;

mod remote;
pub use remote::{CommentStore, Credential};

mod render;
pub use render::{RenderCoordinator, RenderSink, SectionState, SectionView};

mod store;
pub use store::{InteractionStore, MemoryBackend, StorageBackend};

mod thread;
pub use thread::{build, RenderNode, ReplyNode};

pub mod api {
    pub use lessonthread_api::*;
}
