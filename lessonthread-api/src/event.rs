use crate::LessonId;

/// JSON envelope carried by the course-scoped push channel.
///
/// Anything that is not a well-formed comment-mutation envelope is dropped
/// by `parse` returning `None`; the listener never errors on junk input.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedEvent {
    #[serde(rename = "type")]
    pub kind: String,

    /// Absent = refresh every section of the course
    #[serde(rename = "lessonId", default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<LessonId>,
}

impl FeedEvent {
    pub const COMMENT: &'static str = "comment";

    pub fn comment(lesson_id: Option<LessonId>) -> FeedEvent {
        FeedEvent {
            kind: String::from(Self::COMMENT),
            lesson_id,
        }
    }

    pub fn parse(payload: &str) -> Option<FeedEvent> {
        serde_json::from_str::<FeedEvent>(payload)
            .ok()
            .filter(|event| event.kind == Self::COMMENT)
    }

    /// Whether a section bound to `lesson` must reconcile for this event.
    pub fn concerns(&self, lesson: &LessonId) -> bool {
        match &self.lesson_id {
            Some(scope) => scope == lesson,
            None => true,
        }
    }
}
