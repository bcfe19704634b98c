use std::{collections::VecDeque, future::Future};

use futures::{Stream, StreamExt};

use crate::api::{FeedEvent, LessonId};

/// Runs one section's live-update subscription to completion.
///
/// `payloads` is the raw push channel (transport is a collaborator);
/// `reconcile` is the same entry point user mutations go through, so both
/// paths share a single source of rendering truth. Malformed or foreign
/// envelopes are dropped silently; events scoped to another lesson are
/// ignored; an unscoped event refreshes this section like any other.
/// When the stream ends the subscription is over, and reconciliation
/// still works through manual refresh and mutations.
pub async fn listen<S, F, Fut>(payloads: S, lesson: LessonId, mut reconcile: F)
where
    S: Stream<Item = String>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    futures::pin_mut!(payloads);
    while let Some(payload) = payloads.next().await {
        let event = match FeedEvent::parse(&payload) {
            Some(event) => event,
            None => {
                tracing::debug!(payload, "dropping non-comment push payload");
                continue;
            }
        };
        if event.concerns(&lesson) {
            reconcile().await;
        }
    }
    tracing::info!(%lesson, "push feed closed, live updates stopped for this section");
}

/// Cuts SSE event payloads out of a streaming HTTP response body.
///
/// Transport-level errors end the stream; there is no reconnect at this
/// layer.
pub fn sse_payloads(response: reqwest::Response) -> impl Stream<Item = String> {
    sse_events(response.bytes_stream())
}

/// SSE framing over raw body chunks: `data:` lines accumulate and a blank
/// line dispatches them joined with newlines, matching what an EventSource
/// would hand the page. Comment lines and other fields are skipped. An
/// event cut off by the end of the stream is never dispatched.
fn sse_events<B, C, E>(body: B) -> impl Stream<Item = String>
where
    B: Stream<Item = Result<C, E>>,
    C: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = (Box::pin(body), String::new(), Vec::new(), VecDeque::new());
    futures::stream::unfold(state, |(mut body, mut buf, mut data, mut ready)| async move {
        loop {
            if let Some(payload) = ready.pop_front() {
                return Some((payload, (body, buf, data, ready)));
            }
            match body.next().await {
                None => return None,
                Some(Err(err)) => {
                    tracing::error!(%err, "push stream transport error");
                    return None;
                }
                Some(Ok(chunk)) => {
                    buf.push_str(&String::from_utf8_lossy(chunk.as_ref()));
                    while let Some(pos) = buf.find('\n') {
                        let line = buf[..pos].trim_end_matches('\r').to_string();
                        buf.drain(..=pos);
                        if line.is_empty() {
                            if !data.is_empty() {
                                ready.push_back(data.join("\n"));
                                data.clear();
                            }
                        } else if let Some(value) = line.strip_prefix("data:") {
                            // one leading space after the colon is framing
                            data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicUsize, Ordering},
    };

    async fn count_reconciles(payloads: Vec<&str>, lesson: &str) -> usize {
        let triggered = AtomicUsize::new(0);
        let stream = futures::stream::iter(payloads.into_iter().map(String::from));
        listen(stream, LessonId::new(lesson), || {
            triggered.fetch_add(1, Ordering::SeqCst);
            async {}
        })
        .await;
        triggered.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn matching_and_unscoped_events_trigger_reconciliation() {
        let n = count_reconciles(
            vec![
                r#"{"type":"comment","lessonId":"l1"}"#,
                r#"{"type":"comment"}"#,
            ],
            "l1",
        )
        .await;
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn foreign_lesson_events_are_ignored() {
        let n = count_reconciles(vec![r#"{"type":"comment","lessonId":"l2"}"#], "l1").await;
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn malformed_and_non_comment_payloads_are_dropped() {
        let n = count_reconciles(
            vec!["junk", "", r#"{"type":"presence","lessonId":"l1"}"#],
            "l1",
        )
        .await;
        assert_eq!(n, 0);
    }

    /// Body chunks the way an HTTP client would hand them over.
    async fn framed(chunks: Vec<&'static str>) -> Vec<String> {
        let body = futures::stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok::<_, Infallible>(chunk.as_bytes())),
        );
        sse_events(body).collect().await
    }

    #[tokio::test]
    async fn crlf_lines_and_keepalive_comments_frame_cleanly() {
        let payloads = framed(vec![
            "data: {\"type\":\"comment\"}\r\n\r\n",
            ": keepalive\r\n\r\n",
            "data: second\n\n",
        ])
        .await;
        assert_eq!(payloads, vec!["{\"type\":\"comment\"}", "second"]);
    }

    #[tokio::test]
    async fn lines_split_across_chunks_reassemble() {
        let payloads = framed(vec!["da", "ta: hel", "lo\n", "\n"]).await;
        assert_eq!(payloads, vec!["hello"]);
    }

    #[tokio::test]
    async fn multiple_data_lines_join_into_one_payload() {
        let payloads = framed(vec!["data: line one\ndata: line two\n\n"]).await;
        assert_eq!(payloads, vec!["line one\nline two"]);
    }

    #[tokio::test]
    async fn non_data_fields_are_skipped() {
        let payloads = framed(vec!["event: comment\nid: 7\ndata: x\n\n"]).await;
        assert_eq!(payloads, vec!["x"]);
    }

    #[tokio::test]
    async fn event_cut_off_by_stream_end_is_discarded() {
        // unterminated line, then a terminated data line with no blank
        // line after it; neither forms a complete event
        assert!(framed(vec!["data: partial"]).await.is_empty());
        assert!(framed(vec!["data: complete line\n"]).await.is_empty());
    }
}
