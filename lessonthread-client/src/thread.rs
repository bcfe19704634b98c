use crate::api::{CapabilitySet, Comment, Reply};

/// One renderable top-level comment with its flattened replies.
///
/// Rebuilt from scratch on every reconciliation and never mutated in
/// place; `build` fills capabilities with the anonymous baseline and the
/// render coordinator overwrites them per caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderNode {
    pub comment: Comment,
    pub caps: CapabilitySet,
    pub replies: Vec<ReplyNode>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyNode {
    pub reply: Reply,
    pub caps: CapabilitySet,
    /// "who replied to whom" display string
    pub chain_label: String,
}

/// Converts the server's flat comment list into render trees.
///
/// Pure and deterministic: server order is preserved at both levels, and
/// duplicate ids render twice (a duplicate is a server contract violation,
/// not something to paper over here).
pub fn build(comments: &[Comment]) -> Vec<RenderNode> {
    comments
        .iter()
        .map(|comment| RenderNode {
            replies: comment
                .replies
                .iter()
                .map(|reply| ReplyNode {
                    chain_label: chain_label(reply, &comment.author),
                    caps: CapabilitySet::report_only(),
                    reply: reply.clone(),
                })
                .collect(),
            caps: CapabilitySet::report_only(),
            comment: comment.clone(),
        })
        .collect()
}

fn chain_label(reply: &Reply, parent_author: &str) -> String {
    let target = reply
        .reply_to_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .or_else(|| (!parent_author.is_empty()).then_some(parent_author));
    match target {
        Some(target) => format!("{} > {}", reply.author, target),
        None => reply.author.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CommentId;

    fn comment(id: &str, author: &str, replies: Vec<Reply>) -> Comment {
        Comment {
            id: CommentId::new(id),
            author: String::from(author),
            role: None,
            author_email: None,
            author_id: None,
            text: String::from("text"),
            created_at: None,
            replies,
        }
    }

    fn reply(id: &str, author: &str, reply_to_name: Option<&str>) -> Reply {
        Reply {
            id: CommentId::new(id),
            author: String::from(author),
            author_email: None,
            author_id: None,
            text: String::from("text"),
            created_at: None,
            reply_to_id: None,
            reply_to_name: reply_to_name.map(String::from),
        }
    }

    #[test]
    fn preserves_server_ordering_at_both_levels() {
        let comments = vec![
            comment(
                "c2",
                "Bob",
                vec![reply("r2", "Carol", None), reply("r1", "Dave", None)],
            ),
            comment("c1", "Alice", vec![]),
        ];
        let nodes = build(&comments);
        let top: Vec<&str> = nodes.iter().map(|n| n.comment.id.as_str()).collect();
        assert_eq!(top, vec!["c2", "c1"]);
        let replies: Vec<&str> = nodes[0]
            .replies
            .iter()
            .map(|r| r.reply.id.as_str())
            .collect();
        assert_eq!(replies, vec!["r2", "r1"]);
    }

    #[test]
    fn chain_label_prefers_the_explicit_target() {
        let comments = vec![comment(
            "c1",
            "Alice",
            vec![reply("r1", "Carol", Some("Bob"))],
        )];
        let nodes = build(&comments);
        assert_eq!(nodes[0].replies[0].chain_label, "Carol > Bob");
    }

    #[test]
    fn chain_label_falls_back_to_the_parent_author() {
        let comments = vec![comment("c1", "Alice", vec![reply("r1", "Bob", None)])];
        let nodes = build(&comments);
        assert_eq!(nodes[0].replies[0].chain_label, "Bob > Alice");
    }

    #[test]
    fn chain_label_is_plain_when_nothing_resolves() {
        let comments = vec![comment("c1", "", vec![reply("r1", "Bob", None)])];
        let nodes = build(&comments);
        assert_eq!(nodes[0].replies[0].chain_label, "Bob");

        // empty target string behaves like an absent one
        let comments = vec![comment("c1", "", vec![reply("r1", "Bob", Some(""))])];
        let nodes = build(&comments);
        assert_eq!(nodes[0].replies[0].chain_label, "Bob");
    }

    #[test]
    fn duplicates_render_twice() {
        let comments = vec![
            comment("c1", "Alice", vec![]),
            comment("c1", "Alice", vec![]),
        ];
        assert_eq!(build(&comments).len(), 2);
    }

    #[test]
    fn empty_payload_builds_an_empty_tree() {
        assert!(build(&[]).is_empty());
    }
}
