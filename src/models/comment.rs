use std::fmt;

use serde_json::{Map, Value};

use super::{Deletable, Replyable, Votable};

/// Hard cap on tree recursion. Comment pages come off the network, so the
/// nesting depth is not under our control; branches deeper than this are
/// dropped instead of overflowing the stack. Organic threads stay far below
/// this.
const MAX_TREE_DEPTH: usize = 128;

/// A single comment together with its ordered reply subtree.
///
/// Comments are not decoded through serde: the comments endpoint returns a
/// mix of listing envelopes, comment records and "more" stubs whose shape
/// varies with viewer permissions, so each field is pulled out of the raw
/// JSON individually and degrades to its default when absent or mistyped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub body_html: String,
    pub subreddit: String,
    pub subreddit_id: String,
    /// Full id of the submission this comment belongs to (`t3_` prefixed).
    pub link_id: String,
    /// Full id of the direct parent: the submission for top-level comments,
    /// another comment (`t1_` prefixed) otherwise.
    pub parent_id: String,
    /// The comment's own full id (`t1_` followed by the short id).
    pub name: String,
    pub permalink: String,
    pub score: i64,
    pub ups: i64,
    pub downs: i64,
    pub created_utc: f64,
    pub edited: bool,
    pub banned_by: Option<String>,
    pub approved_by: Option<String>,
    pub author_flair_text: Option<String>,
    pub author_flair_css_class: Option<String>,
    pub num_reports: Option<i64>,
    /// The logged-in viewer's own vote: upvoted, downvoted, or no vote.
    pub likes: Option<bool>,
    /// Direct replies, in the order the API returned them.
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Returns the full URL of the comment.
    pub fn full_permalink(&self) -> String {
        format!("https://reddit.com{}", self.permalink)
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}/{}): {}", self.author, self.ups, self.downs, self.body)
    }
}

impl Votable for Comment {
    fn vote_id(&self) -> &str {
        &self.name
    }
}

impl Deletable for Comment {
    fn delete_id(&self) -> &str {
        &self.name
    }
}

impl Replyable for Comment {
    fn reply_id(&self) -> &str {
        &self.name
    }
}

/// Reconstructs the comment forest contained anywhere inside `value`.
///
/// The comments endpoint has no single response shape: a thread page is a
/// two-element array (submission listing, then comment listing), a user
/// comment feed is one listing object, and "more children" payloads are
/// nested maps. The walk handles all of them with the same rule set:
///
/// - arrays recurse into every element in order,
/// - objects without a `body` field are structural wrappers and recurse
///   into every value,
/// - objects with a `body` field become exactly one [`Comment`], whose
///   `replies` value is walked recursively for its children,
/// - scalars and nulls contribute nothing.
///
/// The returned vec holds the top-level comments, each carrying its nested
/// replies. Sibling order is the order the API returned.
pub fn build_comment_tree(value: &Value) -> Vec<Comment> {
    let mut comments = Vec::new();
    collect_comments(value, 0, &mut comments);
    comments
}

fn collect_comments(value: &Value, depth: usize, out: &mut Vec<Comment>) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_comments(item, depth + 1, out);
            }
        }
        Value::Object(map) => {
            // A null body marks a wrapper too: deleted-comment stubs carry
            // "body": null and must not materialize as comments.
            match map.get("body") {
                Some(body) if !body.is_null() => out.push(comment_from_map(map, depth)),
                _ => {
                    for child in map.values() {
                        collect_comments(child, depth + 1, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Fills as many fields of a [`Comment`] as the record provides. Absent or
/// mistyped fields keep their defaults; the service omits fields based on
/// viewer permissions and a missing optional must never fail the decode.
fn comment_from_map(map: &Map<String, Value>, depth: usize) -> Comment {
    let mut comment = Comment {
        author: string_field(map, "author"),
        body: string_field(map, "body"),
        body_html: string_field(map, "body_html"),
        subreddit: string_field(map, "subreddit"),
        subreddit_id: string_field(map, "subreddit_id"),
        link_id: string_field(map, "link_id"),
        parent_id: string_field(map, "parent_id"),
        name: string_field(map, "name"),
        permalink: string_field(map, "permalink"),
        score: count_field(map, "score"),
        ups: count_field(map, "ups"),
        downs: count_field(map, "downs"),
        created_utc: time_field(map, "created_utc"),
        edited: flag_field(map, "edited"),
        banned_by: opt_string_field(map, "banned_by"),
        approved_by: opt_string_field(map, "approved_by"),
        author_flair_text: opt_string_field(map, "author_flair_text"),
        author_flair_css_class: opt_string_field(map, "author_flair_css_class"),
        num_reports: opt_count_field(map, "num_reports"),
        likes: opt_flag_field(map, "likes"),
        replies: Vec::new(),
    };

    // The replies value is a nested listing when children exist and an
    // empty-string sentinel when none do; anything non-recursable simply
    // yields no children.
    if let Some(replies) = map.get("replies") {
        collect_comments(replies, depth + 1, &mut comment.replies);
    }

    comment
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

// Vote counters arrive as integers on some endpoints and floats on others.
fn count_field(map: &Map<String, Value>, key: &str) -> i64 {
    match map.get(key) {
        Some(v) => v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)).unwrap_or(0),
        None => 0,
    }
}

fn opt_count_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    map.get(key).and_then(Value::as_i64)
}

fn time_field(map: &Map<String, Value>, key: &str) -> f64 {
    map.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn flag_field(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn opt_flag_field(map: &Map<String, Value>, key: &str) -> Option<bool> {
    map.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment_node(name: &str, body: &str, replies: Value) -> Value {
        json!({
            "author": "someone",
            "body": body,
            "body_html": format!("&lt;p&gt;{}&lt;/p&gt;", body),
            "name": name,
            "link_id": "t3_post",
            "parent_id": "t3_post",
            "subreddit": "rust",
            "subreddit_id": "t5_2s5oq",
            "permalink": format!("/r/rust/comments/post/_/{}", name),
            "score": 4,
            "ups": 5,
            "downs": 1,
            "created_utc": 1325376000.0,
            "edited": false,
            "replies": replies,
        })
    }

    fn listing_of(children: Vec<Value>) -> Value {
        json!({
            "kind": "Listing",
            "data": {
                "after": null,
                "children": children.into_iter()
                    .map(|data| json!({"kind": "t1", "data": data}))
                    .collect::<Vec<_>>(),
            }
        })
    }

    fn count_tree(comments: &[Comment]) -> usize {
        comments
            .iter()
            .map(|c| 1 + count_tree(&c.replies))
            .sum()
    }

    // Brute-force scan: every object with a non-null body is a comment
    // record, no matter where it sits.
    fn count_body_objects(value: &Value) -> usize {
        match value {
            Value::Array(items) => items.iter().map(count_body_objects).sum(),
            Value::Object(map) => {
                if map.get("body").map_or(false, |b| !b.is_null()) {
                    1
                } else {
                    map.values().map(count_body_objects).sum()
                }
            }
            _ => 0,
        }
    }

    #[test]
    fn listing_wrapper_is_not_a_comment() {
        let page = listing_of(vec![comment_node("t1_a", "hello", json!(""))]);
        let tree = build_comment_tree(&page);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "t1_a");
        assert_eq!(tree[0].body, "hello");
    }

    #[test]
    fn body_object_yields_exactly_one_comment() {
        let node = comment_node("t1_a", "just me", json!(""));
        let tree = build_comment_tree(&node);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn null_body_is_a_wrapper() {
        let node = json!({
            "body": null,
            "inner": comment_node("t1_b", "nested", json!("")),
        });
        let tree = build_comment_tree(&node);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "t1_b");
    }

    #[test]
    fn replies_become_ordered_children() {
        let first = comment_node("t1_c1", "first", json!(""));
        let second = comment_node("t1_c2", "second", json!(""));
        let parent = comment_node("t1_p", "parent", listing_of(vec![first, second]));

        let tree = build_comment_tree(&parent);
        assert_eq!(tree.len(), 1);
        let replies: Vec<&str> = tree[0].replies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(replies, vec!["t1_c1", "t1_c2"]);
    }

    #[test]
    fn empty_string_replies_sentinel_means_no_children() {
        let node = json!({"body": "hi", "name": "t1_abc", "replies": ""});
        let tree = build_comment_tree(&node);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "t1_abc");
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn mistyped_replies_value_means_no_children() {
        let node = json!({"body": "hi", "name": "t1_abc", "replies": 42});
        let tree = build_comment_tree(&node);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].replies.is_empty());
    }

    #[test]
    fn missing_and_mistyped_optionals_degrade_to_defaults() {
        // No likes, no flair, score is a string: still one valid comment.
        let node = json!({
            "body": "degraded",
            "name": "t1_x",
            "author": "someone",
            "score": "not a number",
            "ups": 3.0,
        });
        let tree = build_comment_tree(&node);
        assert_eq!(tree.len(), 1);
        let c = &tree[0];
        assert_eq!(c.likes, None);
        assert_eq!(c.author_flair_text, None);
        assert_eq!(c.num_reports, None);
        assert_eq!(c.score, 0);
        assert_eq!(c.ups, 3);
        assert_eq!(c.created_utc, 0.0);
        assert!(!c.edited);
    }

    #[test]
    fn thread_page_array_shape() {
        // A thread page: submission listing first, comment listing second.
        // Submissions carry selftext, not body, so only comments come back.
        let submission = json!({
            "kind": "t3",
            "data": {"title": "a post", "selftext": "text", "name": "t3_post"},
        });
        let post_listing = json!({"kind": "Listing", "data": {"children": [submission]}});
        let nested = comment_node("t1_b", "reply", json!(""));
        let top = comment_node("t1_a", "top level", listing_of(vec![nested]));
        let page = json!([post_listing, listing_of(vec![top])]);

        let tree = build_comment_tree(&page);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "t1_a");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].name, "t1_b");
    }

    #[test]
    fn more_children_stub_recurses_without_emitting() {
        // "more" stubs have no body; their children are bare id strings,
        // which terminate the walk.
        let more = json!({
            "kind": "more",
            "data": {"count": 3, "children": ["abc", "def", "ghi"]},
        });
        let page = listing_of(vec![comment_node("t1_a", "real", json!(""))]);
        let mixed = json!([page, more]);

        let tree = build_comment_tree(&mixed);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "t1_a");
    }

    #[test]
    fn preorder_count_matches_brute_force_scan() {
        let deep = comment_node(
            "t1_d",
            "deep",
            listing_of(vec![comment_node("t1_e", "deeper", json!(""))]),
        );
        let top_a = comment_node("t1_a", "a", listing_of(vec![deep]));
        let top_b = comment_node("t1_b", "b", json!(""));
        let more = json!({"kind": "more", "data": {"children": ["zzz"]}});
        let page = json!([listing_of(vec![top_a, top_b]), more]);

        let tree = build_comment_tree(&page);
        assert_eq!(count_tree(&tree), count_body_objects(&page));
        assert_eq!(count_tree(&tree), 4);
    }

    #[test]
    fn scalars_contribute_nothing() {
        assert!(build_comment_tree(&json!("just a string")).is_empty());
        assert!(build_comment_tree(&json!(17)).is_empty());
        assert!(build_comment_tree(&json!(null)).is_empty());
        assert!(build_comment_tree(&json!(true)).is_empty());
    }

    #[test]
    fn pathological_depth_is_dropped_not_overflowed() {
        let mut value = comment_node("t1_deep", "buried", json!(""));
        for _ in 0..(MAX_TREE_DEPTH * 2) {
            value = json!([value]);
        }
        assert!(build_comment_tree(&value).is_empty());

        let mut shallow = comment_node("t1_ok", "reachable", json!(""));
        for _ in 0..8 {
            shallow = json!([shallow]);
        }
        assert_eq!(build_comment_tree(&shallow).len(), 1);
    }

    #[test]
    fn capability_accessors_return_full_id() {
        let tree = build_comment_tree(&comment_node("t1_abc", "hi", json!("")));
        let c = &tree[0];
        assert_eq!(c.vote_id(), "t1_abc");
        assert_eq!(c.delete_id(), "t1_abc");
        assert_eq!(c.reply_id(), "t1_abc");
    }
}
