use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

pub mod comment;
pub mod listing;

pub use comment::{build_comment_tree, Comment};
pub use listing::{parse_listing, Listing, Thing, TrophyList};

/// Something that can be voted on.
pub trait Votable {
    /// The full id the vote endpoint expects.
    fn vote_id(&self) -> &str;
}

/// Something that can be deleted.
pub trait Deletable {
    /// The full id the delete endpoint expects.
    fn delete_id(&self) -> &str;
}

/// Something that can be replied to.
pub trait Replyable {
    /// The full id the comment endpoint expects as parent.
    fn reply_id(&self) -> &str;
}

/// A bare full id, for callers that hold an id but not the decoded entity
/// it came from. The smallest thing the capability traits can be
/// implemented for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingId(pub String);

impl ThingId {
    pub fn new(fullname: &str) -> Self {
        Self(fullname.to_string())
    }
}

impl Votable for ThingId {
    fn vote_id(&self) -> &str {
        &self.0
    }
}

impl Deletable for ThingId {
    fn delete_id(&self) -> &str {
        &self.0
    }
}

impl Replyable for ThingId {
    fn reply_id(&self) -> &str {
        &self.0
    }
}

/// The three possible states of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
    Remove,
}

impl Vote {
    /// The `dir` form value the vote endpoint expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Vote::Up => "1",
            Vote::Down => "-1",
            Vote::Remove => "0",
        }
    }
}

/// Ways to sort submissions by popularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopularitySort {
    #[default]
    Default,
    Hot,
    New,
    Rising,
    Top,
    Controversial,
}

impl PopularitySort {
    pub fn as_str(self) -> &'static str {
        match self {
            PopularitySort::Default => "",
            PopularitySort::Hot => "hot",
            PopularitySort::New => "new",
            PopularitySort::Rising => "rising",
            PopularitySort::Top => "top",
            PopularitySort::Controversial => "controversial",
        }
    }
}

/// Time windows for age-filtered sorts (top/controversial).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    Default,
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::Default => "",
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

/// Pagination and filtering options accepted by listing endpoints.
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    pub time: Option<TimeFilter>,
    pub limit: Option<u32>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub count: Option<u32>,
    pub show: Option<String>,
}

impl ListingOptions {
    /// Serializes the set options as query pairs, skipping unset ones.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(time) = self.time {
            if time != TimeFilter::Default {
                pairs.push(("t", time.as_str().to_string()));
            }
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        if let Some(before) = &self.before {
            pairs.push(("before", before.clone()));
        }
        if let Some(count) = self.count {
            pairs.push(("count", count.to_string()));
        }
        if let Some(show) = &self.show {
            pairs.push(("show", show.clone()));
        }
        pairs
    }
}

/// The data needed to submit a new post.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub subreddit: String,
    pub title: String,
    /// The destination URL for a link post, the body text for a self post.
    pub content: String,
    pub self_post: bool,
    pub send_replies: bool,
    pub resubmit: bool,
}

impl NewSubmission {
    /// A link submission with the usual defaults.
    pub fn link(subreddit: &str, title: &str, url: &str) -> Self {
        Self {
            subreddit: subreddit.to_string(),
            title: title.to_string(),
            content: url.to_string(),
            self_post: false,
            send_replies: true,
            resubmit: true,
        }
    }

    /// A self (text) submission with the usual defaults.
    pub fn text(subreddit: &str, title: &str, text: &str) -> Self {
        Self {
            subreddit: subreddit.to_string(),
            title: title.to_string(),
            content: text.to_string(),
            self_post: true,
            send_replies: true,
            resubmit: true,
        }
    }

    /// The `kind` form value the submit endpoint expects.
    pub fn kind(&self) -> &'static str {
        if self.self_post {
            "self"
        } else {
            "link"
        }
    }
}

/// An individual post, link or self.
///
/// Field names follow the wire format. The service omits fields depending
/// on viewer permissions; absent fields decode to their defaults.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Submission {
    pub author: String,
    pub title: String,
    pub url: String,
    pub domain: String,
    pub subreddit: String,
    /// Full id of the subreddit this was posted in (`t5_` prefixed).
    pub subreddit_id: String,
    /// The submission's full id: `t3_` followed by `id`.
    pub name: String,
    /// The short id in base-36 form, as used in the site's links.
    pub id: String,
    pub permalink: String,
    pub selftext: String,
    pub selftext_html: Option<String>,
    pub thumbnail: String,
    pub created_utc: f64,
    pub num_comments: i64,
    /// Overall points score. Ups and downs are fuzzed by the service to
    /// trick spammers, so they may not add up.
    pub score: i64,
    pub ups: i64,
    pub downs: i64,
    pub over_18: bool,
    pub is_self: bool,
    pub clicked: bool,
    pub saved: bool,
    pub banned_by: Option<String>,
    pub link_flair_text: Option<String>,
}

impl Submission {
    /// Returns the full URL of the submission.
    pub fn full_permalink(&self) -> String {
        format!("https://reddit.com{}", self.permalink)
    }

    /// Creation time rendered as a UTC string.
    pub fn format_timestamp(&self) -> String {
        use chrono::{DateTime, Utc};

        DateTime::from_timestamp(self.created_utc as i64, 0)
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%d %H:%M:%S UTC")
            .to_string()
    }

    /// One-line summary for list output.
    pub fn format_short_summary(&self) -> String {
        format!(
            "[r/{} | {} pts] {} - by u/{}",
            self.subreddit, self.score, self.title, self.author
        )
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let plural = if self.num_comments == 1 { "" } else { "s" };
        write!(
            f,
            "{} - {} ({} comment{})",
            self.score, self.title, self.num_comments, plural
        )
    }
}

impl Votable for Submission {
    fn vote_id(&self) -> &str {
        &self.name
    }
}

impl Deletable for Submission {
    fn delete_id(&self) -> &str {
        &self.name
    }
}

impl Replyable for Submission {
    fn reply_id(&self) -> &str {
        &self.name
    }
}

/// A user account.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Redditor {
    pub id: String,
    pub name: String,
    pub link_karma: i64,
    pub comment_karma: i64,
    pub created_utc: f64,
    pub is_gold: bool,
    pub is_mod: bool,
    pub has_mail: Option<bool>,
    pub has_mod_mail: Option<bool>,
}

impl fmt::Display for Redditor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}-{})", self.name, self.link_karma, self.comment_karma)
    }
}

/// A subreddit.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Subreddit {
    pub display_name: String,
    pub title: String,
    pub description: String,
    pub public_description: String,
    pub url: String,
    /// The subreddit's full id (`t5_` prefixed).
    pub name: String,
    pub id: String,
    pub header_img: Option<String>,
    pub created_utc: f64,
    pub subscribers: i64,
    pub over18: bool,
}

impl fmt::Display for Subreddit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let subs = match self.subscribers {
            1 => "1 subscriber".to_string(),
            n => format!("{} subscribers", n),
        };
        write!(f, "{} ({})", self.title, subs)
    }
}

/// Per-subreddit karma breakdown of the logged-in user.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Karma {
    pub sr: String,
    pub comment_karma: i64,
    pub link_karma: i64,
}

/// An entry of the logged-in user's friends list.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Friend {
    pub id: String,
    pub name: String,
    pub date: f64,
}

/// A trophy on a user's trophy case.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Trophy {
    pub name: String,
    pub description: Option<String>,
    pub icon_70: String,
    pub icon_40: String,
    pub award_id: Option<String>,
    pub url: Option<String>,
}

/// Account preferences. Only the commonly read settings are typed; the
/// rest of the (large, shifting) preference set rides in `other`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Preferences {
    pub lang: String,
    pub over_18: bool,
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_form_values() {
        assert_eq!(Vote::Up.as_str(), "1");
        assert_eq!(Vote::Down.as_str(), "-1");
        assert_eq!(Vote::Remove.as_str(), "0");
    }

    #[test]
    fn submission_capability_accessors_return_full_id() {
        let submission = Submission {
            name: "t3_xyz".to_string(),
            id: "xyz".to_string(),
            ..Submission::default()
        };
        assert_eq!(submission.vote_id(), "t3_xyz");
        assert_eq!(submission.delete_id(), "t3_xyz");
        assert_eq!(submission.reply_id(), "t3_xyz");
    }

    #[test]
    fn new_submission_constructors_pick_the_kind() {
        let link = NewSubmission::link("rust", "a link", "https://example.com");
        assert_eq!(link.kind(), "link");
        assert!(link.send_replies);

        let text = NewSubmission::text("rust", "a text post", "body");
        assert_eq!(text.kind(), "self");
        assert_eq!(text.content, "body");
    }

    #[test]
    fn listing_options_skip_unset_fields() {
        let options = ListingOptions {
            limit: Some(25),
            after: Some("t3_abc".to_string()),
            ..ListingOptions::default()
        };
        let pairs = options.query_pairs();
        assert_eq!(
            pairs,
            vec![("limit", "25".to_string()), ("after", "t3_abc".to_string())]
        );
        assert!(ListingOptions::default().query_pairs().is_empty());
    }

    #[test]
    fn sparse_redditor_decodes_with_defaults() {
        let r: Redditor =
            serde_json::from_value(serde_json::json!({"name": "spez"})).unwrap();
        assert_eq!(r.name, "spez");
        assert_eq!(r.link_karma, 0);
        assert_eq!(r.has_mail, None);
    }
}
