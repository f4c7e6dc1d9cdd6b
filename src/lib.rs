//! An abstraction over the reddit.com API.
//!
//! Browse submissions and comment trees anonymously, or authenticate —
//! with a session cookie ([`LoginClient`]) or an OAuth2 bearer token
//! ([`OauthClient`]) — and vote, reply, submit, delete and save. Votes,
//! replies and deletes work uniformly over anything that exposes a full
//! id through the [`models::Votable`], [`models::Deletable`] and
//! [`models::Replyable`] capability traits.

pub mod client;
pub mod config;
pub mod models;
pub mod operations;

pub use client::{AnonymousClient, ClientError, LoginClient, OauthClient};
pub use models::{
    build_comment_tree, Comment, Deletable, ListingOptions, NewSubmission, PopularitySort,
    Redditor, Replyable, Submission, Subreddit, ThingId, TimeFilter, Votable, Vote,
};
