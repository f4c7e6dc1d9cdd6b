//! CLI operations. Each operation pairs an options struct with an
//! `execute()` that drives the client and returns a displayable result.

pub mod comments;
pub mod posts;
pub mod reply;
pub mod submit;
pub mod vote;
