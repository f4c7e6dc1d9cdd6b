use log::{error, info};

use crate::client::{AnonymousClient, ClientError};
use crate::models::Comment;

/// Configuration options for fetching a comment tree
#[derive(Debug, Clone)]
pub struct CommentsOptions {
    /// Short id or `t3_`-prefixed full id of the submission
    pub link_id: String,
}

/// Result of a comment tree fetch
#[derive(Debug)]
pub struct CommentsResult {
    /// Total comments in the tree, replies included
    pub comment_count: usize,
    /// Formatted output for CLI display
    pub formatted_output: String,
    /// The top-level comments with their nested replies
    pub comments: Vec<Comment>,
}

/// Operation for fetching and rendering the comment tree of a submission
pub struct CommentsOperation {
    options: CommentsOptions,
    client: AnonymousClient,
}

impl CommentsOperation {
    pub fn new(options: CommentsOptions, client: AnonymousClient) -> Self {
        Self { options, client }
    }

    pub async fn execute(&self) -> Result<CommentsResult, ClientError> {
        info!("fetching comments for {}", self.options.link_id);

        let comments = self.client.comments(&self.options.link_id).await?;

        let mut output = String::new();
        if comments.is_empty() {
            output.push_str("No comments found.\n");
        } else {
            output.push_str(&format!(
                "Found {} comments ({} top-level)\n",
                count_tree(&comments),
                comments.len()
            ));
            for comment in &comments {
                render_comment(comment, 0, &mut output);
            }
        }

        Ok(CommentsResult {
            comment_count: count_tree(&comments),
            formatted_output: output,
            comments,
        })
    }
}

fn count_tree(comments: &[Comment]) -> usize {
    comments.iter().map(|c| 1 + count_tree(&c.replies)).sum()
}

fn render_comment(comment: &Comment, depth: usize, output: &mut String) {
    let indent = "  ".repeat(depth);
    output.push_str(&format!(
        "{}[{}] u/{} ({} pts): {}\n",
        indent,
        comment.name,
        comment.author,
        comment.score,
        first_line(&comment.body)
    ));
    for reply in &comment.replies {
        render_comment(reply, depth + 1, output);
    }
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or_default()
}

/// CLI handler function for the comments command
pub async fn handle_comments_command(
    options: CommentsOptions,
    client: AnonymousClient,
) -> Result<(), ClientError> {
    let operation = CommentsOperation::new(options, client);
    match operation.execute().await {
        Ok(result) => {
            print!("{}", result.formatted_output);
            Ok(())
        }
        Err(err) => {
            error!("error fetching comments: {}", err);
            Err(err)
        }
    }
}
