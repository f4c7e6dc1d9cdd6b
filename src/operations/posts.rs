use log::{error, info};

use crate::client::{AnonymousClient, ClientError};
use crate::models::{ListingOptions, PopularitySort, Submission};

/// Configuration options for fetching posts
#[derive(Debug, Clone)]
pub struct PostsOptions {
    /// The number of posts to retrieve
    pub count: u32,
    /// The name of the subreddit to fetch posts from (None for the frontpage)
    pub subreddit: Option<String>,
    /// The sort order to fetch under
    pub sort: PopularitySort,
    /// Display posts in a brief, one-line format
    pub brief: bool,
}

impl Default for PostsOptions {
    fn default() -> Self {
        Self {
            count: 10,
            subreddit: None,
            sort: PopularitySort::New,
            brief: false,
        }
    }
}

/// Result of a posts fetch operation
#[derive(Debug)]
pub struct PostsResult {
    /// The number of posts found
    pub post_count: usize,
    /// Formatted output for CLI display
    pub formatted_output: String,
    /// The decoded submissions
    pub submissions: Vec<Submission>,
}

/// Operation for fetching posts
pub struct PostsOperation {
    options: PostsOptions,
    client: AnonymousClient,
}

impl PostsOperation {
    pub fn new(options: PostsOptions, client: AnonymousClient) -> Self {
        Self { options, client }
    }

    pub async fn execute(&self) -> Result<PostsResult, ClientError> {
        info!(
            "fetching {} posts from {}",
            self.options.count,
            self.options.subreddit.as_deref().unwrap_or("the frontpage")
        );

        let listing_options = ListingOptions {
            limit: Some(self.options.count),
            ..ListingOptions::default()
        };
        let submissions = self
            .client
            .sorted_submissions(
                self.options.subreddit.as_deref(),
                self.options.sort,
                &listing_options,
            )
            .await?;

        let mut output = String::new();
        if submissions.is_empty() {
            output.push_str("No posts found.\n");
        } else {
            output.push_str(&format!("Found {} posts\n", submissions.len()));
            if self.options.brief {
                for (i, submission) in submissions.iter().enumerate() {
                    output.push_str(&format!(
                        "{:2}. {} | {}\n",
                        i + 1,
                        submission.format_short_summary(),
                        submission.name
                    ));
                }
            } else {
                for submission in &submissions {
                    self.format_detailed(submission, &mut output);
                }
            }
        }

        Ok(PostsResult {
            post_count: submissions.len(),
            formatted_output: output,
            submissions,
        })
    }

    fn format_detailed(&self, submission: &Submission, output: &mut String) {
        output.push_str("\n============ POST =============\n");
        output.push_str(&format!("[{}]\n", submission.format_timestamp()));
        output.push_str(&format!(
            "Full ID: {} (use this for voting and replying)\n",
            submission.name
        ));
        output.push_str(&format!("{}\n", submission));
        output.push_str(&format!("Author: u/{}\n", submission.author));
        if submission.is_self {
            if !submission.selftext.is_empty() {
                let text = if submission.selftext.chars().count() > 500 {
                    let excerpt: String = submission.selftext.chars().take(497).collect();
                    format!("{}...", excerpt)
                } else {
                    submission.selftext.clone()
                };
                output.push_str(&format!("Content:\n{}\n", text));
            }
        } else {
            output.push_str(&format!("URL: {}\n", submission.url));
        }
        output.push_str(&format!("Permalink: {}\n", submission.full_permalink()));
        output.push_str("================================\n");
    }
}

/// CLI handler function for the posts command
pub async fn handle_posts_command(
    options: PostsOptions,
    client: AnonymousClient,
) -> Result<(), ClientError> {
    let operation = PostsOperation::new(options, client);
    match operation.execute().await {
        Ok(result) => {
            print!("{}", result.formatted_output);
            Ok(())
        }
        Err(err) => {
            error!("error fetching posts: {}", err);
            Err(err)
        }
    }
}
