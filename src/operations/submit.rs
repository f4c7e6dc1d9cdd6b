use log::{error, info};

use crate::client::ClientError;
use crate::config::AppConfig;
use crate::models::NewSubmission;

/// Configuration options for submitting a post
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// The name of the subreddit to post to
    pub subreddit: String,
    /// Title of the post
    pub title: String,
    /// Destination URL for a link post, body text for a self post
    pub content: String,
    /// Submit as a link post instead of a self post
    pub link: bool,
}

/// Result of a submit operation
#[derive(Debug)]
pub struct SubmitResult {
    /// Permalink of the created submission, when the service returned one
    pub permalink: Option<String>,
    /// Formatted message for CLI output
    pub message: String,
}

/// Operation for submitting a new post through an OAuth session
pub struct SubmitOperation {
    options: SubmitOptions,
    config: AppConfig,
}

impl SubmitOperation {
    pub fn new(options: SubmitOptions, config: AppConfig) -> Self {
        Self { options, config }
    }

    pub async fn execute(&self) -> Result<SubmitResult, ClientError> {
        // The subreddit may arrive with or without the r/ prefix.
        let subreddit = self
            .options
            .subreddit
            .strip_prefix("r/")
            .unwrap_or(&self.options.subreddit);
        info!("submitting '{}' to r/{}", self.options.title, subreddit);

        let client = self.config.authenticated_oauth_client().await?;

        let submission = if self.options.link {
            NewSubmission::link(subreddit, &self.options.title, &self.options.content)
        } else {
            NewSubmission::text(subreddit, &self.options.title, &self.options.content)
        };

        let created = client.submit(&submission).await?;
        let permalink = if created.permalink.is_empty() {
            None
        } else {
            Some(created.full_permalink())
        };
        let message = match &permalink {
            Some(url) => format!("Post created successfully! URL: {}", url),
            None => "Post created successfully.".to_string(),
        };

        Ok(SubmitResult { permalink, message })
    }
}

/// CLI handler function for the submit command
pub async fn handle_submit_command(
    options: SubmitOptions,
    config: AppConfig,
) -> Result<(), ClientError> {
    let operation = SubmitOperation::new(options, config);
    match operation.execute().await {
        Ok(result) => {
            println!("{}", result.message);
            Ok(())
        }
        Err(err) => {
            error!("error creating post: {}", err);
            Err(err)
        }
    }
}
