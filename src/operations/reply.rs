use log::{error, info};

use crate::client::ClientError;
use crate::config::AppConfig;
use crate::models::ThingId;

/// Configuration options for replying to a thing
#[derive(Debug, Clone)]
pub struct ReplyOptions {
    /// Full id of the parent: `t3_`-prefixed for posts, `t1_`-prefixed
    /// for comments
    pub thing_id: String,
    /// Text content of the reply
    pub text: String,
}

/// Operation for posting a comment through an OAuth session
pub struct ReplyOperation {
    options: ReplyOptions,
    config: AppConfig,
}

impl ReplyOperation {
    pub fn new(options: ReplyOptions, config: AppConfig) -> Self {
        Self { options, config }
    }

    pub async fn execute(&self) -> Result<(), ClientError> {
        info!("replying to {}", self.options.thing_id);

        let client = self.config.authenticated_oauth_client().await?;
        let parent = ThingId::new(&self.options.thing_id);
        client.reply(&parent, &self.options.text).await
    }
}

/// CLI handler function for the reply command
pub async fn handle_reply_command(
    options: ReplyOptions,
    config: AppConfig,
) -> Result<(), ClientError> {
    let operation = ReplyOperation::new(options, config);
    match operation.execute().await {
        Ok(()) => {
            println!("Comment posted.");
            Ok(())
        }
        Err(err) => {
            error!("error posting comment: {}", err);
            Err(err)
        }
    }
}
