use log::{error, info};

use crate::client::ClientError;
use crate::config::AppConfig;
use crate::models::{ThingId, Vote};

/// Configuration options for casting a vote
#[derive(Debug, Clone)]
pub struct VoteOptions {
    /// Full id of the target (`t3_` post or `t1_` comment)
    pub id: String,
    /// The vote to cast
    pub vote: Vote,
}

/// Operation for voting through an OAuth session
pub struct VoteOperation {
    options: VoteOptions,
    config: AppConfig,
}

impl VoteOperation {
    pub fn new(options: VoteOptions, config: AppConfig) -> Self {
        Self { options, config }
    }

    pub async fn execute(&self) -> Result<(), ClientError> {
        info!("voting {} on {}", self.options.vote.as_str(), self.options.id);

        let client = self.config.authenticated_oauth_client().await?;
        let target = ThingId::new(&self.options.id);
        client.vote(&target, self.options.vote).await
    }
}

/// CLI handler function for the vote command
pub async fn handle_vote_command(
    options: VoteOptions,
    config: AppConfig,
) -> Result<(), ClientError> {
    let operation = VoteOperation::new(options, config);
    match operation.execute().await {
        Ok(()) => {
            println!("Vote recorded.");
            Ok(())
        }
        Err(err) => {
            error!("error voting: {}", err);
            Err(err)
        }
    }
}
