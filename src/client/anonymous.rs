use log::debug;
use serde_json::Value;

use crate::models::{
    build_comment_tree, parse_listing, Comment, ListingOptions, PopularitySort, Redditor,
    Submission, Subreddit, Thing, TimeFilter,
};

use super::{encode_query, http_client, read_json, ClientError};

/// Where unauthenticated and cookie-authenticated requests go.
pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Read-only access to the public API, no account required.
///
/// Authenticated clients own one of these and delegate their reads to it.
pub struct AnonymousClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl AnonymousClient {
    pub fn new(user_agent: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, user_agent)
    }

    /// Points the client at a different host. Useful behind proxies and for
    /// tests that stand in a local mock server.
    pub fn with_base_url(base_url: &str, user_agent: &str) -> Self {
        Self {
            client: http_client(user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub(crate) async fn get_json(&self, url: &str) -> Result<Value, ClientError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    /// Returns the submissions on the default frontpage.
    pub async fn frontpage(&self) -> Result<Vec<Submission>, ClientError> {
        let url = format!("{}/.json", self.base_url);
        let value = self.get_json(&url).await?;
        Ok(parse_listing(value)?)
    }

    /// Returns the submissions on the given subreddit.
    pub async fn subreddit_submissions(
        &self,
        subreddit: &str,
    ) -> Result<Vec<Submission>, ClientError> {
        let url = format!("{}/r/{}.json", self.base_url, subreddit);
        let value = self.get_json(&url).await?;
        Ok(parse_listing(value)?)
    }

    /// Returns submissions from a subreddit (or the frontpage when `None`)
    /// under the given sort and listing options.
    ///
    /// Time filters only make sense for top/controversial; combining one
    /// with hot/new/rising is rejected before any request is made.
    pub async fn sorted_submissions(
        &self,
        subreddit: Option<&str>,
        sort: PopularitySort,
        options: &ListingOptions,
    ) -> Result<Vec<Submission>, ClientError> {
        if let Some(time) = options.time {
            if time != TimeFilter::Default
                && matches!(
                    sort,
                    PopularitySort::Hot | PopularitySort::New | PopularitySort::Rising
                )
            {
                return Err(ClientError::Api(format!(
                    "cannot sort {} by {}",
                    sort.as_str(),
                    time.as_str()
                )));
            }
        }

        let mut url = self.base_url.clone();
        if let Some(subreddit) = subreddit {
            url.push_str("/r/");
            url.push_str(subreddit);
        }
        match sort {
            PopularitySort::Default => url.push_str("/.json"),
            sort => {
                url.push('/');
                url.push_str(sort.as_str());
                url.push_str(".json");
            }
        }
        let query = encode_query(&options.query_pairs());
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let value = self.get_json(&url).await?;
        Ok(parse_listing(value)?)
    }

    /// Returns the account info of the given username.
    pub async fn about_redditor(&self, username: &str) -> Result<Redditor, ClientError> {
        let url = format!("{}/user/{}/about.json", self.base_url, username);
        let value = self.get_json(&url).await?;
        let thing: Thing<Redditor> = serde_json::from_value(value)?;
        Ok(thing.data)
    }

    /// Returns info about the given subreddit.
    pub async fn about_subreddit(&self, subreddit: &str) -> Result<Subreddit, ClientError> {
        let url = format!("{}/r/{}/about.json", self.base_url, subreddit);
        let value = self.get_json(&url).await?;
        let thing: Thing<Subreddit> = serde_json::from_value(value)?;
        Ok(thing.data)
    }

    /// Fetches and rebuilds the comment tree of a submission. Accepts the
    /// short id or the `t3_`-prefixed full id.
    pub async fn comments(&self, link_id: &str) -> Result<Vec<Comment>, ClientError> {
        let id = link_id.strip_prefix("t3_").unwrap_or(link_id);
        let url = format!("{}/comments/{}/.json", self.base_url, id);
        let value = self.get_json(&url).await?;
        Ok(build_comment_tree(&value))
    }

    /// Returns one of a user's listings: overview, submitted, comments,
    /// liked, disliked, hidden, saved or gilded.
    pub async fn user_listing(
        &self,
        username: &str,
        listing: &str,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        let mut pairs = Vec::new();
        if sort != PopularitySort::Default {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(after) = after {
            pairs.push(("after", after.to_string()));
        }
        let mut url = format!("{}/user/{}/{}.json", self.base_url, username, listing);
        let query = encode_query(&pairs);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        let value = self.get_json(&url).await?;
        Ok(parse_listing(value)?)
    }
}
