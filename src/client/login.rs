use log::{debug, info};
use serde_json::Value;

use crate::models::{
    Comment, Deletable, ListingOptions, NewSubmission, PopularitySort, Redditor, Replyable,
    Submission, Subreddit, Thing, Votable, Vote,
};

use super::anonymous::{AnonymousClient, DEFAULT_BASE_URL};
use super::{check_api_errors, encode_query, read_json, ClientError};

/// A cookie-authenticated session.
///
/// Logging in captures the `reddit_session` cookie plus the account's
/// modhash, an anti-CSRF token that rides along as the `uh` form field on
/// every mutating call. Reads that don't need the account delegate to the
/// wrapped [`AnonymousClient`].
pub struct LoginClient {
    anonymous: AnonymousClient,
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    cookie: Option<String>,
    modhash: String,
}

impl LoginClient {
    /// Logs into an account and returns the authenticated session.
    ///
    /// A failed login (wrong password, rate limit, captcha demanded)
    /// surfaces the service's error messages as [`ClientError::Api`].
    pub async fn login(
        username: &str,
        password: &str,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        Self::login_with_base_url(DEFAULT_BASE_URL, username, password, user_agent).await
    }

    pub async fn login_with_base_url(
        base_url: &str,
        username: &str,
        password: &str,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let anonymous = AnonymousClient::with_base_url(base_url, user_agent);
        let client = super::http_client(user_agent);
        let base_url = base_url.trim_end_matches('/').to_string();

        let url = format!("{}/api/login/{}", base_url, username);
        debug!("POST {}", url);
        let params = [
            ("user", username),
            ("passwd", password),
            ("api_type", "json"),
        ];
        let response = client.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        // The session cookie must be captured before the body is consumed.
        let cookie = response
            .cookies()
            .find(|cookie| cookie.name() == "reddit_session")
            .map(|cookie| cookie.value().to_string());

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        check_api_errors(&value)?;

        let modhash = value["json"]["data"]["modhash"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        info!("logged in as {}", username);

        Ok(Self {
            anonymous,
            client,
            base_url,
            username: username.to_string(),
            password: password.to_string(),
            cookie,
            modhash,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn modhash(&self) -> &str {
        &self.modhash
    }

    /// The wrapped anonymous client, for reads that need no account.
    pub fn anonymous(&self) -> &AnonymousClient {
        &self.anonymous
    }

    fn apply_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(value) => request.header(
                reqwest::header::COOKIE,
                format!("reddit_session={}", value),
            ),
            None => request,
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, ClientError> {
        debug!("GET {}", url);
        let response = self.apply_cookie(self.client.get(url)).send().await?;
        read_json(response).await
    }

    /// POSTs a form with the session cookie attached and surfaces any
    /// errors the response envelope carries.
    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self
            .apply_cookie(self.client.post(&url).form(params))
            .send()
            .await?;
        let value = read_json(response).await?;
        check_api_errors(&value)?;
        Ok(value)
    }

    /// Returns an up-to-date account object of the logged-in user.
    pub async fn me(&self) -> Result<Redditor, ClientError> {
        let url = format!("{}/api/me.json", self.base_url);
        let value = self.get_json(&url).await?;
        let thing: Thing<Redditor> = serde_json::from_value(value)?;
        Ok(thing.data)
    }

    /// Returns the submissions on the logged-in user's personal frontpage.
    pub async fn frontpage(
        &self,
        sort: PopularitySort,
        options: &ListingOptions,
    ) -> Result<Vec<Submission>, ClientError> {
        let mut url = match sort {
            PopularitySort::Default => format!("{}/.json", self.base_url),
            sort => format!("{}/{}/.json", self.base_url, sort.as_str()),
        };
        let query = encode_query(&options.query_pairs());
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        let value = self.get_json(&url).await?;
        Ok(crate::models::parse_listing(value)?)
    }

    /// Votes or rescinds a vote.
    pub async fn vote(&self, target: &impl Votable, vote: Vote) -> Result<(), ClientError> {
        self.post_form(
            "/api/vote",
            &[
                ("id", target.vote_id()),
                ("dir", vote.as_str()),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Posts a comment in response to a submission or another comment.
    pub async fn reply(&self, target: &impl Replyable, text: &str) -> Result<(), ClientError> {
        self.post_form(
            "/api/comment",
            &[
                ("thing_id", target.reply_id()),
                ("text", text),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Deletes one of the logged-in user's submissions or comments.
    pub async fn delete(&self, target: &impl Deletable) -> Result<(), ClientError> {
        self.post_form(
            "/api/del",
            &[
                ("id", target.delete_id()),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Submits a new link or self post.
    pub async fn submit(&self, submission: &NewSubmission) -> Result<(), ClientError> {
        let send_replies = submission.send_replies.to_string();
        let resubmit = submission.resubmit.to_string();
        self.post_form(
            "/api/submit",
            &[
                ("title", &submission.title),
                ("url", &submission.content),
                ("text", &submission.content),
                ("sr", &submission.subreddit),
                ("kind", submission.kind()),
                ("sendreplies", &send_replies),
                ("resubmit", &resubmit),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Saves a submission or comment, optionally into a category.
    pub async fn save(&self, fullname: &str, category: Option<&str>) -> Result<(), ClientError> {
        let mut params = vec![
            ("id", fullname),
            ("uh", self.modhash.as_str()),
            ("api_type", "json"),
        ];
        if let Some(category) = category {
            params.push(("category", category));
        }
        self.post_form("/api/save", &params).await?;
        Ok(())
    }

    /// Removes a submission or comment from the saved list.
    pub async fn unsave(&self, fullname: &str) -> Result<(), ClientError> {
        self.post_form(
            "/api/unsave",
            &[
                ("id", fullname),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Invalidates every other session of this account and rotates the
    /// current one.
    pub async fn clear_sessions(&self) -> Result<(), ClientError> {
        self.post_form(
            "/api/clear_sessions",
            &[
                ("curpass", self.password.as_str()),
                ("uh", &self.modhash),
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Whether the account must solve a captcha before submitting.
    pub async fn needs_captcha(&self) -> Result<bool, ClientError> {
        let url = format!("{}/api/needs_captcha.json", self.base_url);
        let value = self.get_json(&url).await?;
        value
            .as_bool()
            .ok_or_else(|| ClientError::Api("unexpected needs_captcha response".to_string()))
    }

    /// Requests a fresh captcha identifier.
    pub async fn new_captcha_iden(&self) -> Result<String, ClientError> {
        let value = self
            .post_form("/api/new_captcha", &[("api_type", "json")])
            .await?;
        Ok(value["json"]["data"]["iden"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    /// Fetches the comment tree of a submission (delegated; comments are
    /// public data).
    pub async fn comments(&self, link_id: &str) -> Result<Vec<Comment>, ClientError> {
        self.anonymous.comments(link_id).await
    }

    pub async fn about_redditor(&self, username: &str) -> Result<Redditor, ClientError> {
        self.anonymous.about_redditor(username).await
    }

    pub async fn about_subreddit(&self, subreddit: &str) -> Result<Subreddit, ClientError> {
        self.anonymous.about_subreddit(subreddit).await
    }

    pub async fn subreddit_submissions(
        &self,
        subreddit: &str,
    ) -> Result<Vec<Submission>, ClientError> {
        self.anonymous.subreddit_submissions(subreddit).await
    }

    /// One of the logged-in user's own listings, cookie attached so
    /// private listings (saved, hidden) resolve.
    pub async fn my_listing(
        &self,
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
        let mut url = format!("{}/user/{}/{}.json", self.base_url, self.username, listing);
        let query = encode_query(&pairs);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        let value = self.get_json(&url).await?;
        Ok(crate::models::parse_listing(value)?)
    }

    pub async fn my_overview(
        &self,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        self.my_listing("overview", sort, after).await
    }

    pub async fn my_submitted(
        &self,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        self.my_listing("submitted", sort, after).await
    }

    pub async fn my_saved(
        &self,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        self.my_listing("saved", sort, after).await
    }

    pub async fn my_hidden(
        &self,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        self.my_listing("hidden", sort, after).await
    }
}
