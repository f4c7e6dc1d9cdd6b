use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;
use tiny_http::{Response, Server, StatusCode};
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::models::{
    build_comment_tree, parse_listing, Comment, Deletable, Friend, Karma, ListingOptions,
    NewSubmission, PopularitySort, Preferences, Redditor, Replyable, Submission, Subreddit,
    Thing, Trophy, TrophyList, Votable, Vote,
};

use super::{check_api_errors, encode_query, http_client, read_json, ClientError};

/// Where OAuth-authenticated API requests go.
pub const OAUTH_API_URL: &str = "https://oauth.reddit.com";
/// Token endpoint of the OAuth2 flows.
pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
/// Authorization page the code grant sends the user to.
pub const AUTHORIZE_URL: &str = "https://www.reddit.com/api/v1/authorize";

const DEFAULT_SCOPES: &str = "identity read submit vote history save";

/// OAuth tokens and credentials, persisted per client id so sessions
/// survive restarts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenStorage {
    pub client_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<u64>,
    pub last_updated: u64,
}

impl TokenStorage {
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
            last_updated: chrono::Utc::now().timestamp() as u64,
        }
    }

    pub fn is_access_token_valid(&self) -> bool {
        match (self.access_token.as_ref(), self.token_expires_at) {
            (Some(_), Some(expiry)) => {
                let now = chrono::Utc::now().timestamp() as u64;
                // 5-minute buffer so a token doesn't expire mid-request
                now + 300 < expiry
            }
            _ => false,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    fn storage_dir() -> PathBuf {
        let mut dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push(".orangered");
        if !dir.exists() {
            fs::create_dir_all(&dir).ok();
        }
        dir
    }

    fn storage_path(client_id: &str) -> PathBuf {
        let mut path = Self::storage_dir();
        path.push(format!("{}.json", client_id));
        path
    }

    /// Loads persisted tokens for a client id, if any.
    pub fn load(client_id: &str) -> Option<Self> {
        let path = Self::storage_path(client_id);
        if !path.exists() {
            return None;
        }

        let mut file = File::open(&path).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;

        match serde_json::from_str(&contents) {
            Ok(storage) => Some(storage),
            Err(err) => {
                debug!("failed to parse token storage: {}", err);
                None
            }
        }
    }

    /// Persists the tokens to the filesystem.
    pub fn save(&self) -> Result<(), ClientError> {
        let path = Self::storage_path(&self.client_id);
        let json = serde_json::to_string_pretty(self)?;

        let mut file = File::create(&path).map_err(|err| {
            ClientError::Api(format!("failed to create token file: {}", err))
        })?;
        file.write_all(json.as_bytes()).map_err(|err| {
            ClientError::Api(format!("failed to write token file: {}", err))
        })?;

        debug!("saved token storage to {}", path.display());
        Ok(())
    }
}

/// An OAuth2 bearer-token session.
///
/// Supports the password grant (script apps) and the authorization-code
/// grant with a localhost callback (installed apps), plus token refresh.
/// Every API call requires an established token; calling one without
/// authenticating first fails with [`ClientError::NotAuthenticated`].
pub struct OauthClient {
    client: reqwest::Client,
    user_agent: String,
    api_base: String,
    token_url: String,
    access_token: Option<String>,
    token_storage: Option<TokenStorage>,
    persist_tokens: bool,
    throttle: Option<Duration>,
    last_request: Mutex<Option<Instant>>,
}

impl OauthClient {
    pub fn new(user_agent: &str) -> Self {
        Self::with_endpoints(OAUTH_API_URL, TOKEN_URL, user_agent)
    }

    /// Points the client at different API and token endpoints. Useful for
    /// tests that stand in a local mock server.
    pub fn with_endpoints(api_base: &str, token_url: &str, user_agent: &str) -> Self {
        Self {
            client: http_client(user_agent),
            user_agent: user_agent.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            access_token: None,
            token_storage: None,
            persist_tokens: false,
            throttle: None,
            last_request: Mutex::new(None),
        }
    }

    /// Creates a client that reuses tokens persisted for this client id
    /// and keeps the on-disk storage up to date as they are refreshed.
    pub fn with_stored_tokens(client_id: &str, user_agent: &str) -> Self {
        let mut client = Self::new(user_agent);
        client.persist_tokens = true;
        match TokenStorage::load(client_id) {
            Some(storage) => {
                if storage.is_access_token_valid() {
                    client.access_token = storage.access_token.clone();
                }
                client.token_storage = Some(storage);
            }
            None => client.token_storage = Some(TokenStorage::new(client_id)),
        }
        client
    }

    /// Creates a client around an access token obtained elsewhere (useful
    /// for headless environments).
    pub fn with_access_token(token: &str, user_agent: &str) -> Self {
        let mut client = Self::new(user_agent);
        client.access_token = Some(token.to_string());
        client
    }

    /// Installs an access token obtained elsewhere on this client.
    pub fn set_access_token(&mut self, token: &str) {
        self.access_token = Some(token.to_string());
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Sets the minimum interval between outbound requests. Zero disables
    /// throttling. The gate serializes this client's calls cooperatively;
    /// it is not a correctness guarantee.
    pub fn throttle(&mut self, interval: Duration) {
        self.throttle = if interval.is_zero() {
            None
        } else {
            Some(interval)
        };
    }

    async fn wait_for_throttle(&self) {
        let Some(interval) = self.throttle else {
            return;
        };
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn bearer(&self) -> Result<&str, ClientError> {
        self.access_token
            .as_deref()
            .ok_or(ClientError::NotAuthenticated(
                "no access token; authenticate first",
            ))
    }

    /// Records a token response: remembers the access token, persists it
    /// together with any refresh token, and returns it.
    fn apply_token_response(
        &mut self,
        client_id: &str,
        json: &Value,
    ) -> Result<String, ClientError> {
        if let Some(error) = json["error"].as_str() {
            return Err(ClientError::Api(format!("token request failed: {}", error)));
        }

        let token = json["access_token"]
            .as_str()
            .ok_or_else(|| {
                ClientError::Api("no access token in token response".to_string())
            })?
            .to_string();

        let now = chrono::Utc::now().timestamp() as u64;
        let expires_in = json["expires_in"].as_u64().unwrap_or(3600);

        if self.token_storage.is_none() {
            self.token_storage = Some(TokenStorage::new(client_id));
        }
        if let Some(storage) = &mut self.token_storage {
            storage.client_id = client_id.to_string();
            storage.access_token = Some(token.clone());
            storage.token_expires_at = Some(now + expires_in);
            storage.last_updated = now;
            if let Some(refresh) = json["refresh_token"].as_str() {
                storage.refresh_token = Some(refresh.to_string());
                debug!("received and stored refresh token");
            }
            if self.persist_tokens {
                storage.save()?;
            }
        }

        self.access_token = Some(token.clone());
        Ok(token)
    }

    async fn token_request(
        &self,
        basic_auth: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic_auth))
            .form(params)
            .send()
            .await?;
        read_json(response).await
    }

    /// Authenticates with the password grant. Requires a "script" type app;
    /// the token it yields can vote, submit and comment as the account.
    pub async fn login(
        &mut self,
        client_id: &str,
        client_secret: &str,
        username: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let params = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", DEFAULT_SCOPES),
        ];
        let auth = base64::encode(format!("{}:{}", client_id, client_secret));

        let json = self.token_request(&auth, &params).await?;
        let token = self.apply_token_response(client_id, &json)?;
        debug!(
            "password grant succeeded, scopes: {:?}",
            json["scope"].as_str()
        );
        Ok(token)
    }

    /// Exchanges an authorization code for an access token. Installed apps
    /// authenticate with just `client_id:` as the Basic credentials.
    pub async fn authenticate_with_code(
        &mut self,
        client_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, ClientError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let auth = base64::encode(format!("{}:", client_id));

        let json = self.token_request(&auth, &params).await?;
        let token = self.apply_token_response(client_id, &json)?;
        debug!("code grant succeeded");
        Ok(token)
    }

    /// Redeems a stored refresh token for a fresh access token.
    pub async fn refresh_access_token(&mut self) -> Result<String, ClientError> {
        let storage = match &self.token_storage {
            Some(storage) if storage.has_refresh_token() => storage.clone(),
            _ => {
                return Err(ClientError::NotAuthenticated("no refresh token available"));
            }
        };
        let refresh_token = storage.refresh_token.clone().unwrap_or_default();
        let client_id = storage.client_id.clone();

        debug!("refreshing access token");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];
        let auth = base64::encode(format!("{}:", client_id));

        let json = self.token_request(&auth, &params).await?;
        self.apply_token_response(&client_id, &json)
    }

    /// The URL to send a user to for the authorization-code grant.
    pub fn auth_code_url(
        client_id: &str,
        redirect_uri: &str,
        state: &str,
        scopes: &str,
    ) -> String {
        format!(
            "{}?client_id={}&response_type=code&state={}&redirect_uri={}&duration=permanent&scope={}",
            AUTHORIZE_URL, client_id, state, redirect_uri, scopes
        )
    }

    /// Runs the interactive authorization-code grant: starts a localhost
    /// callback server, opens the user's browser on the authorization
    /// page, waits for the redirect, and exchanges the code.
    ///
    /// Works with any account, including ones that sign in through a
    /// third-party identity provider.
    pub async fn authenticate_with_browser(
        &mut self,
        client_id: &str,
        redirect_port: Option<u16>,
        scopes: Option<&str>,
    ) -> Result<String, ClientError> {
        // The interactive flow is exactly the one that benefits from
        // persistence, so turn it on and reuse saved tokens before
        // bothering the user.
        self.persist_tokens = true;
        if self.token_storage.is_none() {
            if let Some(storage) = TokenStorage::load(client_id) {
                self.token_storage = Some(storage);
            } else {
                self.token_storage = Some(TokenStorage::new(client_id));
            }
        }
        let (valid_token, has_refresh) = match &self.token_storage {
            Some(storage) => (
                storage
                    .is_access_token_valid()
                    .then(|| storage.access_token.clone())
                    .flatten(),
                storage.has_refresh_token(),
            ),
            None => (None, false),
        };
        if let Some(token) = valid_token {
            debug!("using persisted access token");
            self.access_token = Some(token.clone());
            return Ok(token);
        }
        if has_refresh {
            match self.refresh_access_token().await {
                Ok(token) => return Ok(token),
                Err(err) => debug!("token refresh failed ({}), opening browser", err),
            }
        }

        let port = redirect_port.unwrap_or(8080);
        let scopes = scopes.unwrap_or(DEFAULT_SCOPES);
        let redirect_uri = format!("http://localhost:{}/callback", port);

        // Random state token so the callback can reject forged redirects.
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let auth_url = Self::auth_code_url(client_id, &redirect_uri, &state, scopes);

        let server = Server::http(format!("127.0.0.1:{}", port)).map_err(|err| {
            ClientError::Api(format!("failed to start callback server: {}", err))
        })?;

        let (tx, rx) = mpsc::channel();
        let server_thread = thread::spawn(move || serve_callback(server, &state, &tx));

        info!("opening browser for OAuth authorization");
        if webbrowser::open(&auth_url).is_err() {
            info!("could not open a browser; visit this URL manually:");
            info!("{}", auth_url);
        }

        let code = match rx.recv_timeout(Duration::from_secs(300)) {
            Ok(Ok(code)) => code,
            Ok(Err(msg)) => return Err(ClientError::Api(msg)),
            Err(_) => {
                return Err(ClientError::Api(
                    "timed out waiting for authorization".to_string(),
                ))
            }
        };
        let _ = server_thread.join();

        info!("exchanging authorization code for access token");
        self.authenticate_with_code(client_id, &code, &redirect_uri)
            .await
    }

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        let token = self.bearer()?.to_string();
        self.wait_for_throttle().await;

        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;
        read_json(response).await
    }

    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ClientError> {
        let token = self.bearer()?.to_string();
        self.wait_for_throttle().await;

        let url = format!("{}{}", self.api_base, path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .form(params)
            .send()
            .await?;
        let value = read_json(response).await?;
        check_api_errors(&value)?;
        Ok(value)
    }

    /// Returns the account behind the token.
    pub async fn me(&self) -> Result<Redditor, ClientError> {
        let value = self.get_json("/api/v1/me").await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Per-subreddit karma breakdown of the logged-in user.
    pub async fn my_karma(&self) -> Result<Vec<Karma>, ClientError> {
        let value = self.get_json("/api/v1/me/karma").await?;
        Ok(serde_json::from_value(value["data"].clone())?)
    }

    pub async fn my_preferences(&self) -> Result<Preferences, ClientError> {
        let value = self.get_json("/api/v1/me/prefs").await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn my_friends(&self) -> Result<Vec<Friend>, ClientError> {
        let value = self.get_json("/api/v1/me/friends").await?;
        Ok(parse_listing(value)?)
    }

    pub async fn my_trophies(&self) -> Result<Vec<Trophy>, ClientError> {
        let value = self.get_json("/api/v1/me/trophies").await?;
        let trophies: TrophyList = serde_json::from_value(value)?;
        Ok(trophies.into_trophies())
    }

    pub async fn user_trophies(&self, username: &str) -> Result<Vec<Trophy>, ClientError> {
        let value = self
            .get_json(&format!("/api/v1/user/{}/trophies", username))
            .await?;
        let trophies: TrophyList = serde_json::from_value(value)?;
        Ok(trophies.into_trophies())
    }

    pub async fn about_redditor(&self, username: &str) -> Result<Redditor, ClientError> {
        let value = self.get_json(&format!("/user/{}/about", username)).await?;
        let thing: Thing<Redditor> = serde_json::from_value(value)?;
        Ok(thing.data)
    }

    pub async fn about_subreddit(&self, subreddit: &str) -> Result<Subreddit, ClientError> {
        let value = self.get_json(&format!("/r/{}/about", subreddit)).await?;
        let thing: Thing<Subreddit> = serde_json::from_value(value)?;
        Ok(thing.data)
    }

    /// Submissions from a subreddit (or the frontpage when `None`) under
    /// the given sort.
    pub async fn subreddit_submissions(
        &self,
        subreddit: Option<&str>,
        sort: PopularitySort,
        options: &ListingOptions,
    ) -> Result<Vec<Submission>, ClientError> {
        let mut path = String::new();
        if let Some(subreddit) = subreddit {
            path.push_str("/r/");
            path.push_str(subreddit);
        }
        match sort {
            PopularitySort::Default => path.push_str("/.json"),
            sort => {
                path.push('/');
                path.push_str(sort.as_str());
                path.push_str(".json");
            }
        }
        let query = encode_query(&options.query_pairs());
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        let value = self.get_json(&path).await?;
        Ok(parse_listing(value)?)
    }

    pub async fn frontpage(
        &self,
        sort: PopularitySort,
        options: &ListingOptions,
    ) -> Result<Vec<Submission>, ClientError> {
        self.subreddit_submissions(None, sort, options).await
    }

    /// One of a user's listings: overview, submitted, comments, upvoted...
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
        let mut path = format!("/user/{}/{}", username, listing);
        let query = encode_query(&pairs);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        let value = self.get_json(&path).await?;
        Ok(parse_listing(value)?)
    }

    pub async fn my_upvoted(
        &self,
        sort: PopularitySort,
        after: Option<&str>,
    ) -> Result<Vec<Submission>, ClientError> {
        let me = self.me().await?;
        self.user_listing(&me.name, "upvoted", sort, after).await
    }

    /// Fetches and rebuilds the comment tree of a submission. Accepts the
    /// short id or the `t3_`-prefixed full id.
    pub async fn comments(&self, link_id: &str) -> Result<Vec<Comment>, ClientError> {
        let id = link_id.strip_prefix("t3_").unwrap_or(link_id);
        let value = self.get_json(&format!("/comments/{}/.json", id)).await?;
        Ok(build_comment_tree(&value))
    }

    /// Submits a new link or self post and returns the created submission.
    pub async fn submit(
        &self,
        submission: &NewSubmission,
    ) -> Result<Submission, ClientError> {
        let send_replies = submission.send_replies.to_string();
        let resubmit = submission.resubmit.to_string();
        let value = self
            .post_form(
                "/api/submit",
                &[
                    ("title", submission.title.as_str()),
                    ("url", submission.content.as_str()),
                    ("text", submission.content.as_str()),
                    ("sr", submission.subreddit.as_str()),
                    ("kind", submission.kind()),
                    ("sendreplies", send_replies.as_str()),
                    ("resubmit", resubmit.as_str()),
                    ("api_type", "json"),
                ],
            )
            .await?;
        Ok(serde_json::from_value(value["json"]["data"].clone())?)
    }

    /// Votes or rescinds a vote.
    pub async fn vote(&self, target: &impl Votable, vote: Vote) -> Result<(), ClientError> {
        self.post_form(
            "/api/vote",
            &[
                ("id", target.vote_id()),
                ("dir", vote.as_str()),
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
                ("api_type", "json"),
            ],
        )
        .await?;
        Ok(())
    }

    /// Deletes one of the account's submissions or comments.
    pub async fn delete(&self, target: &impl Deletable) -> Result<(), ClientError> {
        self.post_form(
            "/api/del",
            &[("id", target.delete_id()), ("api_type", "json")],
        )
        .await?;
        Ok(())
    }

    /// Saves a submission or comment, optionally into a category.
    pub async fn save(&self, fullname: &str, category: Option<&str>) -> Result<(), ClientError> {
        let mut params = vec![("id", fullname), ("api_type", "json")];
        if let Some(category) = category {
            params.push(("category", category));
        }
        self.post_form("/api/save", &params).await?;
        Ok(())
    }

    pub async fn unsave(&self, fullname: &str) -> Result<(), ClientError> {
        self.post_form("/api/unsave", &[("id", fullname), ("api_type", "json")])
            .await?;
        Ok(())
    }
}

/// Handles callback requests until one carries a usable result, answering
/// the browser with a small status page each time.
fn serve_callback(server: Server, state: &str, tx: &mpsc::Sender<Result<String, String>>) {
    for request in server.incoming_requests() {
        let path = request.url().to_string();
        if !path.starts_with("/callback") {
            let response = Response::from_string("not found").with_status_code(StatusCode(404));
            request.respond(response).ok();
            continue;
        }
        debug!("received callback: {}", path);

        let outcome = parse_callback(&path, state);
        let (page, status) = match &outcome {
            Ok(_) => (
                "Authentication successful. You can close this window.".to_string(),
                StatusCode(200),
            ),
            Err(msg) => (format!("Authentication error: {}", msg), StatusCode(400)),
        };
        let response = Response::from_string(page).with_status_code(status);
        request.respond(response).ok();

        tx.send(outcome).ok();
        break;
    }
}

/// Validates the callback query string and extracts the authorization code.
fn parse_callback(path: &str, expected_state: &str) -> Result<String, String> {
    let url = Url::parse(&format!("http://localhost{}", path))
        .map_err(|_| "invalid callback URL".to_string())?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(format!("authorization error: {}", error));
    }
    match state {
        Some(state) if state == expected_state => {}
        Some(_) => return Err("state mismatch".to_string()),
        None => return Err("no state parameter received".to_string()),
    }
    code.ok_or_else(|| "no authorization code received".to_string())
}
