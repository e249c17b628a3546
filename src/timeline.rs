//! Fetches a user's recent tweets the way the logged-out web client does.
//!
//! [`TimelineClient::connect`] does all of the session work up front: it collects the guest
//! token, bearer token and query id, builds the request headers from them, and resolves the
//! screen name to a user id through the `UserByScreenName` GraphQL operation. A client that
//! exists is ready to call [`TimelineClient::fetch`] as many times as needed.

use crate::error::{Operation, TimelineError};
use crate::model::Post;
use crate::session::{session_client, ClientOptions};
use crate::tokens::{Credentials, TokenProvider};
use maplit::hashmap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_COUNT: usize = 10;

pub struct TimelineClient {
    client: Client,
    api_base: String,
    screen_name: String,
    user_id: String,
}

#[derive(Deserialize)]
struct UserByScreenNameResponse {
    data: UserByScreenNameData,
}

#[derive(Deserialize)]
struct UserByScreenNameData {
    user: UserResult,
}

#[derive(Deserialize)]
struct UserResult {
    rest_id: String,
}

#[derive(Deserialize)]
struct ProfileTimelineResponse {
    #[serde(rename = "globalObjects")]
    global_objects: GlobalObjects,
}

#[derive(Deserialize)]
struct GlobalObjects {
    // Entries are only checked once selected.
    tweets: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct TimelineTweet {
    full_text: String,
}

/// Reads a JSON body, then checks it has the shape `T` describes.
///
/// A body that is not JSON at all counts as a failed request, one that is JSON but
/// lacks the expected fields as a data mismatch.
async fn deserialize_response<T: DeserializeOwned>(
    response: Response,
    operation: Operation,
    detail: &'static str,
) -> Result<T, TimelineError> {
    let status = response.status();
    if !status.is_success() {
        log::debug!("{} responded with {}", operation, status);
    }
    let value = response
        .json::<serde_json::Value>()
        .await
        .map_err(TimelineError::request(operation))?;
    serde_json::from_value(value).map_err(|e| {
        log::debug!("Unexpected response for {}: {}", operation, e);
        TimelineError::DataShapeMismatch { operation, detail }
    })
}

impl TimelineClient {
    /// Bootstraps a session for `screen_name`.
    ///
    /// Fails if any session value is unavailable or the user id cannot be resolved;
    /// nothing is retried.
    pub async fn connect(
        screen_name: &str,
        tokens: &dyn TokenProvider,
        options: ClientOptions,
    ) -> Result<Self, TimelineError> {
        let credentials = Credentials::acquire(tokens).await?;
        log::debug!("Acquired session values for {}", screen_name);
        let client = session_client(&credentials, &options)?;
        let api_base = options.api_base.trim_end_matches('/').to_string();
        let user_id =
            get_id_for_username(&client, &api_base, &credentials.query_id, screen_name).await?;
        log::info!("Resolved {} to user id {}", screen_name, user_id);
        Ok(Self {
            client,
            api_base,
            screen_name: screen_name.to_string(),
            user_id,
        })
    }

    pub fn screen_name(&self) -> &str {
        &self.screen_name
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Up to `count` tweet texts, most recent first, one line each
    pub async fn fetch(&self, count: usize) -> Result<Vec<String>, TimelineError> {
        let posts = self.fetch_posts(count).await?;
        Ok(posts.into_iter().map(|post| post.text).collect())
    }

    pub async fn fetch_posts(&self, count: usize) -> Result<Vec<Post>, TimelineError> {
        let url = format!("{}/2/timeline/profile/{}.json", self.api_base, self.user_id);
        // The endpoint's own `count` is applied before deleted and suspended tweets are
        // filtered out, so it can return fewer than asked for. Truncate locally instead.
        let query = hashmap! {
            "tweet_mode" => "extended",
        };
        let response = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(TimelineError::request(Operation::Timeline))?;
        let response = deserialize_response::<ProfileTimelineResponse>(
            response,
            Operation::Timeline,
            "unexpected timeline response",
        )
        .await?;
        let posts = latest_posts(response.global_objects.tweets, count)?;
        log::debug!("Got {} tweets for {}", posts.len(), self.screen_name);
        Ok(posts)
    }
}

async fn get_id_for_username(
    client: &Client,
    api_base: &str,
    query_id: &str,
    screen_name: &str,
) -> Result<String, TimelineError> {
    let url = format!("{}/graphql/{}/UserByScreenName", api_base, query_id);
    let variables = serde_json::json!({
        "screen_name": screen_name,
        "withHighlightedLabel": true,
    });
    let response = client
        .get(url)
        .query(&[("variables", variables.to_string())])
        .send()
        .await
        .map_err(TimelineError::request(Operation::UserLookup))?;
    let response = deserialize_response::<UserByScreenNameResponse>(
        response,
        Operation::UserLookup,
        "could not find user rest_id in GraphQL response",
    )
    .await?;
    Ok(response.data.user.rest_id)
}

/// Orders tweets newest first by id and keeps the first `count`.
///
/// Keys that are not canonical numeric ids are skipped. Only the kept entries need to
/// carry a `full_text`.
fn latest_posts(
    tweets: HashMap<String, serde_json::Value>,
    count: usize,
) -> Result<Vec<Post>, TimelineError> {
    let mut tweets: Vec<(u64, serde_json::Value)> = tweets
        .into_iter()
        .filter_map(|(key, tweet)| match key.parse::<u64>() {
            Ok(id) if id.to_string() == key => Some((id, tweet)),
            _ => {
                log::warn!("Skipping tweet with non-numeric id {:?}", key);
                None
            }
        })
        .collect();
    tweets.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    tweets.truncate(count);
    tweets
        .into_iter()
        .map(|(id, tweet)| {
            let tweet = serde_json::from_value::<TimelineTweet>(tweet).map_err(|e| {
                log::debug!("Unexpected tweet {}: {}", id, e);
                TimelineError::DataShapeMismatch {
                    operation: Operation::Timeline,
                    detail: "tweet has no full_text",
                }
            })?;
            Ok(Post::new(id, &tweet.full_text))
        })
        .collect()
}
