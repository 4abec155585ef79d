use std::{future::Future, sync::Arc};

use log::debug;
use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use url::Url;

use crate::{
    config::Config,
    post::{NewPost, Post, PostPatch},
};

const RETRY_LIMIT: u32 = 3;

/// What a feed request can come back with. The pipeline retries them all
/// the same way; the distinction survives for reporting.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest_middleware::Error),
    #[error("request rejected, check your access token ({0})")]
    Auth(StatusCode),
    #[error("server responded with {0}")]
    Server(StatusCode),
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.into())
    }
}

/// The paging seam the feed pipeline consumes.
pub trait FeedSource {
    fn fetch_page(
        &self,
        page: u32,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Post>, ApiError>> + Send;
}

//==============================================================================
//
//==============================================================================

#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    semaphore: Arc<Semaphore>,
    base: Url,
    token: String,
}

impl FeedClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            semaphore: Arc::new(Semaphore::new(config.limit())),
            base: config.api_url().clone(),
            token: config.token().to_string(),
        }
    }

    async fn client(&self) -> (ClientWithMiddleware, SemaphorePermit<'_>) {
        let permit = self.semaphore.acquire().await.unwrap();
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(RETRY_LIMIT);
        let client = ClientBuilder::new(self.client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        (client, permit)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        check_status(response.status())?;
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn list_posts(&self, page: u32, limit: usize) -> Result<Vec<Post>, ApiError> {
        let mut url = endpoint(&self.base, &["posts"]);
        url.query_pairs_mut()
            .append_pair("_author", "true")
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        debug!("GET {url}");

        let (client, _permit) = self.client().await;
        let response = self.send(self.authed(client.get(url))).await?;
        Self::read_json(response).await
    }

    pub async fn get_post(&self, id: u64) -> Result<Post, ApiError> {
        let mut url = endpoint(&self.base, &["posts", &id.to_string()]);
        url.query_pairs_mut().append_pair("_author", "true");
        debug!("GET {url}");

        let (client, _permit) = self.client().await;
        let response = self.send(self.authed(client.get(url))).await?;
        Self::read_json(response).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        let url = endpoint(&self.base, &["posts"]);
        debug!("POST {url}");

        let (client, _permit) = self.client().await;
        let response = self.send(self.authed(client.post(url).json(post))).await?;
        Self::read_json(response).await
    }

    pub async fn update_post(&self, id: u64, patch: &PostPatch) -> Result<Post, ApiError> {
        let url = endpoint(&self.base, &["posts", &id.to_string()]);
        debug!("PUT {url}");

        let (client, _permit) = self.client().await;
        let response = self.send(self.authed(client.put(url).json(patch))).await?;
        Self::read_json(response).await
    }

    pub async fn delete_post(&self, id: u64) -> Result<(), ApiError> {
        let url = endpoint(&self.base, &["posts", &id.to_string()]);
        debug!("DELETE {url}");

        let (client, _permit) = self.client().await;
        self.send(self.authed(client.delete(url))).await?;
        Ok(())
    }
}

impl FeedSource for FeedClient {
    fn fetch_page(
        &self,
        page: u32,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Post>, ApiError>> + Send {
        self.list_posts(page, limit)
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.path_segments_mut()
        .expect("api url cannot be a base")
        .pop_if_empty()
        .extend(segments);
    url
}

fn check_status(status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        Err(ApiError::Auth(status))
    } else {
        Err(ApiError::Server(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_onto_the_error_taxonomy() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(check_status(StatusCode::CREATED).is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(ApiError::Server(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY),
            Err(ApiError::Server(_))
        ));
    }

    #[test]
    fn endpoints_extend_the_api_root() {
        let base: Url = "https://api.example.dev/social".parse().unwrap();
        assert_eq!(
            endpoint(&base, &["posts"]).as_str(),
            "https://api.example.dev/social/posts"
        );
        assert_eq!(
            endpoint(&base, &["posts", "7"]).as_str(),
            "https://api.example.dev/social/posts/7"
        );

        let trailing: Url = "https://api.example.dev/social/".parse().unwrap();
        assert_eq!(
            endpoint(&trailing, &["posts"]).as_str(),
            "https://api.example.dev/social/posts"
        );
    }
}
