use crate::infrastructure::error::{Result, RtcError};
use avatar_session_core::protocol::StatusResponse;
use avatar_session_core::RetryPolicy;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for the avatar API with Basic auth and backoff retries.
///
/// Retries cover transport failures only; an HTTP error status is returned
/// to the caller immediately.
#[derive(Clone)]
pub struct ApiHttp {
    client: reqwest::Client,
    base_url: String,
    authorization: String,
    retry: RetryPolicy,
}

impl ApiHttp {
    pub fn new(base_url: &str, key: &str, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", key),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(header::AUTHORIZATION, &self.authorization)
    }

    /// POST JSON once, no retries
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(response).await
    }

    /// POST without a body
    pub async fn post_empty<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).send().await?;
        decode(response).await
    }

    /// POST JSON once and discard the response body
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// POST JSON, retrying transport failures with backoff
    pub async fn post_with_retries<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send_with_retries(|| self.request(Method::POST, path).json(body), path)
            .await?;
        decode(response).await
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.request(Method::GET, path).send().await?;
        decode(response).await
    }

    /// DELETE with a JSON body
    pub async fn delete<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::DELETE, path).json(body).send().await?;
        check_status(response).await.map(|_| ())
    }

    /// GET `path` until its `status` is `done`, backing off per `policy`.
    ///
    /// Both request errors and unfinished states count as a failed attempt.
    pub async fn poll_until_done(&self, path: &str, policy: RetryPolicy) -> Result<StatusResponse> {
        with_backoff(policy, path, || async {
            match self.get::<StatusResponse>(path).await {
                Ok(status) if status.is_done() => Ok(status),
                Ok(status) => Err(format!(
                    "status {}",
                    status.status.as_deref().unwrap_or("unknown")
                )),
                Err(e) => Err(e.to_string()),
            }
        })
        .await
    }

    async fn send_with_retries<F>(&self, build: F, path: &str) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        with_backoff(self.retry, path, || async {
            build().send().await.map_err(|e| e.to_string())
        })
        .await
    }
}

/// Run `attempt` until it succeeds, at most `1 + policy.max_retries` times.
///
/// Gives up with [`RtcError::MaxRetries`] carrying the last failure.
pub(crate) async fn with_backoff<T, F, Fut>(policy: RetryPolicy, what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, String>>,
{
    let mut retry = 1;
    loop {
        let failure = match attempt().await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        if !policy.should_retry(retry) {
            return Err(RtcError::MaxRetries(format!("{}: {}", what, failure)));
        }

        let delay = policy.delay(retry, rand::random::<f64>());
        tracing::warn!(
            "{} failed ({}), retrying {}/{} in {:.1}s",
            what,
            failure,
            retry,
            policy.max_retries,
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(RtcError::HttpStatus {
        status: status.as_u16(),
        url,
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
