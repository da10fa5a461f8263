use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RemoteConfig;
use super::query::{Collection, Query};
use crate::repository::StorageError;

/// PostgREST code for "the result contains 0 rows" on a single-object request.
const NO_ROWS_CODE: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Thin client for the hosted record store's REST interface.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    rest_url: String,
}

impl RestClient {
    /// Build a client with auth headers baked in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if a header value is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self, StorageError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.api_key)?);
        let bearer = config.access_token.as_deref().unwrap_or(&config.api_key);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {bearer}"))?);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.base_url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, collection.as_str()))
    }

    /// Fetch every row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport failures, rejected requests, or
    /// rows that do not decode into `T`.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, StorageError> {
        tracing::debug!(collection = %query.collection(), "select");
        let response = self
            .request(Method::GET, query.collection())
            .query(&query.params())
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    /// Fetch exactly one row matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when no row matches, other
    /// `StorageError`s as for [`RestClient::select`].
    pub async fn select_single<T: DeserializeOwned>(&self, query: &Query) -> Result<T, StorageError> {
        tracing::debug!(collection = %query.collection(), "select single");
        let response = self
            .request(Method::GET, query.collection())
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&query.params())
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    /// Insert one row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport failures or rejected requests.
    pub async fn insert<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        body: &B,
    ) -> Result<(), StorageError> {
        tracing::debug!(%collection, "insert");
        let response = self
            .request(Method::POST, collection)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(drop)
    }

    /// Insert one row or merge it into the row sharing the `on_conflict` key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport failures or rejected requests.
    pub async fn upsert<B: Serialize + ?Sized>(
        &self,
        collection: Collection,
        body: &B,
        on_conflict: &[&str],
    ) -> Result<(), StorageError> {
        tracing::debug!(%collection, "upsert");
        let response = self
            .request(Method::POST, collection)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", on_conflict.join(","))])
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        check(response).await.map(drop)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, StorageError> {
    HeaderValue::from_str(raw).map_err(|e| StorageError::Connection(e.to_string()))
}

fn transport(err: reqwest::Error) -> StorageError {
    StorageError::Connection(err.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    response
        .json::<T>()
        .await
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

#[derive(Debug, Default, serde::Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
    Err(classify(status, body, text))
}

fn classify(status: StatusCode, body: ApiErrorBody, raw: String) -> StorageError {
    if body.code.as_deref() == Some(NO_ROWS_CODE) {
        return StorageError::NotFound;
    }
    if status == StatusCode::CONFLICT {
        return StorageError::Conflict;
    }
    StorageError::Rejected {
        status: status.as_u16(),
        code: body.code,
        message: body.message.unwrap_or(raw),
    }
}
