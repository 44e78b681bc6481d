//! Authenticated client for the transfer API.

use std::time::Duration;

use async_trait::async_trait;
use mcbridge_transfer_core::{
    Task, TaskFilter, TransferError, TransferItem, TransferResult, TransferService,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{GlobusError, GlobusResult};
use crate::wire::{DataEnvelope, ErrorDocument, TaskDocument, TransferDocument};

const OP_TASK_LIST: &str = "task_list";
const OP_SUCCESSFUL_TRANSFERS: &str = "successful_transfers";

/// Transfer API client authenticated with a bearer token.
#[derive(Clone)]
pub struct GlobusClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl GlobusClient {
    /// Build a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(base_url: Url, token: impl Into<String>, timeout: Duration) -> GlobusResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GlobusError::Build { source })?;
        Ok(Self::with_client(http, base_url, token))
    }

    /// Wrap an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch tasks on `endpoint_id` that match `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn task_list(
        &self,
        endpoint_id: &str,
        filter: &TaskFilter,
    ) -> GlobusResult<Vec<Task>> {
        let mut url = self.endpoint(&["endpoint_manager", "task_list"])?;
        url.query_pairs_mut()
            .append_pair("filter_endpoint", endpoint_id)
            .append_pair("filter_status", filter.status.as_str())
            .append_pair("filter_completion_time", &filter.completed_after_param())
            .append_pair("orderby", filter.order_by.as_str())
            .append_pair("limit", &filter.limit.to_string());

        let docs: Vec<TaskDocument> = self.get_data(OP_TASK_LIST, url).await?;
        Ok(docs.into_iter().map(Task::from).collect())
    }

    /// Fetch the files `task_id` transferred successfully, starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn successful_transfers(
        &self,
        task_id: &str,
        offset: u64,
    ) -> GlobusResult<Vec<TransferItem>> {
        let mut url = self.endpoint(&["task", task_id, "successful_transfers"])?;
        url.query_pairs_mut().append_pair("offset", &offset.to_string());

        let docs: Vec<TransferDocument> = self.get_data(OP_SUCCESSFUL_TRANSFERS, url).await?;
        Ok(docs.into_iter().map(TransferItem::from).collect())
    }

    fn endpoint(&self, segments: &[&str]) -> GlobusResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GlobusError::InvalidUrl {
                url: self.base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> GlobusResult<Vec<T>> {
        let target = url.to_string();
        debug!(operation, url = %target, "issuing transfer API request");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| GlobusError::Http {
                operation,
                url: target.clone(),
                source,
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| GlobusError::Http {
                operation,
                url: target.clone(),
                source,
            })?;

        if !status.is_success() {
            let problem = serde_json::from_slice::<ErrorDocument>(&bytes).unwrap_or_default();
            warn!(
                operation,
                url = %target,
                status = status.as_u16(),
                code = problem.code.as_deref().unwrap_or(""),
                detail = problem.message.as_deref().unwrap_or(""),
                "transfer API rejected request"
            );
            return Err(GlobusError::Status {
                operation,
                url: target,
                status: status.as_u16(),
                code: problem.code,
                message: problem.message,
            });
        }

        let envelope: DataEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|source| GlobusError::Decode {
                operation,
                url: target,
                source,
            })?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl TransferService for GlobusClient {
    async fn list_recent_succeeded_tasks(
        &self,
        endpoint_id: &str,
        filter: &TaskFilter,
    ) -> TransferResult<Vec<Task>> {
        self.task_list(endpoint_id, filter)
            .await
            .map_err(|err| TransferError::service(err.operation(), endpoint_id, err))
    }

    async fn list_successful_transfer_items(
        &self,
        task_id: &str,
        offset: u64,
    ) -> TransferResult<Vec<TransferItem>> {
        self.successful_transfers(task_id, offset)
            .await
            .map_err(|err| TransferError::service(err.operation(), task_id, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use httpmock::prelude::*;
    use serde_json::json;

    const TOKEN: &str = "secret-token";

    fn client_for(server: &MockServer) -> GlobusClient {
        let base = Url::parse(&server.url("/v0.10")).expect("valid URL");
        GlobusClient::new(base, TOKEN, Duration::from_secs(5)).expect("client builds")
    }

    fn weekly_filter() -> TaskFilter {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 8, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        TaskFilter::recent_succeeded(now, TimeDelta::days(7), 1_000)
    }

    #[tokio::test]
    async fn task_list_sends_filter_and_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v0.10/endpoint_manager/task_list")
                    .header("authorization", format!("Bearer {TOKEN}"))
                    .query_param("filter_endpoint", "ep-1")
                    .query_param("filter_status", "SUCCEEDED")
                    .query_param("filter_completion_time", "2024-05-01")
                    .query_param("orderby", "completion_time ASC")
                    .query_param("limit", "1000");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "DATA_TYPE": "task_list",
                        "DATA": [
                            {"task_id": "t-1", "completion_time": "2024-05-02T10:00:00+00:00"},
                            {"task_id": "t-2", "completion_time": "2024-05-03T10:00:00+00:00"}
                        ]
                    }));
            })
            .await;

        let client = client_for(&server);
        let tasks = client
            .list_recent_succeeded_tasks("ep-1", &weekly_filter())
            .await
            .expect("task list succeeds");

        mock.assert_async().await;
        assert_eq!(
            tasks,
            vec![
                Task::new("t-1", "2024-05-02T10:00:00+00:00"),
                Task::new("t-2", "2024-05-03T10:00:00+00:00"),
            ]
        );
    }

    #[tokio::test]
    async fn successful_transfers_maps_items() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v0.10/task/t-9/successful_transfers")
                    .query_param("offset", "0");
                then.status(200).json_body(json!({
                    "DATA": [
                        {"source_path": "/home/u/f.txt", "destination_path": "/globus/5/9/data/f.txt"},
                        {"source_path": "/globus/5/9/g.txt", "destination_path": null}
                    ]
                }));
            })
            .await;

        let client = client_for(&server);
        let items = client
            .list_successful_transfer_items("t-9", 0)
            .await
            .expect("transfers succeed");

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].destination_path, "/globus/5/9/data/f.txt");
        assert!(items[1].is_download());
    }

    #[tokio::test]
    async fn error_status_carries_service_code() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v0.10/task/t-404/successful_transfers");
                then.status(404).json_body(json!({
                    "code": "ClientError.NotFound",
                    "message": "Task t-404 not found"
                }));
            })
            .await;

        let client = client_for(&server);
        let err = client
            .successful_transfers("t-404", 0)
            .await
            .expect_err("404 must fail");
        match &err {
            GlobusError::Status {
                operation,
                status,
                code,
                message,
                ..
            } => {
                assert_eq!(*operation, OP_SUCCESSFUL_TRANSFERS);
                assert_eq!(*status, 404);
                assert_eq!(code.as_deref(), Some("ClientError.NotFound"));
                assert_eq!(message.as_deref(), Some("Task t-404 not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("status 404"));
    }

    #[tokio::test]
    async fn non_json_error_body_still_reports_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v0.10/endpoint_manager/task_list");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .task_list("ep-1", &weekly_filter())
            .await
            .expect_err("502 must fail");
        assert_eq!(err.status(), Some(502));
        assert!(matches!(
            err,
            GlobusError::Status { code: None, message: None, .. }
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v0.10/endpoint_manager/task_list");
                then.status(200).body("{\"DATA\": [{\"completion_time\": 5}]}");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .task_list("ep-1", &weekly_filter())
            .await
            .expect_err("decode must fail");
        assert!(matches!(err, GlobusError::Decode { operation: OP_TASK_LIST, .. }));
    }

    #[tokio::test]
    async fn trait_errors_wrap_as_service_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v0.10/endpoint_manager/task_list");
                then.status(401);
            })
            .await;

        let client = client_for(&server);
        let err = client
            .list_recent_succeeded_tasks("ep-1", &weekly_filter())
            .await
            .expect_err("401 must fail");
        assert_eq!(err.operation(), OP_TASK_LIST);
        assert!(matches!(
            err,
            TransferError::Service { ref target, .. } if target == "ep-1"
        ));

        let mut rendered = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }
        assert_eq!(
            rendered,
            "transfer service task_list request failed for ep-1: \
             transfer API task_list returned status 401"
        );
    }

    #[test]
    fn endpoint_joins_without_doubling_slashes() {
        let base = Url::parse("https://transfer.example.org/v0.10/").expect("valid URL");
        let client = GlobusClient::with_client(Client::new(), base, TOKEN);
        let url = client
            .endpoint(&["task", "abc", "successful_transfers"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://transfer.example.org/v0.10/task/abc/successful_transfers"
        );
        assert_eq!(client.base_url().path(), "/v0.10/");

        let bare = Url::parse("https://transfer.example.org/v0.10").expect("valid URL");
        let client = GlobusClient::with_client(Client::new(), bare, TOKEN);
        let url = client.endpoint(&["endpoint_manager", "task_list"]).expect("url");
        assert_eq!(url.path(), "/v0.10/endpoint_manager/task_list");
    }

    #[test]
    fn task_ids_cannot_escape_their_path_segment() {
        let base = Url::parse("https://transfer.example.org/v0.10/").expect("valid URL");
        let client = GlobusClient::with_client(Client::new(), base, TOKEN);
        let url = client
            .endpoint(&["task", "a?b=1/x#y", "successful_transfers"])
            .expect("url");
        assert_eq!(
            url.path(),
            "/v0.10/task/a%3Fb=1%2Fx%23y/successful_transfers"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
