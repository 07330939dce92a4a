//! PostgREST-backed streak counter
//!
//! Reads the `streaks` table and increments through the
//! `handle_streak_increment` RPC. All streak arithmetic lives in that
//! function; the client only relays its result.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{CounterService, FetchOutcome, Identity};
use crate::{error::RemoteError, state::StreakRecord};

const STREAKS_PATH: &str = "rest/v1/streaks";
const INCREMENT_PATH: &str = "rest/v1/rpc/handle_streak_increment";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Zero rows where exactly one was requested
const CODE_NO_ROWS: &str = "PGRST116";
/// Table missing from the schema cache, or missing in the database
const CODES_TABLE_MISSING: [&str; 2] = ["PGRST205", "42P01"];
/// Function missing from the schema cache
const CODE_FUNCTION_MISSING: &str = "PGRST202";

#[derive(Debug, Deserialize)]
struct StreakRow {
    current_streak: u32,
    last_completed_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct IncrementRow {
    new_streak: u32,
    new_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

struct Failure {
    status: StatusCode,
    body: ErrorBody,
}

impl Failure {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Self { status, body }
    }

    fn has_code(&self, codes: &[&str]) -> bool {
        self.body
            .code
            .as_deref()
            .is_some_and(|code| codes.contains(&code))
    }

    fn describe(&self) -> String {
        match &self.body.message {
            Some(message) => format!("HTTP {}: {}", self.status.as_u16(), message),
            None => format!("HTTP {}", self.status.as_u16()),
        }
    }

    fn rejected(&self) -> RemoteError {
        RemoteError::Rejected(self.describe())
    }

    fn unavailable(&self) -> RemoteError {
        RemoteError::Unavailable(self.describe())
    }
}

fn transport_error(context: &str, error: reqwest::Error) -> RemoteError {
    if error.is_decode() {
        RemoteError::Rejected(format!("{}: unexpected response body: {}", context, error))
    } else {
        RemoteError::Unavailable(format!("{}: {}", context, error))
    }
}

/// Streak counter reached over a PostgREST HTTP API
#[derive(Debug, Clone)]
pub struct RestCounterService {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl RestCounterService {
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn authorized(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(identity.token())
    }
}

#[async_trait]
impl CounterService for RestCounterService {
    async fn fetch_streak(&self, identity: &Identity) -> Result<FetchOutcome, RemoteError> {
        let request = self
            .client
            .get(self.endpoint(STREAKS_PATH))
            .query(&[("select", "current_streak,last_completed_date")])
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT);

        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| transport_error("fetching streak", e))?;

        if response.status().is_success() {
            let row: StreakRow = response
                .json()
                .await
                .map_err(|e| transport_error("fetching streak", e))?;
            debug!("Fetched streak row: {:?}", row);
            return Ok(FetchOutcome::Found(StreakRecord::new(
                row.current_streak,
                row.last_completed_date,
            )));
        }

        let failure = Failure::read(response).await;
        if failure.status == StatusCode::NOT_ACCEPTABLE && failure.has_code(&[CODE_NO_ROWS]) {
            debug!("No streak row yet for this user");
            return Ok(FetchOutcome::NotFound);
        }

        warn!("Streak fetch failed: {}", failure.describe());
        if failure.status == StatusCode::NOT_FOUND || failure.has_code(&CODES_TABLE_MISSING) {
            Err(failure.unavailable())
        } else {
            Err(failure.rejected())
        }
    }

    async fn increment_streak(&self, identity: &Identity) -> Result<StreakRecord, RemoteError> {
        let request = self
            .client
            .post(self.endpoint(INCREMENT_PATH))
            .json(&serde_json::json!({}));

        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(|e| transport_error("incrementing streak", e))?;

        if !response.status().is_success() {
            let failure = Failure::read(response).await;
            warn!("Streak increment failed: {}", failure.describe());
            return if failure.status == StatusCode::NOT_FOUND
                || failure.has_code(&[CODE_FUNCTION_MISSING])
            {
                Err(failure.unavailable())
            } else {
                Err(failure.rejected())
            };
        }

        let rows: Vec<IncrementRow> = response
            .json()
            .await
            .map_err(|e| transport_error("incrementing streak", e))?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::Rejected("RPC returned no data".to_string()))?;

        Ok(StreakRecord::new(row.new_streak, row.new_date))
    }

    fn setup_url(&self) -> Option<String> {
        let host = self.base_url.host_str()?;
        let project_ref = host.strip_suffix(".supabase.co")?;
        if project_ref.is_empty() || project_ref.contains('.') {
            return None;
        }
        Some(format!(
            "https://app.supabase.com/project/{}/sql/new",
            project_ref
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn identity() -> Identity {
        Identity::new("user-token").unwrap()
    }

    fn service(url: &str) -> RestCounterService {
        RestCounterService::new(
            Url::parse(url).unwrap(),
            "anon-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_reads_single_row() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/streaks")
            .match_query(Matcher::UrlEncoded(
                "select".into(),
                "current_streak,last_completed_date".into(),
            ))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer user-token")
            .match_header("accept", SINGLE_OBJECT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"current_streak":4,"last_completed_date":"2026-10-13"}"#)
            .create_async()
            .await;

        let outcome = service(&server.url()).fetch_streak(&identity()).await;
        mock.assert_async().await;
        assert_eq!(
            outcome,
            Ok(FetchOutcome::Found(StreakRecord::new(
                4,
                NaiveDate::from_ymd_opt(2026, 10, 13)
            )))
        );
    }

    #[tokio::test]
    async fn fetch_without_row_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/streaks")
            .match_query(Matcher::Any)
            .with_status(406)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#)
            .create_async()
            .await;

        let outcome = service(&server.url()).fetch_streak(&identity()).await;
        assert_eq!(outcome, Ok(FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn fetch_with_missing_table_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/streaks")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"PGRST205","message":"Could not find the table 'public.streaks' in the schema cache"}"#)
            .create_async()
            .await;

        let outcome = service(&server.url()).fetch_streak(&identity()).await;
        assert!(matches!(outcome, Err(RemoteError::Unavailable(_))));
    }

    #[tokio::test]
    async fn fetch_with_bad_token_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/v1/streaks")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"PGRST301","message":"JWT expired"}"#)
            .create_async()
            .await;

        let outcome = service(&server.url()).fetch_streak(&identity()).await;
        assert_eq!(
            outcome,
            Err(RemoteError::Rejected("HTTP 401: JWT expired".to_string()))
        );
    }

    #[tokio::test]
    async fn increment_relays_rpc_result() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rpc/handle_streak_increment")
            .match_header("authorization", "Bearer user-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"new_streak":1,"new_date":"2026-10-14"}]"#)
            .create_async()
            .await;

        let record = service(&server.url()).increment_streak(&identity()).await;
        mock.assert_async().await;
        assert_eq!(
            record,
            Ok(StreakRecord::new(1, NaiveDate::from_ymd_opt(2026, 10, 14)))
        );
    }

    #[tokio::test]
    async fn increment_with_empty_result_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/handle_streak_increment")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let record = service(&server.url()).increment_streak(&identity()).await;
        assert_eq!(
            record,
            Err(RemoteError::Rejected("RPC returned no data".to_string()))
        );
    }

    #[tokio::test]
    async fn increment_with_missing_function_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/handle_streak_increment")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"PGRST202","message":"Could not find the function"}"#)
            .create_async()
            .await;

        let record = service(&server.url()).increment_streak(&identity()).await;
        assert!(matches!(record, Err(RemoteError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let outcome = service("http://127.0.0.1:1").fetch_streak(&identity()).await;
        assert!(matches!(outcome, Err(RemoteError::Unavailable(_))));
    }

    #[test]
    fn setup_url_derives_from_supabase_host() {
        assert_eq!(
            service("https://abcd1234.supabase.co").setup_url().as_deref(),
            Some("https://app.supabase.com/project/abcd1234/sql/new")
        );
        assert_eq!(service("http://localhost:54321").setup_url(), None);
    }
}
