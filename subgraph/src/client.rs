//! GraphQL-over-HTTP client with cursor pagination.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SubgraphError;

/// Default timeout for a single query.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Rows per page for list queries.
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

/// Sends `POST {"query": ...}` to one GraphQL endpoint.
#[derive(Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// The standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphResponse<T> {
    pub(crate) fn into_data(self) -> Result<T, SubgraphError> {
        if !self.errors.is_empty() {
            let messages: Vec<_> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(SubgraphError::GraphQl(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| SubgraphError::InvalidResponse("response carries no data".into()))
    }
}

impl GraphClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `query` and deserialize its `data` member.
    pub async fn query<T: DeserializeOwned>(&self, query: &str) -> Result<T, SubgraphError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&QueryBody { query })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubgraphError::RequestFailed(format!(
                "HTTP status {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let envelope: GraphResponse<T> = response.json().await.map_err(|e| {
            SubgraphError::InvalidResponse(format!("failed to parse query response: {e}"))
        })?;
        envelope.into_data()
    }
}

/// A row that can resume a paginated query.
pub trait Cursor {
    fn cursor(&self) -> &str;
}

/// Fetch pages with `id_gt: <cursor>` until a page shorter than
/// `page_size` comes back.
///
/// The first page is requested with an empty cursor.
pub async fn paginate<T, F, Fut>(page_size: usize, mut fetch: F) -> Result<Vec<T>, SubgraphError>
where
    T: Cursor,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<T>, SubgraphError>>,
{
    let mut rows = Vec::new();
    let mut cursor = String::new();
    loop {
        let page = fetch(cursor.clone()).await?;
        let full = page.len() >= page_size;
        let next = page.last().map(|row| row.cursor().to_string());
        rows.extend(page);

        match next {
            Some(next) if full => {
                if next <= cursor {
                    return Err(SubgraphError::InvalidResponse(format!(
                        "pagination cursor did not advance past {cursor}"
                    )));
                }
                cursor = next;
            }
            _ => return Ok(rows),
        }
    }
}

/// Render a list of ids as a GraphQL string array.
pub(crate) fn id_list<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<_> = ids.into_iter().map(|id| format!("\"{id}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize)]
    struct Blocks {
        blocks: Vec<serde_json::Value>,
    }

    #[test]
    fn envelope_with_data() {
        let json = r#"{"data": {"blocks": [{"number": "12"}]}}"#;
        let env: GraphResponse<Blocks> = serde_json::from_str(json).unwrap();
        assert_eq!(env.into_data().unwrap().blocks.len(), 1);
    }

    #[test]
    fn envelope_errors_win_over_data() {
        let json = r#"{"data": null, "errors": [{"message": "indexing_error"}, {"message": "bad block"}]}"#;
        let env: GraphResponse<Blocks> = serde_json::from_str(json).unwrap();
        match env.into_data() {
            Err(SubgraphError::GraphQl(msg)) => assert_eq!(msg, "indexing_error; bad block"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn envelope_without_data_is_invalid() {
        let env: GraphResponse<Blocks> = serde_json::from_str("{}").unwrap();
        assert!(matches!(env.into_data(), Err(SubgraphError::InvalidResponse(_))));
    }

    #[test]
    fn id_list_quotes_every_id() {
        assert_eq!(id_list(["0xa", "0xb"]), r#"["0xa", "0xb"]"#);
        assert_eq!(id_list(Vec::<&str>::new()), "[]");
    }

    #[derive(Debug)]
    struct Row(String);

    impl Cursor for Row {
        fn cursor(&self) -> &str {
            &self.0
        }
    }

    #[tokio::test]
    async fn paginate_follows_cursor_until_short_page() {
        let all: Vec<String> = (0..7).map(|i| format!("id{i}")).collect();
        let seen = Mutex::new(Vec::new());
        let rows = paginate(3, |cursor: String| {
            seen.lock().unwrap().push(cursor.clone());
            let page: Vec<Row> = all
                .iter()
                .filter(|id| cursor.is_empty() || id.as_str() > cursor.as_str())
                .take(3)
                .map(|id| Row(id.clone()))
                .collect();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(rows.len(), 7);
        assert_eq!(*seen.lock().unwrap(), vec!["", "id2", "id5"]);
    }

    #[tokio::test]
    async fn paginate_rejects_stuck_cursor() {
        let err = paginate(1, |_cursor: String| async { Ok(vec![Row(String::new())]) })
            .await
            .unwrap_err();
        assert!(matches!(err, SubgraphError::InvalidResponse(_)));
    }
}
