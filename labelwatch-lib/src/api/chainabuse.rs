//! Client for the <https://www.chainabuse.com/> GraphQL proxy.
//!
//! Reports are paged with an opaque cursor, [`CHAINABUSE_PAGE_SIZE`] reports at a time (the maximum the proxy
//! accepts), ordered by their creation date such that new reports always end up on the last page.

use crate::config::Config;
use crate::error::Error;
use serde::Deserialize;
use serde_json::json;

use super::ChainabuseResponseHandler;
use super::RequestHandler;

pub const CHAINABUSE_GRAPHQL_URL: &str = "https://www.chainabuse.com/api/graphql-proxy";

pub const CHAINABUSE_PAGE_SIZE: usize = 50;

const GET_REPORTS_QUERY: &str = r#"query GetReports($input: ReportsInput, $after: String, $before: String, $last: Float, $first: Float) {
  reports(input: $input, after: $after, before: $before, last: $last, first: $first) {
    pageInfo { hasNextPage hasPreviousPage startCursor endCursor __typename }
    edges { cursor node { ...Report __typename } __typename }
    count
    totalCount
    __typename
  }
}

fragment Report on Report {
  id
  isPrivate
  createdAt
  scamCategory
  categoryDescription
  biDirectionalVoteCount
  viewerDidVote
  description
  lexicalSerializedDescription
  commentsCount
  source
  checked
  accusedScammers { id info { id contact type __typename } __typename }
  reportedBy { id username trusted __typename }
  addresses { id address chain domain label __typename }
  evidences { id description photo { id name description url __typename } __typename }
  compromiseIndicators { id type value __typename }
  tokens { id tokenId __typename }
  transactionHashes { id hash chain label __typename }
  __typename
}
"#;

pub struct ChainabuseClient {
    request_handler: RequestHandler,
    url: String,
}

/// Outcome of a single `GetReports` request.
#[derive(Debug)]
pub enum ReportsResponse {
    /// No `data` at all, which is what the proxy returns once we send too many requests.
    Throttled(serde_json::Value),

    /// `data` is present but without any `reports`.
    MissingReports(serde_json::Value),

    Page(ReportsPage),
}

#[derive(Debug, Default)]
pub struct ReportsPage {
    /// Raw report edges, each holding the report within its `node` field.
    pub edges: Vec<serde_json::Value>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
}

#[derive(Deserialize)]
struct GraphqlData {
    reports: Option<GraphqlReports>,
}

#[derive(Deserialize)]
struct GraphqlReports {
    #[serde(rename = "pageInfo")]
    page_info: Option<PageInfo>,

    #[serde(default)]
    edges: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,

    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

impl ChainabuseClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        ChainabuseClient::with_url(config, CHAINABUSE_GRAPHQL_URL)
    }

    pub fn with_url(config: &Config, url: &str) -> Result<Self, Error> {
        Ok(ChainabuseClient {
            request_handler: RequestHandler::new(config)?,
            url: url.to_string(),
        })
    }

    /// Returns the next [`CHAINABUSE_PAGE_SIZE`] reports following `cursor` (exclusive), or the very first
    /// reports if no cursor is given.
    pub fn reports_after(&self, cursor: Option<&str>) -> Result<ReportsResponse, Error> {
        let content = self.request_handler.execute_post_json::<ChainabuseResponseHandler>(&self.url, &request_body(cursor))?;
        parse_reports_response(&content)
    }
}

fn request_body(cursor: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "operationName": "GetReports",
        "variables": {
            "input": {
                "chains": [],
                "scamCategories": [],
                "orderBy": { "field": "CREATED_AT", "direction": "ASC" },
            },
            "first": CHAINABUSE_PAGE_SIZE,
        },
        "query": GET_REPORTS_QUERY,
    });

    if let Some(cursor) = cursor {
        body["variables"]["after"] = json!(cursor);
    }

    body
}

fn parse_reports_response(content: &str) -> Result<ReportsResponse, Error> {
    let raw: serde_json::Value = serde_json::from_str(content)?;
    let response: GraphqlResponse = serde_json::from_value(raw.clone())?;

    let reports = match response.data {
        None => return Ok(ReportsResponse::Throttled(raw)),
        Some(GraphqlData { reports: None }) => return Ok(ReportsResponse::MissingReports(raw)),
        Some(GraphqlData { reports: Some(reports) }) => reports,
    };

    // Without page info there is no way to tell whether more reports follow, hence treat it as the end
    let (end_cursor, has_next_page) = match reports.page_info {
        Some(page_info) => (page_info.end_cursor, page_info.has_next_page),
        None => (None, false),
    };

    Ok(ReportsResponse::Page(ReportsPage {
        edges: reports.edges,
        end_cursor,
        has_next_page,
    }))
}

/// Returns the id of a report edge, i.e. `edge.node.id`.
pub fn report_id(edge: &serde_json::Value) -> Option<&str> {
    edge.get("node")?.get("id")?.as_str()
}
