//! Bitcoinabuse, WalletExplorer and Chainabuse clients.

use crate::config::Config;
use crate::error::Error;
use crate::retry;
use crate::retry::BackoffPolicy;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header;
use url::Url;

pub mod bitcoinabuse;
pub mod chainabuse;
pub mod page;
pub mod walletexplorer;

/// Both HTML sites block obvious bots, hence we identify as a regular browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Markers WalletExplorer puts into an otherwise successful page once we exceed its request rate.
const RATE_LIMIT_MARKERS: [&str; 2] = ["Too many requests", "limit"];

struct RequestHandler {
    client: Client,
    backoff: BackoffPolicy,
}

/// Handler for sites which don't need any special error handling
struct GenericResponseHandler;

/// Handler for WalletExplorer, detecting rate limits within page bodies
struct WalletExplorerResponseHandler;

/// Handler for the Chainabuse GraphQL proxy, only accepting JSON bodies
struct ChainabuseResponseHandler;

trait ResponseHandler {
    /// Prepares a GET request by i.e. setting its headers.
    fn prepare(request_handler: &RequestHandler, url: &str) -> RequestBuilder {
        request_handler.client.get(url).header(header::USER_AGENT, BROWSER_USER_AGENT)
    }

    /// Given a response different status codes and bodies are handled.
    fn process(response: Response) -> Result<ResponseHandlerResult, Error>;
}

enum ResponseHandlerResult {
    Ok(String),
    Retry(String),
    RateLimited(&'static str),
}

impl RequestHandler {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(RequestHandler {
            client: Client::builder().timeout(config.request_timeout).build()?,
            backoff: config.backoff,
        })
    }

    /// Sends a GET request once, returning the body or a classified error.
    fn get<T: ResponseHandler>(&self, url: &str) -> Result<String, Error> {
        self.send::<T>(url, T::prepare(self, url))
    }

    fn send<T: ResponseHandler>(&self, url: &str, request: RequestBuilder) -> Result<String, Error> {
        let response = request.send().map_err(|why| Error::HttpRequest(url.to_string(), why))?;

        match T::process(response)? {
            ResponseHandlerResult::Ok(body) => Ok(body),
            ResponseHandlerResult::Retry(why) => Err(Error::HttpRejected(url.to_string(), why)),
            ResponseHandlerResult::RateLimited(marker) => Err(Error::RateLimited(url.to_string(), marker)),
        }
    }

    /// Sends a GET request until it succeeds, backing off on transport errors and rate limits.
    pub fn execute<T: ResponseHandler>(&self, url: &str) -> Result<String, Error> {
        retry::retry(self.backoff, || self.get::<T>(url))
    }

    /// Same as [`RequestHandler::execute`] but POSTing a JSON body.
    pub fn execute_post_json<T: ResponseHandler>(&self, url: &str, body: &serde_json::Value) -> Result<String, Error> {
        retry::retry(self.backoff, || {
            let request = self.client.post(url).header(header::USER_AGENT, BROWSER_USER_AGENT).json(body);
            self.send::<T>(url, request)
        })
    }
}

/// Reads the body, mapping read failures (e.g. a timeout mid-body) to a retryable error.
fn read_body(response: Response) -> Result<String, Error> {
    let url = response.url().to_string();
    response.text().map_err(|why| Error::HttpBody(url, why))
}

/// Returns the `host[:port]` part of an URL, as sent within the `Host` header.
fn host_of(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;

    match url.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

impl ResponseHandler for GenericResponseHandler {
    fn process(response: Response) -> Result<ResponseHandlerResult, Error> {
        match response.status().as_u16() {
            // A missing page is not worth retrying; its body simply won't contain anything to extract
            200..=299 | 404 => Ok(ResponseHandlerResult::Ok(read_body(response)?)),

            status => Ok(ResponseHandlerResult::Retry(status.to_string())),
        }
    }
}

impl ResponseHandler for WalletExplorerResponseHandler {
    fn prepare(request_handler: &RequestHandler, url: &str) -> RequestBuilder {
        let mut request = request_handler.client.get(url);

        if let Some(host) = host_of(url) {
            request = request.header(header::HOST, host);
        }

        request = request.header(header::REFERER, url);
        request = request.header(header::USER_AGENT, BROWSER_USER_AGENT);

        request
    }

    fn process(response: Response) -> Result<ResponseHandlerResult, Error> {
        let status = response.status().as_u16();
        if !(200..=299).contains(&status) && status != 404 {
            return Ok(ResponseHandlerResult::Retry(status.to_string()));
        }

        let body = read_body(response)?;

        // WalletExplorer answers with a 200 status code even when throttling us, hence check the body
        match RATE_LIMIT_MARKERS.iter().copied().find(|marker| body.contains(marker)) {
            Some(marker) => Ok(ResponseHandlerResult::RateLimited(marker)),
            None => Ok(ResponseHandlerResult::Ok(body)),
        }
    }
}

impl ResponseHandler for ChainabuseResponseHandler {
    fn process(response: Response) -> Result<ResponseHandlerResult, Error> {
        let status = response.status().as_u16();
        let body = read_body(response)?;

        // Throttled requests still come with a JSON body (without a `data` field), which the caller handles.
        // Anything that isn't JSON is most likely an error page of the proxy in front of the API.
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(_) => Ok(ResponseHandlerResult::Ok(body)),
            Err(_) => Ok(ResponseHandlerResult::Retry(format!("{status}; result is not JSON"))),
        }
    }
}
