use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;
use crate::errors::{malformed, Error, Result};

pub(crate) fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(user_agent.to_owned())
        .timeout(timeout)
        .build()
        .map_err(|e| Error::InvalidConfig {
            msg: format!("unable to set up HTTP client: {}", e),
        })
}

/// A JSON-over-HTTP client for one external service. Requests are issued
/// once; retrying is left to the caller.
pub(crate) struct JsonClient {
    client: Client,
    service: &'static str,
}

impl JsonClient {
    pub(crate) fn new(service: &'static str, config: &HttpConfig) -> Result<Self> {
        Ok(JsonClient {
            client: build_client(config.timeout(), &config.user_agent)?,
            service,
        })
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {} {:?} ({})", url, query, self.service);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| transport_error(self.service, &e))?;
        let response = check_status(self.service, response)?;
        response
            .json()
            .map_err(|e| malformed(self.service, e.to_string()))
    }

    /// Like `get`, but client errors (4xx) that come with a JSON body are handed
    /// to the caller, as some services report missing data this way.
    pub(crate) fn get_reporting(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        debug!("GET {} {:?} ({})", url, query, self.service);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| transport_error(self.service, &e))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .map_err(|e| malformed(self.service, e.to_string()));
        }
        let body = response.text().unwrap_or_default();
        match serde_json::from_str(&body) {
            Ok(value) if status.is_client_error() => Ok(value),
            _ => Err(Error::UpstreamStatus {
                service: self.service.to_owned(),
                status: status.as_u16(),
                msg: body,
            }),
        }
    }
}

pub(crate) fn transport_error(service: &str, e: &reqwest::Error) -> Error {
    let msg = if e.is_timeout() {
        format!("request timed out ({})", e)
    } else {
        e.to_string()
    };
    Error::UpstreamUnavailable {
        service: service.to_owned(),
        msg,
    }
}

fn check_status(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let msg = response.text().unwrap_or_default();
        Err(Error::UpstreamStatus {
            service: service.to_owned(),
            status: status.as_u16(),
            msg,
        })
    }
}
