use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::CheckoutConfig, CheckoutApiError, CheckoutSession, NewCheckoutSession};

#[derive(Clone)]
pub struct CheckoutApi {
    config: CheckoutConfig,
    client: Arc<Client>,
}

impl CheckoutApi {
    pub fn new(config: CheckoutConfig) -> Result<Self, CheckoutApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, CheckoutApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CheckoutApiError::Timeout(e.to_string())
            } else {
                CheckoutApiError::RestResponseError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| CheckoutApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| CheckoutApiError::RestResponseError(e.to_string()))?;
            Err(CheckoutApiError::QueryError { status, message })
        }
    }

    /// Opens a new checkout session. The gateway responds with the session id and the redirect URL the customer
    /// must visit to complete payment.
    pub async fn create_session(&self, session: &NewCheckoutSession) -> Result<CheckoutSession, CheckoutApiError> {
        debug!("Creating checkout session for {}", session.customer_email);
        self.rest_query(Method::POST, "/v1/checkout/sessions", Some(session)).await
    }

    /// Fetches the current state of a session, including line items and the echoed correlation metadata.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, CheckoutApiError> {
        trace!("Retrieving checkout session {session_id}");
        let path = format!("/v1/checkout/sessions/{session_id}");
        self.rest_query::<CheckoutSession, ()>(Method::GET, &path, None).await.map_err(|e| match e {
            CheckoutApiError::QueryError { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                CheckoutApiError::SessionNotFound(session_id.to_string())
            },
            other => other,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}
