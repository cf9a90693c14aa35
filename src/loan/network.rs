//! The outbound loan request and the transport which carries it.

use super::{Loan, LoanError};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of the `POST` sent for a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub amount: f64,
    /// Days.
    pub period: u32,
    pub total_repayment: f64,
}

impl LoanRequest {
    pub fn from_loan(loan: &Loan, today: NaiveDate) -> Self {
        LoanRequest {
            amount: loan.amount,
            period: loan.duration,
            total_repayment: loan.repayment(today),
        }
    }

    /// Encode as JSON. Values JSON cannot represent are rejected instead
    /// of being written as `null`.
    pub fn encode(&self) -> Result<Vec<u8>, LoanError> {
        if !self.amount.is_finite() || !self.total_repayment.is_finite() {
            return Err(LoanError::SerializationFailure(format!(
                "non-finite value in {:?}",
                self
            )));
        }
        serde_json::to_vec(self).map_err(|e| LoanError::SerializationFailure(e.to_string()))
    }
}

/// Identifier assigned by the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoanId {
    Number(u64),
    Text(String),
}

/// Decoded response of a successful submission. Only `id` is
/// required; the endpoint may echo the request fields back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: LoanId,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub period: Option<u32>,
    #[serde(default)]
    pub total_repayment: Option<f64>,
}

impl LoanResponse {
    pub fn new(id: LoanId) -> Self {
        LoanResponse {
            id,
            amount: None,
            period: None,
            total_repayment: None,
        }
    }

    pub fn decode(body: &[u8]) -> Result<Self, LoanError> {
        serde_json::from_slice(body).map_err(|e| LoanError::DeserializationFailure(e.to_string()))
    }
}

/// Carries an encoded [LoanRequest] to the remote endpoint and returns
/// the raw response body.
///
/// Any failure, including a non-2xx status, is reported as
/// [LoanError::TransportFailure].
#[async_trait]
pub trait LoanTransport: Send + Sync {
    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>, LoanError>;
}

/// [LoanTransport] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LoanError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoanError::TransportFailure(format!("failed to build client: {}", e)))?;

        Ok(HttpTransport {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LoanTransport for HttpTransport {
    async fn post(&self, body: Vec<u8>) -> Result<Vec<u8>, LoanError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| LoanError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoanError::TransportFailure(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LoanError::TransportFailure(format!("failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }
}
