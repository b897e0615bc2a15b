//! Spreadsheet credential retrieval
//!
//! The Google access token lives in AWS Secrets Manager as a JSON secret
//! with an `access_token` field. Token issuance (service-account JWT
//! exchange) happens outside this tool; only retrieval lives here.

use crate::error::{Result, RightsizerError};
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client as SecretsClient;
use tracing::info;

/// Pull the token string out of the secret's JSON payload
pub fn extract_access_token(secret: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(secret)
        .map_err(|e| RightsizerError::Secrets(format!("Secret is not valid JSON: {}", e)))?;
    value
        .get("access_token")
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| RightsizerError::Secrets("Secret missing access_token field".to_string()))
}

/// Fetch the Google access token referenced by `secret_arn`
pub async fn fetch_access_token(secret_arn: &str) -> Result<String> {
    info!("Fetching spreadsheet credentials from Secrets Manager...");
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = SecretsClient::new(&config);

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| RightsizerError::Secrets(format!("get_secret_value failed: {}", e)))?;

    let secret = response
        .secret_string()
        .ok_or_else(|| RightsizerError::Secrets("Secret has no string payload".to_string()))?;

    extract_access_token(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_access_token() {
        let secret = r#"{"access_token": "ya29.token", "expires_in": 3599}"#;
        assert_eq!(extract_access_token(secret).unwrap(), "ya29.token");
    }

    #[test]
    fn test_extract_missing_field() {
        let secret = r#"{"refresh_token": "abc"}"#;
        assert!(extract_access_token(secret).is_err());
    }

    #[test]
    fn test_extract_invalid_json() {
        assert!(extract_access_token("not json").is_err());
    }
}
