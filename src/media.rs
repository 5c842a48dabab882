use anyhow::{Result, anyhow};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::Config;

#[derive(Debug, Deserialize)]
pub struct UploadedMedia {
    pub public_id: String,
    pub secure_url: String,
}

/// Signed-upload parameter string: sorted `key=value` pairs joined with `&`,
/// with the API secret appended. The store must be configured for SHA-256
/// signatures.
fn signature_base(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}{}", joined, api_secret)
}

fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature_base(params, api_secret).as_bytes());
    hex::encode(hasher.finalize())
}

/// Forward a buffered upload to the media store and return its handle.
pub async fn upload(config: &Config, bytes: Vec<u8>, filename: &str) -> Result<UploadedMedia> {
    let client = reqwest::Client::new();

    let url = format!(
        "{}/{}/auto/upload",
        config.media_upload_base, config.media_cloud_name
    );

    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = sign(&[("timestamp", &timestamp)], &config.media_api_secret);

    tracing::debug!(filename, "Forwarding upload to media store");

    let form = reqwest::multipart::Form::new()
        .text("api_key", config.media_api_key.clone())
        .text("timestamp", timestamp)
        .text("signature", signature)
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );

    let response = client
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, filename, "Failed to reach media store");
            anyhow!("Failed to reach media store: {}", e)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body, filename, "Media store returned error");
        return Err(anyhow!("Media store error: {} - {}", status, body));
    }

    let uploaded: UploadedMedia = response.json().await.map_err(|e| {
        tracing::error!(error = %e, filename, "Failed to parse media store response");
        anyhow!("Failed to parse media store response: {}", e)
    })?;

    tracing::debug!(public_id = %uploaded.public_id, "Upload stored");

    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_base_sorts_params_and_appends_secret() {
        let base = signature_base(&[("timestamp", "100"), ("folder", "photos")], "shh");
        assert_eq!(base, "folder=photos&timestamp=100shh");
    }

    #[test]
    fn sign_produces_hex_sha256() {
        let sig = sign(&[("timestamp", "100")], "shh");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_input_same_signature() {
        let a = sign(&[("timestamp", "100")], "shh");
        let b = sign(&[("timestamp", "100")], "shh");
        assert_eq!(a, b);
        let c = sign(&[("timestamp", "101")], "shh");
        assert_ne!(a, c);
    }
}
