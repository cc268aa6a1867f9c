use anyhow::{anyhow, Context};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Thin JSON client for the admin API.
///
/// Unwraps the `{ success, data }` envelope and turns `success: false`
/// bodies into errors carrying the server's code.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(server).with_context(|| format!("Invalid server URL '{}'", server))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> anyhow::Result<Value> {
        let url = self.base_url.join(path)?;
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {}", method, url);
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body ({})", url, status))?;

        unwrap_envelope(payload)
    }
}

fn unwrap_envelope(payload: Value) -> anyhow::Result<Value> {
    if payload.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(payload.get("data").cloned().unwrap_or(Value::Null));
    }

    let code = payload.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let message = payload
        .get("message")
        .or_else(|| payload.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("request failed");
    Err(anyhow!("{}: {}", code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_unwrapping() {
        let data = unwrap_envelope(json!({ "success": true, "data": { "id": 1 } })).unwrap();
        assert_eq!(data["id"], 1);

        let err = unwrap_envelope(json!({ "success": false, "code": "FORBIDDEN", "message": "Admin access required" }))
            .unwrap_err();
        assert_eq!(err.to_string(), "FORBIDDEN: Admin access required");
    }
}
