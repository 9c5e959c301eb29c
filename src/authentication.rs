use secrecy::{ExposeSecret, Secret};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("authentication request failed")]
    Transport(#[from] reqwest::Error),
    #[error("authentication response carried no usable {0:?} field")]
    MissingTokenField(&'static str),
}

pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

/// Exchange credentials for a session token, once per run.
///
/// The login call goes through its own short-lived client; the token is
/// then handed to the long-lived [`crate::client::ApiClient`]. A response
/// without a non-empty `accessToken` field aborts setup instead of being
/// smuggled downstream as an empty bearer value.
#[tracing::instrument(name = "Requesting session token", skip(credentials))]
pub async fn request_session_token(
    base_url: &str,
    credentials: &Credentials,
) -> Result<Secret<String>, AuthError> {
    let login_client = reqwest::Client::new();
    let body = serde_json::json!({
        "username": credentials.username,
        "password": credentials.password.expose_secret(),
    });
    let response = login_client
        .post(format!("{base_url}/api/User/Authentication"))
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    let payload: serde_json::Value = response.json().await?;
    match payload.get("accessToken").and_then(|token| token.as_str()) {
        Some(token) if !token.is_empty() => Ok(Secret::new(token.to_string())),
        _ => Err(AuthError::MissingTokenField("accessToken")),
    }
}
