//! GitHub API client construction.

use octocrab::Octocrab;

const PUBLIC_SERVER: &str = "https://github.com";
const PUBLIC_API: &str = "https://api.github.com";

/// Errors from building the API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The base URL was rejected or the client failed to build.
    #[error("failed to create GitHub client for {base}: {source}")]
    Build {
        /// API base URL.
        base: String,
        /// The client error.
        source: octocrab::Error,
    },
}

/// Returns the REST API base URL.
///
/// An explicit `api_url` wins. Otherwise public GitHub maps to
/// `https://api.github.com` and any other server to `{server}/api/v3`.
#[must_use]
pub fn api_base_url(server_url: &str, api_url: Option<&str>) -> String {
    if let Some(api) = api_url.map(str::trim).filter(|s| !s.is_empty()) {
        return api.trim_end_matches('/').to_string();
    }
    let server = server_url.trim().trim_end_matches('/');
    if server == PUBLIC_SERVER {
        PUBLIC_API.to_string()
    } else {
        format!("{server}/api/v3")
    }
}

/// Builds an authenticated client for `base`.
///
/// # Errors
///
/// Returns an error if `base` is not a valid URI or the client fails to build.
pub fn build_client(token: &str, base: &str) -> Result<Octocrab, ClientError> {
    let build_err = |source| ClientError::Build {
        base: base.to_string(),
        source,
    };
    let client = Octocrab::builder()
        .personal_token(token.to_string())
        .base_uri(base)
        .map_err(build_err)?
        .build()
        .map_err(build_err)?;
    tracing::debug!(base, "Created GitHub client");
    Ok(client)
}
