use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateShortLinkRequest {
    pub url: String,
    /// Omitted means the link never expires.
    #[serde(default)]
    pub expiration_in_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortLinkResponse {
    pub short_link: String,
}

#[derive(Debug, Deserialize)]
pub struct ShortLinkInfoQuery {
    #[serde(rename = "shortLink", default)]
    pub short_link: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
