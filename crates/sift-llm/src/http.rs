use std::time::Duration;

/// Client shared by the hosted providers.
///
/// Only connecting is bounded here. Completions arrive as long-lived streams,
/// so each pipeline stage applies its own deadline instead.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(concat!("sift/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("reqwest client with static settings")
}
