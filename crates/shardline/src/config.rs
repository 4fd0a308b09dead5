use std::path::Path;

use anyhow::Context;
use shardline_transfer::{HttpOptions, ProxyConfig};

/// Load `HttpOptions` from an optional TOML file, then apply flag overrides.
pub fn load(
    path: Option<&Path>,
    user_agent: Option<String>,
    proxy: Option<ProxyConfig>,
) -> anyhow::Result<HttpOptions> {
    let mut options = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            HttpOptions::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => HttpOptions::default(),
    };

    let user_agent = user_agent.or(options.user_agent.take());
    options.user_agent = Some(user_agent.unwrap_or_else(|| format!("shardline/{}", env!("CARGO_PKG_VERSION"))));

    if let Some(proxy) = proxy {
        options.proxy = Some(proxy);
    }

    tracing::debug!(?options, "http options loaded");
    Ok(options)
}
