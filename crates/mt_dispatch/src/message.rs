use crate::dispatcher::DispatchError;

pub const USAGE: &str = "Usage: /translate <mihaaru article URL>";

/// Publishable text: optional headline, body, optional source footer.
pub fn compose(title: Option<&str>, body: &str, source_url: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        parts.push(title.to_string());
    }
    parts.push(body.trim().to_string());
    if let Some(url) = source_url {
        parts.push(format!("Original article: {}", url));
    }
    parts.join("\n\n")
}

pub fn acknowledgement(url: &str) -> String {
    format!("Processing manual translation for: {}...", url)
}

pub fn failure_notice(url: &str, error: &DispatchError) -> String {
    format!(
        "Could not translate {} (failed while {}): {}",
        url,
        error.stage().verb(),
        error
    )
}
