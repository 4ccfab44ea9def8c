//! Server-side cached content management.
//!
//! A cached content holds a large, reusable prompt prefix on the service side.
//! Runs can reference one by name (`cachedContents/<id>`) so every task
//! request reuses it instead of resending the text.
//!
//! Operations map onto the `cachedContents` collection:
//!
//! | Operation    | Method | Path                          |
//! |--------------|--------|-------------------------------|
//! | list         | GET    | `cachedContents`              |
//! | get          | GET    | `cachedContents/{id}`         |
//! | create       | POST   | `cachedContents`              |
//! | update TTL   | PATCH  | `cachedContents/{id}?updateMask=ttl` |
//! | delete       | DELETE | `cachedContents/{id}`         |

use super::gemini::Content;
use super::{GeminiClient, GenerationError, model_path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached content resource as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedContent {
    /// Resource name, `cachedContents/<id>`.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub model: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub expire_time: Option<DateTime<Utc>>,
    pub usage_metadata: Option<CacheUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheUsage {
    pub total_token_count: Option<u64>,
}

impl CachedContent {
    pub fn total_tokens(&self) -> Option<u64> {
        self.usage_metadata
            .as_ref()
            .and_then(|usage| usage.total_token_count)
    }
}

/// Parameters for creating a cached content.
#[derive(Debug, Clone)]
pub struct CreateCache {
    pub display_name: String,
    pub model: String,
    /// Text stored in the cache as a single user turn.
    pub contents: String,
    pub system_instruction: Option<String>,
    pub ttl: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCacheBody {
    model: String,
    display_name: String,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    ttl: String,
}

#[derive(Serialize)]
struct UpdateTtlBody {
    ttl: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListCachesResponse {
    #[serde(default)]
    cached_contents: Vec<CachedContent>,
    next_page_token: Option<String>,
}

/// Normalize a cache id or name to its resource path.
pub fn cache_path(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("cachedContents/") {
        name.to_string()
    } else {
        format!("cachedContents/{}", name)
    }
}

/// Format a duration as the service's TTL string (`"3600s"`).
pub fn format_ttl(ttl: Duration) -> String {
    format!("{}s", ttl.as_secs())
}

/// Parse a human TTL such as `90`, `90s`, `45m`, `2h`, `1d`, or `1h30m`.
///
/// A bare number is seconds.
pub fn parse_ttl(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("TTL must not be empty".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for ch in input.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return Err(format!("invalid TTL '{}': unknown unit '{}'", input, ch)),
        };
        if digits.is_empty() {
            return Err(format!("invalid TTL '{}': missing number before '{}'", input, ch));
        }
        let too_large = || format!("invalid TTL '{}': too large", input);
        let value: u64 = digits.parse().map_err(|_| too_large())?;
        total = value
            .checked_mul(unit)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(too_large)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(format!("invalid TTL '{}': trailing number without unit", input));
    }
    Ok(Duration::from_secs(total))
}

/// Time left until `expire_time`, formatted as `1d 2h 3m 4s`, or `expired`.
pub fn remaining(expire_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (expire_time - now).num_seconds();
    if secs <= 0 {
        return "expired".to_string();
    }

    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, seconds) = (rem / 60, rem % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

impl GeminiClient {
    /// List all cached contents, following pagination.
    pub fn list_caches(&self) -> Result<Vec<CachedContent>, GenerationError> {
        let mut caches = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.get("cachedContents");
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListCachesResponse = self.send_json(request)?;
            caches.extend(page.cached_contents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(caches)
    }

    pub fn get_cache(&self, name: &str) -> Result<CachedContent, GenerationError> {
        self.send_json(self.get(&cache_path(name)))
    }

    pub fn create_cache(&self, params: &CreateCache) -> Result<CachedContent, GenerationError> {
        let body = CreateCacheBody {
            model: model_path(&params.model),
            display_name: params.display_name.clone(),
            contents: vec![Content::user_text(&params.contents)],
            system_instruction: params.system_instruction.as_deref().map(|text| {
                let mut content = Content::user_text(text);
                content.role = None;
                content
            }),
            ttl: format_ttl(params.ttl),
        };
        self.send_json(self.post("cachedContents").json(&body))
    }

    pub fn update_cache_ttl(
        &self,
        name: &str,
        ttl: Duration,
    ) -> Result<CachedContent, GenerationError> {
        let request = self
            .patch(&cache_path(name))
            .query(&[("updateMask", "ttl")])
            .json(&UpdateTtlBody {
                ttl: format_ttl(ttl),
            });
        self.send_json(request)
    }

    pub fn delete_cache(&self, name: &str) -> Result<(), GenerationError> {
        self.send_empty(self.delete(&cache_path(name)))
    }
}
