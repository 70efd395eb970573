use serde::Deserialize;
use serde_json::Value;

use crate::error::SearchError;

/// A single user item from the search results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    /// `"User"` or `"Organization"`.
    #[serde(rename = "type")]
    pub account_type: String,
}

/// One page of the Search Users API, reduced to the fields the UI uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub items: Vec<User>,
    /// Server-side count of all matches; may exceed `items.len()`.
    pub total_count: u64,
}

impl SearchResult {
    /// Normalizes a raw `/search/users` payload.
    ///
    /// `total_count` must be a non-negative integer. A missing or `null`
    /// `items` becomes an empty list. Any other field is dropped.
    pub fn from_payload(payload: Value) -> Result<Self, SearchError> {
        let total_count = payload
            .get("total_count")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                SearchError::MalformedResponse(
                    "total_count is missing or not a non-negative integer".to_string(),
                )
            })?;

        let items = match payload.get("items") {
            None | Some(Value::Null) => Vec::new(),
            Some(items) => serde_json::from_value::<Vec<User>>(items.clone())
                .map_err(|e| SearchError::MalformedResponse(format!("invalid items: {e}")))?,
        };

        Ok(Self { items, total_count })
    }
}
