//! Records kept by the template, document and image stores.
//!
//! Timestamps are Unix milliseconds so the JSON files stay readable by other tools.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Reserved id prefix of the built-in templates.
pub const BUILTIN_TEMPLATE_PREFIX: &str = "builtin-";
pub const CUSTOM_TEMPLATE_PREFIX: &str = "template-";
pub const DOCUMENT_PREFIX: &str = "doc-";
pub const IMAGE_PREFIX: &str = "img-";

pub const MAX_CUSTOM_TEMPLATES: usize = 3;
pub const MAX_DOCUMENTS: usize = 5;
pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;
pub const MAX_TOTAL_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub css: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Template {
    pub fn is_builtin(&self) -> bool {
        is_builtin_template_id(&self.id)
    }
}

pub fn is_builtin_template_id(id: &str) -> bool {
    id.starts_with(BUILTIN_TEMPLATE_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub selected_template_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub id: String,
    pub name: String,
    /// Base64 payload without the `data:` prefix.
    pub data: String,
    /// Decoded size in bytes.
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub created_at: i64,
}

impl StoredImage {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Current time in Unix milliseconds.
pub fn timestamp_now() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
