use serde::{Deserialize, Serialize};

use crate::label::StyleConfig;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct OverlayRequest {
    pub(crate) api_key: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) css: Option<StyleConfig>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<String>,
}
