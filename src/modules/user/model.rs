use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const SIGNATURE_MAX_CHARS: usize = 160;

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSignatureModel {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "Signature cannot be empty."))]
    pub signature: String,
}

#[derive(Serialize)]
pub struct SignatureResponse {
    pub signature: String,
}

/// Trims and caps a signature; `None` when nothing is left.
pub fn normalize_signature(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(SIGNATURE_MAX_CHARS).collect())
}
