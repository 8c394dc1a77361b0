pub mod documents;
pub mod export;
pub mod notifications;
pub mod work_orders;
pub mod workers;

use base64::Engine;

use crate::errors::ServiceError;

/// Validate a drawn-signature payload: a base64 data URL carrying an image.
///
/// Both signature flows (work orders and documents) accept exactly this
/// shape from the browser signature pad.
pub(crate) fn validate_signature_image(data: &str) -> Result<(), ServiceError> {
    let rest = data
        .strip_prefix("data:image/")
        .ok_or_else(|| ServiceError::ValidationError("Invalid signature image".to_string()))?;

    let payload = rest
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| ServiceError::ValidationError("Invalid signature image".to_string()))?;

    if payload.is_empty()
        || base64::engine::general_purpose::STANDARD
            .decode(payload)
            .is_err()
    {
        return Err(ServiceError::ValidationError(
            "Invalid signature image".to_string(),
        ));
    }

    Ok(())
}
