//! Reflection parsing from model responses.

use super::entities::Reflection;
use crate::core::error::DomainError;
use crate::core::string::extract_json_object;

/// Parse a [`Reflection`] out of model response text.
///
/// `success` and a recognised `nextAction` are mandatory; everything else
/// falls back to defaults. Additional steps are numbered when merged into
/// the plan, not here.
pub fn parse_reflection(response: &str) -> Result<Reflection, DomainError> {
    let json =
        extract_json_object(response, &["reflection"]).ok_or(DomainError::NoJsonFound)?;
    let mut reflection: Reflection =
        serde_json::from_str(json).map_err(|e| DomainError::InvalidReflection(e.to_string()))?;
    reflection.clamp_confidence();
    Ok(reflection)
}
