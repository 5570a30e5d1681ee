use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::error::Result;

pub fn validate<T: Validate>(val: &T) -> std::result::Result<(), validator::ValidationErrors> {
    val.validate()
}

/// Deserializes one JSON entry and checks its declared invariants.
pub fn decode_validated<T>(value: JsonValue) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let decoded: T = serde_json::from_value(value)?;
    validate(&decoded)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::opportunity::Opportunity;
    use serde_json::json;

    #[test]
    fn distinguishes_shape_and_invariant_failures() {
        let missing_fields = json!({ "title": "Only a title" });
        assert!(matches!(
            decode_validated::<Opportunity>(missing_fields),
            Err(Error::Json(_))
        ));

        let bad_link = json!({
            "title": "Grant",
            "company": "Fund",
            "payment": { "currency": "USD", "total": 2000 },
            "tags": ["Music"],
            "deliverables": ["Demo"],
            "link": "apply on our website"
        });
        assert!(matches!(
            decode_validated::<Opportunity>(bad_link),
            Err(Error::Validation(_))
        ));
    }
}
