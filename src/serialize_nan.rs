//! serde `with` module storing a not-a-number `f64` as JSON `null`
//!
//! serde_json writes NaN as `null` but refuses to read `null` back into an
//! `f64`; undefined day averages must survive a trip through the snapshot cache.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serializes NaN (and infinities) as `None`, everything else as `Some(value)`
pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let value = if value.is_finite() { Some(*value) } else { None };
    value.serialize(serializer)
}

/// Reads `null` back as NaN
pub fn deserialize<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: f64,
    }

    #[test]
    fn test_nan_written_as_null() {
        let json = serde_json::to_string(&Wrapper { value: f64::NAN }).unwrap();
        assert_eq!(json, r#"{"value":null}"#);
    }

    #[test]
    fn test_null_read_as_nan() {
        let wrapper: Wrapper = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert!(wrapper.value.is_nan());
    }

    #[test]
    fn test_finite_value_kept() {
        let json = serde_json::to_string(&Wrapper { value: 42.5 }).unwrap();
        let wrapper: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(wrapper.value, 42.5);
    }
}
