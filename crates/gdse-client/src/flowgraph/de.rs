//! Tolerant field decoders for records coming straight off the REST API.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A number or a numeric string, as Django REST framework renders decimals.
/// Anything else reads as absent.
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

pub(crate) fn fraction<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(amount(deserializer)?.unwrap_or(0.0))
}

/// Only a literal `true` counts; `null` and missing read as `false`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(
        Option::<Value>::deserialize(deserializer)?,
        Some(Value::Bool(true))
    ))
}

pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "super::amount")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "super::flag")]
        waste: bool,
    }

    fn row(value: serde_json::Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decimal_strings_read_as_numbers() {
        assert_eq!(row(json!({"amount": "10.50"})).amount, Some(10.5));
        assert_eq!(row(json!({"amount": 3})).amount, Some(3.0));
        assert_eq!(row(json!({"amount": "n/a"})).amount, None);
        assert_eq!(row(json!({"amount": null})).amount, None);
        assert_eq!(row(json!({})).amount, None);
    }

    #[test]
    fn null_waste_is_product() {
        assert!(!row(json!({"waste": null})).waste);
        assert!(!row(json!({})).waste);
        assert!(row(json!({"waste": true})).waste);
    }
}
