// 🔢 Field Coercers
// Raw CSV text → optional typed values. Every function here is total:
// malformed upstream data becomes None, it never aborts ingestion.

/// Trim, reject empty, then peel one layer of surrounding double quotes
fn unquote(value: Option<&str>) -> Option<&str> {
    let v = value?.trim();
    if v.is_empty() {
        return None;
    }

    let inner = if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        &v[1..v.len() - 1]
    } else if v == "\"" {
        ""
    } else {
        v
    };

    Some(inner.trim())
}

/// Parse an integer, None on empty or non-numeric input
pub fn to_int(value: Option<&str>) -> Option<i64> {
    unquote(value)?.parse::<i64>().ok()
}

/// Parse a float; a leading `.` is read as `0.` so `.125` → 0.125
pub fn to_float(value: Option<&str>) -> Option<f64> {
    let v = unquote(value)?;
    if v.is_empty() {
        return None;
    }

    if v.starts_with('.') {
        format!("0{}", v).parse::<f64>().ok()
    } else {
        v.parse::<f64>().ok()
    }
}

/// Trimmed text, None when nothing is left
pub fn to_text(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

// ============================================================================
// SERDE ADAPTERS
// ============================================================================

/// `deserialize_with` hooks so the record loader can route CSV columns
/// through the coercers instead of serde's strict parsing.
pub mod de {
    use serde::{Deserialize, Deserializer};

    pub fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(super::to_int(raw.as_deref()))
    }

    pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(super::to_float(raw.as_deref()))
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(super::to_text(raw.as_deref()))
    }
}
