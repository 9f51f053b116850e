use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::issue::IssueId;

/// One report record as the backend sends it. Every field except `id` is
/// optional and accepted in whatever loose shape the backend has been seen
/// to emit; normalization happens in [`crate::transform`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    #[serde(deserialize_with = "lenient::id")]
    pub id: IssueId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::category")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub priority: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, alias = "resolvedAt", deserialize_with = "lenient::text")]
    pub resolved_at: Option<String>,
    #[serde(default, alias = "lat", deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "address", deserialize_with = "lenient::text")]
    pub location_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::citizen")]
    pub citizen: Option<RawCitizen>,
    #[serde(default, alias = "imageUrl", deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub images: Option<u32>,
    #[serde(default, alias = "assignedTo", deserialize_with = "lenient::text")]
    pub assigned_to: Option<String>,
    #[serde(default, alias = "workProof", deserialize_with = "lenient::work_proof")]
    pub work_proof: Option<RawWorkProof>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCitizen {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawWorkProof {
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub submitted_by: Option<String>,
}

impl RawReport {
    /// A report with only an id, handy for building fixtures.
    pub fn with_id(id: impl Into<IssueId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            category: None,
            status: None,
            priority: None,
            created_at: None,
            resolved_at: None,
            latitude: None,
            longitude: None,
            location_address: None,
            citizen: None,
            image_url: None,
            images: None,
            assigned_to: None,
            work_proof: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

mod lenient {
    use super::{Deserialize, Deserializer, IssueId, RawCitizen, RawWorkProof, Value};

    pub(super) fn value_text(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_owned())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn value_number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    pub(super) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<IssueId, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(IssueId::Number(i)),
                None => Ok(IssueId::Text(n.to_string())),
            },
            Value::String(s) if !s.trim().is_empty() => Ok(IssueId::from(s.as_str())),
            other => Err(serde::de::Error::custom(format!(
                "report id must be a number or non-empty string, got {other}"
            ))),
        }
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_text(&Value::deserialize(d)?))
    }

    pub(super) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(value_number(&Value::deserialize(d)?))
    }

    /// `{"name": ...}`, a bare string, or null.
    pub(super) fn category<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match &v {
            Value::Object(map) => map.get("name").and_then(value_text),
            other => value_text(other),
        })
    }

    /// A count, or an array whose length is the count.
    pub(super) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => u32::try_from(items.len()).ok(),
            other => value_number(&other)
                .filter(|f| *f >= 0.0)
                .map(|f| f.min(f64::from(u32::MAX)) as u32),
        })
    }

    pub(super) fn citizen<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<RawCitizen>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(RawCitizen {
                name: map.get("name").and_then(value_text),
                phone: map
                    .get("phone")
                    .or_else(|| map.get("phone_number"))
                    .and_then(value_text),
            }),
            _ => None,
        })
    }

    pub(super) fn work_proof<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<RawWorkProof>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(RawWorkProof {
                summary: map
                    .get("summary")
                    .or_else(|| map.get("notes"))
                    .and_then(value_text),
                image_url: map
                    .get("image_url")
                    .or_else(|| map.get("imageUrl"))
                    .and_then(value_text),
                submitted_by: map
                    .get("submitted_by")
                    .or_else(|| map.get("submittedBy"))
                    .and_then(value_text),
            }),
            Value::String(s) if !s.trim().is_empty() => Some(RawWorkProof {
                summary: Some(s),
                ..RawWorkProof::default()
            }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_string_coordinates() {
        let raw: RawReport = serde_json::from_value(json!({
            "id": 3,
            "latitude": "18.52",
            "longitude": 73.85,
        }))
        .unwrap();
        assert_eq!(raw.latitude, Some(18.52));
        assert_eq!(raw.longitude, Some(73.85));
    }

    #[test]
    fn unparsable_coordinates_become_none() {
        let raw: RawReport =
            serde_json::from_value(json!({"id": 3, "latitude": "north", "longitude": null}))
                .unwrap();
        assert_eq!(raw.latitude, None);
        assert_eq!(raw.longitude, None);
    }

    #[test]
    fn category_object_or_string() {
        let a: RawReport =
            serde_json::from_value(json!({"id": 1, "category": {"name": "Garbage"}})).unwrap();
        let b: RawReport = serde_json::from_value(json!({"id": 1, "category": "Roads"})).unwrap();
        let c: RawReport = serde_json::from_value(json!({"id": 1, "category": null})).unwrap();
        assert_eq!(a.category.as_deref(), Some("Garbage"));
        assert_eq!(b.category.as_deref(), Some("Roads"));
        assert_eq!(c.category, None);
    }

    #[test]
    fn images_array_counts_entries() {
        let raw: RawReport =
            serde_json::from_value(json!({"id": "r1", "images": ["a.jpg", "b.jpg"]})).unwrap();
        assert_eq!(raw.images, Some(2));
        assert_eq!(raw.id, IssueId::Text("r1".to_owned()));
    }

    #[test]
    fn integer_string_id_becomes_a_number() {
        let raw: RawReport = serde_json::from_value(json!({"id": "5"})).unwrap();
        assert_eq!(raw.id, IssueId::Number(5));
    }

    #[test]
    fn missing_id_is_rejected() {
        let res = serde_json::from_value::<RawReport>(json!({"description": "no id"}));
        assert!(res.is_err());
    }

    #[test]
    fn object_id_is_rejected() {
        let res = serde_json::from_value::<RawReport>(json!({"id": {"oid": 1}}));
        assert!(res.is_err());
    }

    #[test]
    fn citizen_fields_optional() {
        let raw: RawReport =
            serde_json::from_value(json!({"id": 1, "citizen": {"name": "Meera"}})).unwrap();
        let citizen = raw.citizen.unwrap();
        assert_eq!(citizen.name.as_deref(), Some("Meera"));
        assert_eq!(citizen.phone, None);
    }
}
