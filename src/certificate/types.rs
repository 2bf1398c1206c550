//! Certificate record and issuance request types.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// One issued certificate as persisted in the store.
///
/// Fields absent from a stored object read as empty text and are left out
/// again when the record is echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Lookup key. Not guaranteed unique.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Holder name.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Year of award.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub year: String,
    /// Degree title.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub degree: String,
    /// Honours classification.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub hons: String,
    /// Grade.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "String::is_empty")]
    pub grade: String,
    /// Web path of the generated QR image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,
}

/// A loosely-typed JSON field value.
///
/// Request bodies and older store files may carry numbers, booleans or
/// nested values where text is expected.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON string.
    Text(String),
    /// JSON number.
    Number(serde_json::Number),
    /// Anything else (null, bool, array, object).
    Other(serde_json::Value),
}

impl FieldValue {
    /// Text form of the value if it counts as present.
    ///
    /// Presence follows JavaScript truthiness: `""`, `0`, `false` and `null`
    /// are missing, everything else is present. Arrays and objects keep
    /// their JSON text.
    pub fn into_present_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) if !s.is_empty() => Some(s),
            FieldValue::Number(n) if !is_zero(&n) => Some(n.to_string()),
            FieldValue::Other(serde_json::Value::Bool(true)) => Some("true".to_string()),
            FieldValue::Other(v @ (serde_json::Value::Array(_) | serde_json::Value::Object(_))) => {
                Some(v.to_string())
            }
            _ => None,
        }
    }

    fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Other(serde_json::Value::Null) => String::new(),
            FieldValue::Other(v) => v.to_string(),
        }
    }
}

fn is_zero(n: &serde_json::Number) -> bool {
    n.as_f64().map(|f| f == 0.0).unwrap_or(false)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(FieldValue::deserialize(deserializer)?.into_text())
}

/// Fields every certificate must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RequiredField {
    /// Certificate code.
    Code,
    /// Holder name.
    Name,
    /// Year of award.
    Year,
    /// Degree title.
    Degree,
    /// Honours classification.
    Hons,
    /// Grade.
    Grade,
}

/// Body of `POST /add-certificate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCertificate {
    /// Certificate code.
    #[serde(default)]
    pub code: Option<FieldValue>,
    /// Holder name.
    #[serde(default)]
    pub name: Option<FieldValue>,
    /// Year of award.
    #[serde(default)]
    pub year: Option<FieldValue>,
    /// Degree title.
    #[serde(default)]
    pub degree: Option<FieldValue>,
    /// Honours classification.
    #[serde(default)]
    pub hons: Option<FieldValue>,
    /// Grade.
    #[serde(default)]
    pub grade: Option<FieldValue>,
}

impl NewCertificate {
    fn field(&self, field: RequiredField) -> Option<&FieldValue> {
        match field {
            RequiredField::Code => self.code.as_ref(),
            RequiredField::Name => self.name.as_ref(),
            RequiredField::Year => self.year.as_ref(),
            RequiredField::Degree => self.degree.as_ref(),
            RequiredField::Hons => self.hons.as_ref(),
            RequiredField::Grade => self.grade.as_ref(),
        }
    }

    /// List the required fields that are absent or empty.
    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::iter()
            .filter(|f| {
                self.field(*f)
                    .cloned()
                    .and_then(FieldValue::into_present_text)
                    .is_none()
            })
            .collect()
    }

    /// Convert into a record, or report which fields are missing.
    pub fn into_record(self) -> Result<CertificateRecord, Vec<RequiredField>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }

        let take = |v: Option<FieldValue>| {
            v.and_then(FieldValue::into_present_text)
                .unwrap_or_default()
        };

        Ok(CertificateRecord {
            code: take(self.code),
            name: take(self.name),
            year: take(self.year),
            degree: take(self.degree),
            hons: take(self.hons),
            grade: take(self.grade),
            qr: None,
        })
    }
}
