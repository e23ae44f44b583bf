use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder for a field the resume does not provide.
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Structured candidate data. Serializes with keys in this exact order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(rename = "Name", default = "not_available", deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "Phone", default = "not_available", deserialize_with = "text")]
    pub phone: String,
    #[serde(rename = "Email", default = "not_available", deserialize_with = "text")]
    pub email: String,
    #[serde(rename = "Address", default, deserialize_with = "nullable")]
    pub address: Address,
    #[serde(rename = "Gender", default = "not_available", deserialize_with = "text")]
    pub gender: String,
    #[serde(rename = "Date of Birth", default = "not_available", deserialize_with = "text")]
    pub date_of_birth: String,
    #[serde(rename = "Skills", default, deserialize_with = "text_list")]
    pub skills: Vec<String>,
    #[serde(rename = "Education", default, deserialize_with = "nullable")]
    pub education: Vec<Education>,
    #[serde(rename = "Previous Employers", default, deserialize_with = "nullable")]
    pub previous_employers: Vec<Employer>,
    #[serde(rename = "Certificates", default, deserialize_with = "text_list")]
    pub certificates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "Address", default = "not_available", deserialize_with = "text")]
    pub address: String,
    #[serde(rename = "City", default = "not_available", deserialize_with = "text")]
    pub city: String,
    #[serde(rename = "State", default = "not_available", deserialize_with = "text")]
    pub state: String,
    #[serde(rename = "Country", default = "not_available", deserialize_with = "text")]
    pub country: String,
}

impl Default for Address {
    fn default() -> Self {
        Address {
            address: not_available(),
            city: not_available(),
            state: not_available(),
            country: not_available(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(rename = "Institute Name", default = "not_available", deserialize_with = "text")]
    pub institute_name: String,
    #[serde(rename = "Year", default = "not_available", deserialize_with = "text")]
    pub year: String,
    #[serde(rename = "Marks", default = "not_available", deserialize_with = "text")]
    pub marks: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    #[serde(rename = "Date from", default = "not_available", deserialize_with = "text")]
    pub date_from: String,
    #[serde(rename = "Date to", default = "not_available", deserialize_with = "text")]
    pub date_to: String,
    #[serde(rename = "Employer Name", default = "not_available", deserialize_with = "text")]
    pub employer_name: String,
    #[serde(rename = "Role/Designation", default = "not_available", deserialize_with = "text")]
    pub role: String,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        CandidateProfile {
            name: not_available(),
            phone: not_available(),
            email: not_available(),
            address: Address::default(),
            gender: not_available(),
            date_of_birth: not_available(),
            skills: Vec::new(),
            education: Vec::new(),
            previous_employers: Vec::new(),
            certificates: Vec::new(),
        }
    }
}

/// Pretty JSON with 4-space indentation. Non-ASCII stays literal.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Scalar field: strings pass through, numbers and booleans are stringified,
/// `null` becomes "N/A", lists of scalars are joined with ", ".
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    scalar_to_text(&value)
        .or_else(|| match &value {
            Value::Array(items) => {
                let parts: Option<Vec<String>> = items.iter().map(scalar_to_text).collect();
                parts.map(|p| p.join(", "))
            }
            _ => None,
        })
        .ok_or_else(|| D::Error::custom(format!("expected a text value, got {value}")))
}

/// List of strings. A bare string becomes a one-element list, `null` an empty one.
fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| {
                scalar_to_text(v)
                    .ok_or_else(|| D::Error::custom(format!("expected a text item, got {v}")))
            })
            .collect(),
        other => scalar_to_text(&other)
            .map(|s| vec![s])
            .ok_or_else(|| D::Error::custom(format!("expected a list, got {other}"))),
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(not_available()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_default_to_not_available() {
        let profile: CandidateProfile = serde_json::from_value(json!({ "Name": "Jane" })).unwrap();
        assert_eq!(profile.name, "Jane");
        assert_eq!(profile.phone, "N/A");
        assert_eq!(profile.address.city, "N/A");
        assert!(profile.skills.is_empty());
    }

    #[test]
    fn test_lenient_scalars() {
        let profile: CandidateProfile = serde_json::from_value(json!({
            "Phone": ["+1 555 0100", "+1 555 0101"],
            "Gender": null,
            "Address": null,
            "Skills": "Rust",
            "Education": [{ "Institute Name": "MIT", "Year": 2019, "Marks": 3.9 }],
            "Certificates": null
        }))
        .unwrap();
        assert_eq!(profile.phone, "+1 555 0100, +1 555 0101");
        assert_eq!(profile.gender, "N/A");
        assert_eq!(profile.address, Address::default());
        assert_eq!(profile.skills, vec!["Rust"]);
        assert_eq!(profile.education[0].year, "2019");
        assert_eq!(profile.education[0].marks, "3.9");
        assert!(profile.certificates.is_empty());
    }

    #[test]
    fn test_object_in_scalar_slot_is_rejected() {
        let result: Result<CandidateProfile, _> =
            serde_json::from_value(json!({ "Name": { "first": "Jane" } }));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_is_rejected() {
        let result: Result<CandidateProfile, _> = serde_json::from_value(json!(["Jane"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialized_key_order() {
        let json = to_pretty_json(&CandidateProfile::default()).unwrap();
        let keys = [
            "\"Name\"",
            "\"Phone\"",
            "\"Email\"",
            "\"Address\"",
            "\"City\"",
            "\"Gender\"",
            "\"Date of Birth\"",
            "\"Skills\"",
            "\"Education\"",
            "\"Previous Employers\"",
            "\"Certificates\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn test_pretty_json_indent_and_unicode() {
        let profile = CandidateProfile {
            name: "José Müller".into(),
            ..CandidateProfile::default()
        };
        let json = to_pretty_json(&profile).unwrap();
        assert!(json.starts_with("{\n    \"Name\": \"José Müller\","));
        assert!(json.contains("\n        \"City\": \"N/A\","));
    }
}
