//! Voter records as they appear in the source JSON.
//!
//! The same record shape is published under two key sets: the English lists
//! (`epic`, `fullname`, `house`, `relation`) and the Marathi lists
//! (`voter_id`, `name_marathi`, `relation_name_marathi`). Both deserialize
//! into [`Record`]. Missing or `null` fields become empty values so a partial
//! record is still searchable.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(deserialize_with = "lenient_u32")]
    pub serial_no: u32,
    #[serde(alias = "voter_id", alias = "epic", deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(
        alias = "fullname",
        alias = "name_marathi",
        alias = "name",
        deserialize_with = "lenient_string"
    )]
    pub full_name: String,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "String::is_empty")]
    pub surname: String,
    #[serde(alias = "relation_name_marathi", deserialize_with = "lenient_string")]
    pub relation_name: String,
    #[serde(alias = "relation", deserialize_with = "lenient_string")]
    pub relation_type: String,
    #[serde(alias = "house", deserialize_with = "lenient_string")]
    pub house_no: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub age: u32,
    #[serde(deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient_opt_u32", skip_serializing_if = "Option::is_none")]
    pub source_page: Option<u32>,
}

/// Parse a JSON array of records.
pub fn parse_records(raw: &str) -> serde_json::Result<Vec<Record>> {
    serde_json::from_str(raw)
}

struct LenientString;

impl<'de> Visitor<'de> for LenientString {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, a number or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok(String::new())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientString)
}

/// Numbers may arrive as JSON numbers or as numeric strings ("42").
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(u64),
    Text(String),
}

fn number_like_to_u32<E: de::Error>(value: NumberLike) -> Result<Option<u32>, E> {
    match value {
        NumberLike::Number(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| E::custom(format!("number {n} out of range"))),
        NumberLike::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<u32>()
                .map(Some)
                .map_err(|_| E::custom(format!("expected a non-negative number, got `{s}`")))
        }
    }
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_u32(deserializer)?.unwrap_or_default())
}

fn lenient_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberLike>::deserialize(deserializer)? {
        Some(value) => number_like_to_u32(value),
        None => Ok(None),
    }
}
