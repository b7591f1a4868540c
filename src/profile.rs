//! Read-only profile document the chat answers from.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

type Extra = Map<String, Value>;

/// Typed view of the profile for the renderer.
///
/// Tolerant by construction: scalars of any JSON type are read as text,
/// and entries that are not objects are skipped. The prompt never uses this
/// view; it embeds the raw document (see [`Profile::rendered_json`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub visa_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub resume_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub links: ContactLinks,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub work: Vec<WorkEntry>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub projects: Vec<ProjectEntry>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub education: Vec<EducationEntry>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContactLinks {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkEntry {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_texts")]
    pub highlights: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectEntry {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "lenient_texts", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(text_of(Value::deserialize(deserializer)?))
}

fn lenient_texts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(text_of).collect(),
        other => text_of(other).into_iter().collect(),
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A validated profile: the raw document, its typed view, and the JSON
/// rendering embedded in every prompt.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    document: ProfileDocument,
    rendered: String,
}

impl Profile {
    pub fn from_value(raw: Value) -> Result<Self> {
        if !raw.is_object() {
            bail!("profile must be a JSON object");
        }
        let document = ProfileDocument::deserialize(&raw).context("Failed to read profile fields")?;
        let name = match document.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => bail!("profile is missing a name"),
        };
        // The raw value, not the typed view, so the model sees every field as written.
        let rendered = serde_json::to_string_pretty(&raw).context("Failed to serialize profile")?;
        Ok(Self {
            name,
            document,
            rendered,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(json).context("Failed to parse profile JSON")?;
        Self::from_value(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile at {}", path.display()))?;
        let profile = Self::from_json(&raw)
            .with_context(|| format!("Invalid profile at {}", path.display()))?;
        info!(name = %profile.name, path = %path.display(), "Loaded profile");
        Ok(profile)
    }

    pub fn document(&self) -> &ProfileDocument {
        &self.document
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pretty-printed JSON of the document exactly as loaded, keys in file order.
    pub fn rendered_json(&self) -> &str {
        &self.rendered
    }
}
