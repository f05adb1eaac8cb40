use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct SelectCondition {
    pub equals: String,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct PropertyFilter {
    pub property: String,
    pub select: SelectCondition,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseQuery {
    pub filter: PropertyFilter,
}

impl DatabaseQuery {
    /// `property` の select が `value` と一致するものだけ
    pub fn select_equals(property: &str, value: &str) -> DatabaseQuery {
        DatabaseQuery {
            filter: PropertyFilter {
                property: property.to_string(),
                select: SelectCondition {
                    equals: value.to_string(),
                },
            },
        }
    }
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct SelectOption {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Select {
        select: Option<SelectOption>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct QueryDatabaseResponse {
    pub results: Vec<Page>,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileObject {
    External { external: ExternalFile },
}

#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct UpdatePageRequest {
    pub cover: FileObject,
}

impl UpdatePageRequest {
    pub fn external_cover(url: &str) -> UpdatePageRequest {
        UpdatePageRequest {
            cover: FileObject::External {
                external: ExternalFile {
                    url: url.to_string(),
                },
            },
        }
    }
}

/// API が返すエラーの形
/// トップレベルに `status` があればエラー扱い
#[derive(Deserialize, Serialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "snake_case")]
pub struct ErrorEnvelope {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " {code}")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum ApiResponse<T> {
    Ok(T),
    Error(ErrorEnvelope),
}

impl<T> ApiResponse<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error(_))
    }
}
