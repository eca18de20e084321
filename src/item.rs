use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Bitwarden field kind for plain text custom fields.
pub const TEXT_FIELD_KIND: i64 = 0;

/// A single decrypted vault item as returned by `bw list items`.
///
/// Only the substructures the planner cares about are modeled explicitly;
/// everything else the store sends is preserved in `extra` so items
/// round-trip through serde without losing fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    pub notes: Option<String>,

    pub login: Option<Login>,

    pub fields: Option<Vec<CustomField>>,

    #[serde(rename = "revisionDate", skip_serializing_if = "Option::is_none")]
    pub revision_date: Option<String>,

    #[serde(rename = "creationDate", skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    #[serde(rename = "deletedDate", skip_serializing_if = "Option::is_none")]
    pub deleted_date: Option<String>,

    #[serde(rename = "organizationId", skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    // Catch-all for store fields we don't explicitly parse
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The login substructure of a vault item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Login {
    pub username: Option<String>,

    pub password: Option<String>,

    pub totp: Option<String>,

    #[serde(
        rename = "passwordRevisionDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub password_revision_date: Option<String>,

    pub uris: Option<Vec<LoginUri>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry in a login's URI list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginUri {
    pub uri: Option<String>,

    #[serde(rename = "match")]
    pub match_kind: Option<i64>,

    pub port: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user-defined custom field on a vault item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub name: Option<String>,

    pub value: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomField {
    /// Create a plain text custom field.
    pub fn text(name: &str, value: &str) -> Self {
        CustomField {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
            kind: TEXT_FIELD_KIND,
            extra: Map::new(),
        }
    }
}

impl VaultItem {
    /// Read the value of a named custom field, if present.
    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.fields
            .as_deref()?
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
            .and_then(|f| f.value.as_deref())
    }

    /// Set or update a named custom field, creating the fields list if
    /// the item has none. New fields use the plain text kind.
    pub fn set_custom_field(&mut self, name: &str, value: &str) {
        let fields = self.fields.get_or_insert_with(Vec::new);
        if let Some(field) = fields.iter_mut().find(|f| f.name.as_deref() == Some(name)) {
            field.value = Some(value.to_string());
        } else {
            fields.push(CustomField::text(name, value));
        }
    }

    /// The login username, or empty if the item has no login.
    pub fn username(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| l.username.as_deref())
            .unwrap_or("")
    }

    /// The first login URI, or empty if the item has none.
    pub fn first_uri(&self) -> &str {
        self.login
            .as_ref()
            .and_then(|l| l.uris.as_deref())
            .and_then(|uris| uris.first())
            .and_then(|u| u.uri.as_deref())
            .unwrap_or("")
    }
}
