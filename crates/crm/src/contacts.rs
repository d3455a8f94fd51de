//! Contacts: listing, creation, role updates, and the map-facing shape.

use {
    rand::Rng,
    serde::{Deserialize, Serialize},
    serde_json::json,
};

use crate::{client::HubSpotClient, error::CrmError};

const CONTACTS_PATH: &str = "/crm/v3/objects/contacts";

/// Properties requested when listing contacts for the map.
pub const MAP_PROPERTIES: &[&str] = &[
    "firstname",
    "lastname",
    "email",
    "phone",
    "address",
    "city",
    "state",
    "zip",
    "project_role",
];

/// A contact as returned by the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub properties: ContactProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Semicolon-separated role values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContactPage {
    #[serde(default)]
    results: Vec<Contact>,
}

/// Contact shape rendered by the map frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedContact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    pub roles: Vec<String>,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Map position. Randomly placed around the continental US; the CRM does not
/// store a location and no geocoding happens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            lat: 37.0 + rng.random_range(-4.0..4.0),
            lng: -100.0 + rng.random_range(-15.0..15.0),
        }
    }
}

/// Split a `project_role` value into its roles.
///
/// Returns `None` when the field is absent or blank.
pub fn parse_roles(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let roles: Vec<String> = raw
        .split(';')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    (!roles.is_empty()).then_some(roles)
}

/// Reshape one contact for the map, or `None` if it carries no role.
pub fn format_contact(contact: Contact, rng: &mut impl Rng) -> Option<FormattedContact> {
    let roles = parse_roles(contact.properties.project_role.as_deref())?;
    let p = contact.properties;
    let name = format!(
        "{} {}",
        p.firstname.as_deref().unwrap_or_default(),
        p.lastname.as_deref().unwrap_or_default()
    )
    .trim()
    .to_string();

    Some(FormattedContact {
        id: contact.id,
        name,
        email: p.email.unwrap_or_default(),
        phone: p.phone.unwrap_or_default(),
        address: Address {
            street: p.address.unwrap_or_default(),
            city: p.city.unwrap_or_default(),
            state: p.state.unwrap_or_default(),
            zip: p.zip.unwrap_or_default(),
        },
        roles,
        coordinates: Coordinates::random(rng),
    })
}

/// Keep contacts that have at least one role and reshape them for the map.
pub fn format_contacts(contacts: Vec<Contact>) -> Vec<FormattedContact> {
    let mut rng = rand::rng();
    contacts
        .into_iter()
        .filter_map(|c| format_contact(c, &mut rng))
        .collect()
}

impl HubSpotClient {
    /// First page of contacts. An empty `properties` slice uses the CRM's
    /// default property set.
    pub async fn list_contacts(
        &self,
        limit: u32,
        properties: &[&str],
    ) -> Result<Vec<Contact>, CrmError> {
        let mut path = format!("{CONTACTS_PATH}?limit={limit}");
        if !properties.is_empty() {
            path.push_str("&properties=");
            path.push_str(&properties.join(","));
        }
        let value = self.get(&path).await?;
        let page: ContactPage = serde_json::from_value(value)?;
        Ok(page.results)
    }

    pub async fn create_contact(
        &self,
        properties: &ContactProperties,
    ) -> Result<serde_json::Value, CrmError> {
        self.post(CONTACTS_PATH, &json!({ "properties": properties }))
            .await
    }

    /// Patch only the properties that are set.
    pub async fn update_contact(
        &self,
        id: &str,
        properties: &ContactProperties,
    ) -> Result<serde_json::Value, CrmError> {
        self.patch(
            &format!("{CONTACTS_PATH}/{id}"),
            &json!({ "properties": properties }),
        )
        .await
    }

    /// Overwrite the contact's roles.
    pub async fn set_contact_roles(
        &self,
        id: &str,
        roles: &[&str],
    ) -> Result<serde_json::Value, CrmError> {
        let properties = ContactProperties {
            project_role: Some(roles.join(";")),
            ..Default::default()
        };
        self.update_contact(id, &properties).await
    }

    /// Contacts with at least one role, in map shape.
    pub async fn contacts_with_roles(&self) -> Result<Vec<FormattedContact>, CrmError> {
        let contacts = self.list_contacts(100, MAP_PROPERTIES).await?;
        let total = contacts.len();
        let formatted = format_contacts(contacts);
        tracing::debug!(total, with_roles = formatted.len(), "formatted contacts");
        Ok(formatted)
    }
}
