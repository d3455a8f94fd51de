use {
    serde_json::{Value, json},
    tracing::info,
};

use crate::{client::HubSpotClient, error::CrmError};

/// Internal name of the custom contact property holding roles.
pub const PROJECT_ROLE_PROPERTY: &str = "project_role";

/// `(label, value)` pairs offered by the role checkbox.
pub const ROLE_OPTIONS: &[(&str, &str)] = &[
    ("Contractor", "contractor"),
    ("Home Owner", "home_owner"),
    ("Affiliate", "affiliate"),
    ("Referral Partner", "referral_partner"),
    ("Community Partner", "community_partner"),
    ("Geo Tech", "geo_tech"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyOutcome {
    Existing,
    Created(Value),
}

/// Definition of the multi-select role property.
pub fn project_role_definition() -> Value {
    let options: Vec<Value> = ROLE_OPTIONS
        .iter()
        .map(|(label, value)| json!({ "label": label, "value": value }))
        .collect();
    json!({
        "name": PROJECT_ROLE_PROPERTY,
        "label": "Project Role",
        "type": "enumeration",
        "fieldType": "checkbox",
        "groupName": "contactinformation",
        "options": options,
    })
}

impl HubSpotClient {
    /// Create the role property unless the CRM already has it.
    pub async fn ensure_project_role_property(&self) -> Result<PropertyOutcome, CrmError> {
        match self
            .get(&format!("/crm/v3/properties/contacts/{PROJECT_ROLE_PROPERTY}"))
            .await
        {
            Ok(_) => Ok(PropertyOutcome::Existing),
            Err(CrmError::NotFound { .. }) => {
                let created = self
                    .post("/crm/v3/properties/contacts", &project_role_definition())
                    .await?;
                info!(property = PROJECT_ROLE_PROPERTY, "created contact property");
                Ok(PropertyOutcome::Created(created))
            },
            Err(e) => Err(e),
        }
    }
}
