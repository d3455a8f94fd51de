//! Demo data used to populate an empty portal: ten contacts and a fixed set
//! of role assignments. Placeholder content only.

use {
    serde::Serialize,
    serde_json::Value,
    tracing::{info, warn},
};

use crate::{client::HubSpotClient, contacts::ContactProperties, error::CrmError};

/// Number of contacts fetched when assigning roles.
const ASSIGN_FETCH_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct DemoContact {
    pub firstname: &'static str,
    pub lastname: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub street: &'static str,
    pub city: &'static str,
    pub state: &'static str,
    pub zip: &'static str,
}

impl DemoContact {
    pub fn properties(&self) -> ContactProperties {
        ContactProperties {
            firstname: Some(self.firstname.into()),
            lastname: Some(self.lastname.into()),
            email: Some(self.email.into()),
            phone: Some(self.phone.into()),
            address: Some(self.street.into()),
            city: Some(self.city.into()),
            state: Some(self.state.into()),
            zip: Some(self.zip.into()),
            project_role: None,
        }
    }
}

pub const DEMO_CONTACTS: &[DemoContact] = &[
    DemoContact {
        firstname: "John",
        lastname: "Doe",
        email: "john.doe@example.com",
        phone: "(123) 456-7890",
        street: "123 Main St",
        city: "San Diego",
        state: "CA",
        zip: "92101",
    },
    DemoContact {
        firstname: "Jane",
        lastname: "Smith",
        email: "jane.smith@example.com",
        phone: "(234) 567-8901",
        street: "456 Oak Ave",
        city: "Los Angeles",
        state: "CA",
        zip: "90001",
    },
    DemoContact {
        firstname: "Robert",
        lastname: "Johnson",
        email: "robert.johnson@example.com",
        phone: "(345) 678-9012",
        street: "789 Pine St",
        city: "San Francisco",
        state: "CA",
        zip: "94102",
    },
    DemoContact {
        firstname: "Emily",
        lastname: "Williams",
        email: "emily.williams@example.com",
        phone: "(456) 789-0123",
        street: "101 Cedar Rd",
        city: "Seattle",
        state: "WA",
        zip: "98101",
    },
    DemoContact {
        firstname: "Michael",
        lastname: "Brown",
        email: "michael.brown@example.com",
        phone: "(567) 890-1234",
        street: "202 Elm St",
        city: "Portland",
        state: "OR",
        zip: "97201",
    },
    DemoContact {
        firstname: "Sarah",
        lastname: "Davis",
        email: "sarah.davis@example.com",
        phone: "(678) 901-2345",
        street: "303 Birch Ave",
        city: "Denver",
        state: "CO",
        zip: "80201",
    },
    DemoContact {
        firstname: "David",
        lastname: "Miller",
        email: "david.miller@example.com",
        phone: "(789) 012-3456",
        street: "404 Maple Dr",
        city: "Phoenix",
        state: "AZ",
        zip: "85001",
    },
    DemoContact {
        firstname: "Lisa",
        lastname: "Wilson",
        email: "lisa.wilson@example.com",
        phone: "(890) 123-4567",
        street: "505 Spruce Ln",
        city: "Dallas",
        state: "TX",
        zip: "75201",
    },
    DemoContact {
        firstname: "James",
        lastname: "Taylor",
        email: "james.taylor@example.com",
        phone: "(901) 234-5678",
        street: "606 Willow Rd",
        city: "Austin",
        state: "TX",
        zip: "73301",
    },
    DemoContact {
        firstname: "Jennifer",
        lastname: "Anderson",
        email: "jennifer.anderson@example.com",
        phone: "(012) 345-6789",
        street: "707 Ash St",
        city: "Boston",
        state: "MA",
        zip: "02108",
    },
];

/// Roles given to the first contacts in listing order.
pub const ROLE_ASSIGNMENTS: &[&[&str]] = &[
    &["contractor", "home_owner"],
    &["geo_tech"],
    &["affiliate", "referral_partner"],
    &["community_partner"],
    &["geo_tech", "contractor"],
    &["home_owner"],
    &["affiliate"],
    &["referral_partner", "community_partner"],
    &["contractor"],
    &["geo_tech", "community_partner"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeSummary {
    pub contacts_created: usize,
    pub roles_assigned: usize,
}

impl HubSpotClient {
    /// Create every demo contact. The first failure aborts.
    pub async fn populate_demo_contacts(&self) -> Result<Vec<Value>, CrmError> {
        let mut created = Vec::with_capacity(DEMO_CONTACTS.len());
        for contact in DEMO_CONTACTS {
            created.push(self.create_contact(&contact.properties()).await?);
        }
        info!(count = created.len(), "created demo contacts");
        Ok(created)
    }

    /// Give the first contacts their demo roles. The first failure aborts.
    pub async fn assign_demo_roles(&self) -> Result<Vec<Value>, CrmError> {
        let contacts = self.list_contacts(ASSIGN_FETCH_LIMIT, &[]).await?;
        let mut updated = Vec::new();
        for (contact, roles) in contacts.iter().zip(ROLE_ASSIGNMENTS) {
            updated.push(self.set_contact_roles(&contact.id, roles).await?);
        }
        info!(count = updated.len(), "assigned demo roles");
        Ok(updated)
    }

    /// Property, contacts and roles in one pass.
    ///
    /// Individual contact or role failures (for example a contact that
    /// already exists) are logged and skipped. Losing authorization aborts.
    pub async fn initialize_demo(&self) -> Result<InitializeSummary, CrmError> {
        self.ensure_project_role_property().await?;

        let mut contacts_created = 0;
        for contact in DEMO_CONTACTS {
            match self.create_contact(&contact.properties()).await {
                Ok(_) => contacts_created += 1,
                Err(e) if e.is_auth_required() => return Err(e),
                Err(e) => warn!(email = contact.email, error = %e, "skipping demo contact"),
            }
        }

        let contacts = self.list_contacts(ASSIGN_FETCH_LIMIT, &[]).await?;
        let mut roles_assigned = 0;
        for (contact, roles) in contacts.iter().zip(ROLE_ASSIGNMENTS) {
            match self.set_contact_roles(&contact.id, roles).await {
                Ok(_) => roles_assigned += 1,
                Err(e) if e.is_auth_required() => return Err(e),
                Err(e) => warn!(id = %contact.id, error = %e, "skipping role assignment"),
            }
        }

        let summary = InitializeSummary {
            contacts_created,
            roles_assigned,
        };
        info!(?summary, "initialization complete");
        Ok(summary)
    }
}
