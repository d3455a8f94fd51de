//! HubSpot CRM access: an authenticated request wrapper plus the contact,
//! property and demo-seeding operations built on it.

pub mod client;
pub mod contacts;
pub mod error;
pub mod properties;
pub mod seed;

pub use {
    client::HubSpotClient,
    contacts::{
        Address, Contact, ContactProperties, Coordinates, FormattedContact, format_contacts,
        parse_roles,
    },
    error::CrmError,
    properties::{PROJECT_ROLE_PROPERTY, PropertyOutcome},
    seed::InitializeSummary,
};
