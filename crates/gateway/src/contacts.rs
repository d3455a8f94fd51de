//! CRM-backed routes: the map feed and the setup/seeding operations.

use std::sync::Arc;

use {
    axum::{Json, extract::State},
    rolemap_crm::{FormattedContact, PropertyOutcome},
    serde_json::{Value, json},
};

use crate::{error::ApiError, state::AppState};

/// Refuse before touching the CRM when no refresh token is held.
fn require_auth(state: &AppState) -> Result<(), ApiError> {
    if state.tokens.is_authenticated() {
        Ok(())
    } else {
        Err(ApiError::AuthRequired)
    }
}

pub async fn contacts_with_roles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FormattedContact>>, ApiError> {
    require_auth(&state)?;
    let contacts = state
        .crm
        .contacts_with_roles()
        .await
        .map_err(|e| ApiError::from(e).context("Failed to fetch contacts from HubSpot"))?;
    Ok(Json(contacts))
}

pub async fn populate_contacts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&state)?;
    let contacts = state.crm.populate_demo_contacts().await?;
    Ok(Json(json!({ "success": true, "contacts": contacts })))
}

pub async fn create_property_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&state)?;
    let body = match state.crm.ensure_project_role_property().await? {
        PropertyOutcome::Created(property) => {
            json!({ "success": true, "created": true, "property": property })
        },
        PropertyOutcome::Existing => json!({
            "success": true,
            "created": false,
            "message": "Property already exists",
        }),
    };
    Ok(Json(body))
}

pub async fn assign_roles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&state)?;
    let assignments = state.crm.assign_demo_roles().await?;
    Ok(Json(json!({ "success": true, "assignments": assignments })))
}

pub async fn initialize_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    require_auth(&state)?;
    let summary = state.crm.initialize_demo().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Initialization complete",
        "contactsCreated": summary.contacts_created,
        "rolesAssigned": summary.roles_assigned,
    })))
}
