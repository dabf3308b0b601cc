use chrono::Utc;
use sqlx::types::Json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::Customer;
use crate::database::DatabaseError;
use crate::services::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Keep digits and a leading `+`, so "(55) 1234-5678" and "55 1234 5678"
/// resolve to the same customer.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut normalized: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if trimmed.starts_with('+') {
        normalized.insert(0, '+');
    }
    normalized
}

/// Contact details supplied with an order or reservation.
#[derive(Debug, Clone)]
pub struct ContactInfo<'a> {
    pub phone: &'a str,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Find the customer for a phone number or create one. With `backfill`, an
/// existing customer gains a name or email it did not have yet; stored values
/// are never overwritten.
pub async fn resolve_customer(state: &AppState, contact: ContactInfo<'_>, backfill: bool) -> ServiceResult<Customer> {
    let phone = normalize_phone(contact.phone);
    if phone.chars().filter(char::is_ascii_digit).count() < 7 {
        return Err(ServiceError::bad_request("Phone number is too short"));
    }

    let existing = match state.customers.find_by_phone(&phone).await? {
        Some(customer) => customer,
        None => {
            let now = Utc::now();
            let candidate = Customer {
                id: Uuid::new_v4(),
                phone: phone.clone(),
                name: contact.name.map(str::to_owned),
                email: contact.email.map(str::to_owned),
                addresses: Json(vec![]),
                created_at: now,
                updated_at: now,
            };
            match state.customers.insert(&candidate).await {
                Ok(created) => {
                    info!("Created customer {} for phone {}", created.id, created.phone);
                    return Ok(created);
                }
                // Lost a race with a concurrent request for the same phone
                Err(DatabaseError::Conflict(_)) => state
                    .customers
                    .find_by_phone(&phone)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Customer"))?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    if !backfill {
        return Ok(existing);
    }

    let missing = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
    let mut updated = existing.clone();
    let mut changed = false;
    if let (true, Some(name)) = (missing(&existing.name), contact.name) {
        updated.name = Some(name.to_owned());
        changed = true;
    }
    if let (true, Some(email)) = (missing(&existing.email), contact.email) {
        updated.email = Some(email.to_owned());
        changed = true;
    }
    if !changed {
        return Ok(existing);
    }
    debug!("Backfilling contact details for customer {}", existing.id);
    Ok(state.customers.update(&updated).await?)
}
