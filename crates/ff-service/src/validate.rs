//! Input checks shared by the service operations. Pure.

use ff_schemas::{AddressInput, ItemRequest};

use crate::{ServiceError, ServiceResult};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;

pub fn username(s: &str) -> ServiceResult<()> {
    let n = s.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&n) {
        return Err(ServiceError::validation(format!(
            "username must be {USERNAME_MIN} to {USERNAME_MAX} characters"
        )));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ServiceError::validation(
            "username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

pub fn non_empty(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Deliberately loose: one '@', something before it, a dot somewhere after it.
pub fn email(s: &str) -> ServiceResult<()> {
    let t = s.trim();
    let ok = match t.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(a, b)| !a.is_empty() && !b.is_empty())
                && !t.contains(char::is_whitespace)
        }
        None => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ServiceError::validation(format!("invalid email address: {t}")))
    }
}

pub fn price_cents(v: i64) -> ServiceResult<()> {
    if v < 0 {
        return Err(ServiceError::validation("price must be >= 0"));
    }
    Ok(())
}

pub fn stock(v: i32) -> ServiceResult<()> {
    if v < 0 {
        return Err(ServiceError::validation("stock must be >= 0"));
    }
    Ok(())
}

pub fn quantity(v: i32) -> ServiceResult<()> {
    if v <= 0 {
        return Err(ServiceError::validation(format!(
            "quantity must be positive, got {v}"
        )));
    }
    Ok(())
}

pub fn address(a: &AddressInput) -> ServiceResult<()> {
    non_empty("street", &a.street)?;
    non_empty("postal_code", &a.postal_code)?;
    non_empty("city", &a.city)?;
    Ok(())
}

/// Sum of requested quantities, refusing empty baskets and anything over `max`.
pub fn basket(items: &[ItemRequest], max: i32) -> ServiceResult<i32> {
    if items.is_empty() {
        return Err(ServiceError::validation("an order needs at least one item"));
    }
    let mut total: i32 = 0;
    for item in items {
        quantity(item.quantity)?;
        total = total
            .checked_add(item.quantity)
            .ok_or_else(|| ServiceError::validation("too many items"))?;
    }
    item_cap(total, max)?;
    Ok(total)
}

pub fn item_cap(total: i32, max: i32) -> ServiceResult<()> {
    if total > max {
        return Err(ServiceError::validation(format!(
            "an order may hold at most {max} items, got {total}"
        )));
    }
    Ok(())
}
