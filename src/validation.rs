//! Argument checks for the prediction endpoints. All of them run before any
//! network call.

use crate::errors::ValidationError;
use chrono::{DateTime, Utc};

pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 10_000;
pub const MAX_MINER_UID: u32 = 255;
pub const HOTKEY_LENGTH: usize = 48;
pub const MIN_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 10_000;

pub fn validate_limit(limit: u32) -> Result<(), ValidationError> {
    if (MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(ValidationError::Limit(limit))
    }
}

pub fn validate_miner_uid(uid: u32) -> Result<(), ValidationError> {
    if uid <= MAX_MINER_UID {
        Ok(())
    } else {
        Err(ValidationError::MinerUid(uid))
    }
}

/// SS58 hotkeys are 48 characters long
pub fn validate_hotkey(hotkey: &str) -> Result<(), ValidationError> {
    let length = hotkey.chars().count();
    if length == HOTKEY_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::Hotkey(length))
    }
}

pub fn validate_date_range(
    start_date: &DateTime<Utc>,
    end_date: &DateTime<Utc>,
) -> Result<(), ValidationError> {
    if start_date < end_date {
        Ok(())
    } else {
        Err(ValidationError::DateRange)
    }
}

pub fn validate_page(page: u32) -> Result<(), ValidationError> {
    if page >= 1 {
        Ok(())
    } else {
        Err(ValidationError::Page)
    }
}

pub fn validate_page_size(page_size: u32) -> Result<(), ValidationError> {
    if (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        Ok(())
    } else {
        Err(ValidationError::PageSize(page_size))
    }
}
