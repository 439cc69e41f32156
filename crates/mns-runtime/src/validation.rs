//! Local checks applied before a request leaves the process.

use crate::error::ValidationError;
use crate::signer::{RequestHeaders, MNS_MARKER, MNS_PREFIX, MNS_RET_NUMBER, MNS_WITH_META};

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;

/// Longest queue, topic or subscription name the service accepts
pub const MAX_NAME_LENGTH: usize = 256;

/// Largest page a listing call may request
pub const MAX_RET_NUMBER: i32 = 1000;

/// Trim a resource name and check it is present and short enough
pub fn check_name(field: &str, name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name.to_string())
}

/// Check `value` lies in `min..=max`
pub fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        })
    }
}

/// Paging parameters of a listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Marker returned as `NextMarker` by the previous page
    pub marker: String,
    /// Page size; 0 leaves it to the service
    pub ret_number: i32,
    pub prefix: String,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn with_ret_number(mut self, ret_number: i32) -> Self {
        self.ret_number = ret_number;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Build the paging headers; blank values are left out
    pub fn to_headers(&self, with_meta: bool) -> Result<RequestHeaders, ValidationError> {
        let mut headers = RequestHeaders::new();

        let marker = self.marker.trim();
        if !marker.is_empty() {
            headers.insert(MNS_MARKER, marker);
        }

        if self.ret_number > 0 {
            check_range(
                "ret number",
                i64::from(self.ret_number),
                1,
                i64::from(MAX_RET_NUMBER),
            )?;
            headers.insert(MNS_RET_NUMBER, self.ret_number.to_string());
        }

        let prefix = self.prefix.trim();
        if !prefix.is_empty() {
            headers.insert(MNS_PREFIX, prefix);
        }

        if with_meta {
            headers.insert(MNS_WITH_META, "true");
        }

        Ok(headers)
    }
}
