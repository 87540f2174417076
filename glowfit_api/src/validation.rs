use chrono_tz::Tz;

use crate::error::{ApiError, FieldError};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TEXT_LEN: usize = 2000;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 30;

/// Collects field errors so a request reports every problem at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
        self
    }

    pub fn required(&mut self, value: &str, field: &str, max_len: usize) -> &mut Self {
        let value = value.trim();
        if value.is_empty() {
            return self.check(false, field, "is required");
        }
        self.check(
            value.chars().count() <= max_len,
            field,
            &format!("must be at most {max_len} characters"),
        )
    }

    pub fn optional(&mut self, value: Option<&str>, field: &str, max_len: usize) -> &mut Self {
        match value {
            Some(value) => self.check(
                value.chars().count() <= max_len,
                field,
                &format!("must be at most {max_len} characters"),
            ),
            None => self,
        }
    }

    pub fn email(&mut self, value: &str, field: &str) -> &mut Self {
        let valid = value
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            })
            && !value.chars().any(char::is_whitespace)
            && value.len() <= 254;
        self.check(valid, field, "must be a valid email address")
    }

    pub fn timezone(&mut self, value: Option<&str>, field: &str) -> &mut Self {
        match value {
            Some(value) => self.check(value.parse::<Tz>().is_ok(), field, "must be an IANA timezone"),
            None => self,
        }
    }

    pub fn tags(&mut self, tags: &[String], field: &str) -> &mut Self {
        self.check(
            tags.len() <= MAX_TAGS,
            field,
            &format!("at most {MAX_TAGS} tags are allowed"),
        );
        self.check(
            tags.iter()
                .all(|t| !t.trim().is_empty() && t.chars().count() <= MAX_TAG_LEN),
            field,
            &format!("tags must be non-empty and at most {MAX_TAG_LEN} characters"),
        )
    }

    pub fn positive(&mut self, value: Option<u32>, field: &str) -> &mut Self {
        self.check(value.is_none_or(|v| v > 0), field, "must be greater than zero")
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Trims every tag, drops duplicates and keeps the first spelling.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !normalized.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            normalized.push(tag);
        }
    }
    normalized
}
