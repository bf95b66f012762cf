//! Field validation applied at the request boundary.
//!
//! Each validator returns `Err(message)` for a single field; the aggregate
//! checks collect those into a [`ValidationErrors`] keyed by field name.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::database::{KittenChanges, NewKitten};

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;
pub const MIN_PASSWORD_LENGTH: usize = 6;

const MAX_NAME_LENGTH: usize = 100;
const MAX_BREED_LENGTH: usize = 100;
const MAX_COLOR_LENGTH: usize = 51;
const MAX_USERNAME_LENGTH: usize = 150;

pub const REQUIRED: &str = "This field is required.";

/// Field name → message for every field that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a failure; the first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn to_field_map(&self) -> HashMap<String, String> {
        self.fields.clone().into_iter().collect()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "Invalid value for: {}", names.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!("Ensure this field has at least {} characters.", min));
    }
    if len > max {
        return Err(format!("Ensure this field has no more than {} characters.", max));
    }
    Ok(())
}

pub fn validate_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    check_length(value, 1, MAX_NAME_LENGTH)
}

pub fn validate_breed(value: &str) -> Result<(), String> {
    if value.chars().count() < 2 {
        return Err("Breed must have at least 2 characters.".to_string());
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-')
    {
        return Err("Breed must contain only alphabetic characters, spaces, or dashes.".to_string());
    }
    check_length(value, 2, MAX_BREED_LENGTH)
}

pub fn validate_color(value: &str) -> Result<(), String> {
    if value.chars().count() < 2 {
        return Err("Color must have at least 2 characters.".to_string());
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        return Err("Color must contain only alphabetic characters or spaces.".to_string());
    }
    check_length(value, 2, MAX_COLOR_LENGTH)
}

pub fn validate_age_months(value: i64) -> Result<(), String> {
    if value < 0 {
        return Err("Age must be a positive number.".to_string());
    }
    Ok(())
}

pub fn validate_description(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    Ok(())
}

pub fn validate_score(value: i64) -> Result<(), ValidationErrors> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(ValidationErrors::single(
            "score",
            format!("Rating must be between {} and {}.", MIN_SCORE, MAX_SCORE),
        ));
    }
    Ok(())
}

/// Letters, digits and `@ . + - _`, like most account systems accept.
pub fn validate_username(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    check_length(value, 1, MAX_USERNAME_LENGTH)?;
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), String> {
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Ensure this field has at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_new_kitten(kitten: &NewKitten) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("name", validate_name(&kitten.name));
    errors.check("breed", validate_breed(&kitten.breed));
    errors.check("color", validate_color(&kitten.color));
    errors.check("age_months", validate_age_months(kitten.age_months));
    errors.check("description", validate_description(&kitten.description));
    errors.into_result()
}

pub fn validate_kitten_changes(changes: &KittenChanges) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = &changes.name {
        errors.check("name", validate_name(name));
    }
    if let Some(breed) = &changes.breed {
        errors.check("breed", validate_breed(breed));
    }
    if let Some(color) = &changes.color {
        errors.check("color", validate_color(color));
    }
    if let Some(age) = changes.age_months {
        errors.check("age_months", validate_age_months(age));
    }
    if let Some(description) = &changes.description {
        errors.check("description", validate_description(description));
    }
    errors.into_result()
}

/// Every attribute must be present, as for create and full update. Missing
/// ones are reported as required; present ones are validated as usual.
pub fn require_complete(changes: KittenChanges) -> Result<NewKitten, ValidationErrors> {
    let KittenChanges {
        name,
        breed,
        color,
        age_months,
        description,
    } = changes;

    match (name, breed, color, age_months, description) {
        (Some(name), Some(breed), Some(color), Some(age_months), Some(description)) => {
            let kitten = NewKitten {
                name,
                breed,
                color,
                age_months,
                description,
            };
            validate_new_kitten(&kitten)?;
            Ok(kitten)
        }
        (name, breed, color, age_months, description) => {
            let mut errors = ValidationErrors::new();
            for (field, present) in [
                ("name", name.is_some()),
                ("breed", breed.is_some()),
                ("color", color.is_some()),
                ("age_months", age_months.is_some()),
                ("description", description.is_some()),
            ] {
                if !present {
                    errors.add(field, REQUIRED);
                }
            }
            Err(errors)
        }
    }
}

pub fn validate_credentials(username: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check("username", validate_username(username));
    errors.check("password", validate_password(password));
    errors.into_result()
}
