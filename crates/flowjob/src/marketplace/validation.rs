use serde::{Deserialize, Serialize};

use super::domain::{AccountInfo, BusinessProfile, JobPosting, WorkerProfile};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const MINIMUM_WORKING_AGE: u8 = 13;

/// Account fields submitted at sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRequest {
    pub email: String,
    pub confirm_email: String,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

impl AccountRequest {
    /// Normalized account document fields. Call after [`validate_account`] succeeds.
    pub fn account_info(&self) -> AccountInfo {
        let username = self.username.trim().to_string();
        AccountInfo {
            email: self.email.trim().to_lowercase(),
            username_lowercase: username.to_lowercase(),
            username,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field problem found in one pass, so clients can highlight them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid input: {}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() => domain
            .split_once('.')
            .map(|(host, rest)| !host.is_empty() && !rest.is_empty())
            .unwrap_or(false),
        _ => false,
    }
}

fn username_problem(username: &str) -> Option<&'static str> {
    let length = username.chars().count();
    if length < USERNAME_MIN_LEN {
        Some("Username must be at least 3 characters")
    } else if length > USERNAME_MAX_LEN {
        Some("Username cannot exceed 20 characters")
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some("Username can only contain letters, numbers, and underscores.")
    } else {
        None
    }
}

pub fn validate_account(request: &AccountRequest) -> Result<(), ValidationErrors> {
    let mut collector = Collector::default();

    if !is_valid_email(&request.email) {
        collector.push("email", "Please enter a valid email");
    }
    if request.email.trim().to_lowercase() != request.confirm_email.trim().to_lowercase() {
        collector.push("confirm_email", "Emails do not match");
    }
    if let Some(problem) = username_problem(request.username.trim()) {
        collector.push("username", problem);
    }
    if request.first_name.trim().is_empty() {
        collector.push("firstName", "First name is required");
    }
    if request.last_name.trim().is_empty() {
        collector.push("lastName", "Last name is required");
    }
    if request.password.chars().count() < PASSWORD_MIN_LEN {
        collector.push("password", "Password must be at least 6 characters");
    }
    if request.password != request.confirm_password {
        collector.push("confirm_password", "Passwords do not match");
    }

    collector.finish()
}

fn check_salary(collector: &mut Collector, min: Option<u32>, max: Option<u32>) {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            collector.push("salary_max", "Maximum salary must not be below the minimum");
        }
    }
}

fn check_coordinates(collector: &mut Collector, lat: Option<f64>, lng: Option<f64>) {
    if let Some(lat) = lat {
        if !(-90.0..=90.0).contains(&lat) {
            collector.push("location_lat", "Latitude must be between -90 and 90");
        }
    }
    if let Some(lng) = lng {
        if !(-180.0..=180.0).contains(&lng) {
            collector.push("location_lng", "Longitude must be between -180 and 180");
        }
    }
}

pub fn validate_worker_profile(profile: &WorkerProfile) -> Result<(), ValidationErrors> {
    let mut collector = Collector::default();
    check_salary(&mut collector, profile.salary_min, profile.salary_max);
    check_coordinates(&mut collector, profile.location_lat, profile.location_lng);
    if profile.job_search_radius == Some(0) {
        collector.push("job_search_radius", "Search radius must be positive");
    }
    collector.finish()
}

pub fn validate_business_profile(profile: &BusinessProfile) -> Result<(), ValidationErrors> {
    let mut collector = Collector::default();
    if profile.name.trim().is_empty() {
        collector.push("name", "Business name is required");
    }
    if let Some(email) = profile.contact_email.as_deref() {
        if !is_valid_email(email) {
            collector.push("contact_email", "Please enter a valid email");
        }
    }
    check_coordinates(&mut collector, profile.location_lat, profile.location_lng);
    collector.finish()
}

pub fn validate_job_posting(posting: &JobPosting) -> Result<(), ValidationErrors> {
    let mut collector = Collector::default();
    if posting.title.trim().is_empty() {
        collector.push("title", "Job title is required");
    }
    if posting.description.trim().is_empty() {
        collector.push("description", "Job description is required");
    }
    check_salary(&mut collector, posting.salary_min, posting.salary_max);
    check_coordinates(&mut collector, posting.location_lat, posting.location_lng);
    if let Some(age) = posting.minimum_age {
        if age < MINIMUM_WORKING_AGE {
            collector.push("minimum_age", "Minimum age cannot be below 13");
        }
    }
    collector.finish()
}
