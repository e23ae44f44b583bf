use crate::llm::{prompt, ChatClient};
use crate::model::{CandidateProfile, NOT_AVAILABLE};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,7}\b").expect("valid email regex")
});

/// Whether the value starts with something shaped like an email address.
pub fn looks_like_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Infer a gender from the candidate's name when the resume did not state one.
///
/// "Male"/"Female" are kept as-is, as is anything when the name is unknown.
/// A failed call keeps the original value.
pub async fn check_gender(chat: &dyn ChatClient, gender: &str, name: &str) -> String {
    if gender == "Male" || gender == "Female" || name.is_empty() || name == NOT_AVAILABLE {
        return gender.to_string();
    }

    match chat.complete_json(&prompt::gender_prompt(name)).await {
        Ok(reply) => match reply_field(&reply, "Gender") {
            Some(g) => g,
            None => {
                tracing::warn!(%reply, "gender reply has no Gender field");
                gender.to_string()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "gender check failed, keeping original value");
            gender.to_string()
        }
    }
}

/// Repair a malformed email address.
///
/// Well-formed values pass through without a call; empty and "N/A" become
/// "N/A". A failed call keeps the original value.
pub async fn check_email(chat: &dyn ChatClient, email: &str) -> String {
    if looks_like_email(email) {
        return email.to_string();
    }
    if email.is_empty() || email == NOT_AVAILABLE {
        return NOT_AVAILABLE.to_string();
    }

    match chat.complete_json(&prompt::email_prompt(email)).await {
        Ok(reply) => match reply_field(&reply, "Email") {
            Some(fixed) => fixed,
            None => {
                tracing::warn!(%reply, "email reply has no Email field");
                email.to_string()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "email check failed, keeping original value");
            email.to_string()
        }
    }
}

/// Apply the gender and email checks to a profile.
pub async fn validate_profile(chat: &dyn ChatClient, mut profile: CandidateProfile) -> CandidateProfile {
    profile.gender = check_gender(chat, &profile.gender, &profile.name).await;
    profile.email = check_email(chat, &profile.email).await;
    profile
}

fn reply_field(reply: &serde_json::Value, key: &str) -> Option<String> {
    match reply.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
