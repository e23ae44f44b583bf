use crate::error::CvError;
use crate::llm::{prompt, ChatClient};
use crate::model::CandidateProfile;

/// Ask the model for the structured profile of one resume.
///
/// The reply must be a JSON object of the profile shape; anything else is a
/// `Schema` error for the whole request.
pub async fn extract_profile(
    chat: &dyn ChatClient,
    file_name: &str,
    content: &str,
) -> Result<CandidateProfile, CvError> {
    let reply = chat
        .complete_json(&prompt::resume_prompt(file_name, content))
        .await?;

    if !reply.is_object() {
        return Err(CvError::Schema(format!(
            "expected a JSON object for {file_name}, got {}",
            json_kind(&reply)
        )));
    }

    serde_json::from_value(reply).map_err(|e| CvError::Schema(format!("{file_name}: {e}")))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
