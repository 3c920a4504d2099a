//! Assistant request/response models and the voice-memo extraction schema.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::ProfilePublic;

/// Chat role, matching the completion provider's wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Request payload for the conversational assistant.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must not be empty"))]
    pub message: String,

    /// Prior turns, oldest first. The current message is not included.
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatResponse {
    pub reply: String,
}

/// Request payload for voice-memo extraction. The clip rides inline as
/// base64; it is handed to the provider as-is, never decoded server-side.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ExtractRequest {
    /// Base64-encoded audio clip.
    #[validate(length(min = 1, message = "Audio clip must not be empty"))]
    pub audio: String,

    /// Audio MIME type, e.g. "audio/webm".
    #[validate(length(min = 1, max = 100, message = "MIME type is required"))]
    pub mime_type: String,
}

/// Structured fields pulled from a recorded voice memo. Only the name is
/// required by the response schema; the rest are best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedication {
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
}

impl ExtractedMedication {
    /// Applies the fallback defaults for absent optional fields.
    pub fn time_or_default(&self) -> String {
        match &self.time {
            Some(t) if shared_time_is_valid(t) => t.clone(),
            _ => "08:00".to_string(),
        }
    }
}

fn shared_time_is_valid(t: &str) -> bool {
    crate::models::medication::is_valid_time_of_day(t)
}

/// Prefilled form values returned to the client after extraction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExtractResponse {
    pub name: String,
    pub dosage: String,
    pub time: String,
    pub remarks: Option<String>,
    pub assigned_to: Uuid,
}

/// Resolves a spoken assignee name against the hub roster.
///
/// Matching is a case-insensitive substring test in both directions, and the
/// first roster entry that matches wins. When nothing matches, or no name was
/// extracted, the first member is the default assignee. Returns None only for
/// an empty roster.
pub fn match_assignee(spoken: Option<&str>, roster: &[ProfilePublic]) -> Option<Uuid> {
    let first = roster.first()?.user_id;
    let spoken = match spoken {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => return Some(first),
    };
    for member in roster {
        let name = member.display_name.to_lowercase();
        if name.contains(&spoken) || spoken.contains(&name) {
            return Some(member.user_id);
        }
    }
    Some(first)
}

/// Daily care-line response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CareLineResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> Vec<ProfilePublic> {
        names
            .iter()
            .map(|n| ProfilePublic {
                user_id: Uuid::new_v4(),
                display_name: n.to_string(),
                avatar_index: 0,
            })
            .collect()
    }

    #[test]
    fn test_match_assignee_case_insensitive_substring() {
        let members = roster(&["Grandma Rose", "Tom"]);
        assert_eq!(
            match_assignee(Some("rose"), &members),
            Some(members[0].user_id)
        );
        assert_eq!(
            match_assignee(Some("TOM"), &members),
            Some(members[1].user_id)
        );
    }

    #[test]
    fn test_match_assignee_spoken_longer_than_roster_name() {
        let members = roster(&["Tom", "Maria"]);
        // "tom smith" contains "tom"
        assert_eq!(
            match_assignee(Some("Tom Smith"), &members),
            Some(members[0].user_id)
        );
    }

    #[test]
    fn test_match_assignee_first_match_wins() {
        let members = roster(&["Anna", "Annabel"]);
        assert_eq!(
            match_assignee(Some("anna"), &members),
            Some(members[0].user_id)
        );
    }

    #[test]
    fn test_match_assignee_falls_back_to_first_member() {
        let members = roster(&["Tom", "Maria"]);
        assert_eq!(
            match_assignee(Some("nobody"), &members),
            Some(members[0].user_id)
        );
        assert_eq!(match_assignee(None, &members), Some(members[0].user_id));
        assert_eq!(match_assignee(Some("  "), &members), Some(members[0].user_id));
    }

    #[test]
    fn test_match_assignee_empty_roster() {
        assert_eq!(match_assignee(Some("tom"), &[]), None);
    }

    #[test]
    fn test_extracted_time_defaults() {
        let med = ExtractedMedication {
            name: "Aspirin".to_string(),
            dosage: None,
            time: None,
            remarks: None,
            assigned_to_name: None,
        };
        assert_eq!(med.time_or_default(), "08:00");

        let med = ExtractedMedication {
            time: Some("19:30".to_string()),
            ..med
        };
        assert_eq!(med.time_or_default(), "19:30");

        let med = ExtractedMedication {
            time: Some("evening".to_string()),
            ..med
        };
        assert_eq!(med.time_or_default(), "08:00");
    }

    #[test]
    fn test_extracted_medication_deserializes_camel_case() {
        let json = r#"{"name":"Lisinopril","dosage":"10mg","assignedToName":"Grandpa"}"#;
        let med: ExtractedMedication = serde_json::from_str(json).unwrap();
        assert_eq!(med.name, "Lisinopril");
        assert_eq!(med.assigned_to_name.as_deref(), Some("Grandpa"));
        assert!(med.time.is_none());
    }
}
