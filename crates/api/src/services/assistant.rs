//! Assistant features backed by a hosted completion model.
//!
//! Three surfaces share one provider: free-form caregiver chat, structured
//! medication extraction from a recorded voice memo, and a daily "care line"
//! message cached per hub per day. The provider sits behind [`CompletionApi`]
//! so handlers and tests never talk to the network directly.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use domain::models::assistant::{
    match_assignee, ChatMessage, ChatRole, ExtractResponse, ExtractedMedication,
};
use domain::models::profile::ProfilePublic;

use crate::config::AssistantConfig;

/// Shown when the provider is disabled or unreachable.
pub const CARE_LINE_FALLBACK: &str =
    "Small routines make a big difference. Check in on each other today.";

const CHAT_SYSTEM_PROMPT: &str = "You are a warm, practical assistant for a family \
medication tracker. Answer questions about medication routines, reminders and \
caregiving in plain language. You are not a doctor: for dosage changes, side \
effects or anything clinical, tell the user to ask a pharmacist or physician. \
Keep answers short.";

const EXTRACT_SYSTEM_PROMPT: &str = "Listen to the recording and extract a single \
medication entry. Respond with JSON only. Fields: name (required), dosage, time \
(24-hour HH:mm), remarks, assignedToName (the person the medication is for, \
if mentioned). Omit fields the recording does not state.";

const CARE_LINE_SYSTEM_PROMPT: &str = "Write one short, encouraging sentence for a \
family sharing a medication schedule. No medical advice, no emoji, at most 20 words.";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Assistant is not configured")]
    Disabled,
    #[error("Completion provider request failed: {0}")]
    Provider(String),
    #[error("Could not extract a medication from the recording")]
    ExtractionFailed,
    #[error("Hub has no members to assign the medication to")]
    EmptyRoster,
}

/// Inline audio attached to the final user turn, passed to the provider
/// still base64-encoded.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub mime_type: String,
    pub data: String,
}

/// A single completion request to the provider.
#[derive(Debug, Clone)]
pub struct CompletionPrompt {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub audio: Option<AudioClip>,
    /// When set, the provider is asked for JSON matching this schema.
    pub json_schema: Option<Value>,
}

impl CompletionPrompt {
    pub fn chat(system: String, history: Vec<ChatMessage>, message: String) -> Self {
        let mut messages = history;
        messages.push(ChatMessage {
            role: ChatRole::User,
            text: message,
        });
        Self {
            system,
            messages,
            audio: None,
            json_schema: None,
        }
    }

    pub fn transcribe(system: &str, audio: AudioClip, schema: Value) -> Self {
        Self {
            system: system.to_string(),
            messages: Vec::new(),
            audio: Some(audio),
            json_schema: Some(schema),
        }
    }
}

/// Seam between assistant features and the hosted model.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    async fn complete(&self, prompt: CompletionPrompt) -> Result<String, AssistantError>;
}

/// Provider used when the assistant section is disabled in config.
pub struct DisabledCompletionApi;

#[async_trait]
impl CompletionApi for DisabledCompletionApi {
    async fn complete(&self, _prompt: CompletionPrompt) -> Result<String, AssistantError> {
        Err(AssistantError::Disabled)
    }
}

/// Gemini generateContent client.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AssistantError::Provider(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_body(prompt: &CompletionPrompt) -> Value {
        let mut contents: Vec<Value> = prompt
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "model",
                };
                json!({ "role": role, "parts": [{ "text": m.text }] })
            })
            .collect();

        if let Some(clip) = &prompt.audio {
            contents.push(json!({
                "role": "user",
                "parts": [{
                    "inline_data": { "mime_type": clip.mime_type, "data": clip.data }
                }]
            }));
        }

        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": contents,
        });
        if let Some(schema) = &prompt.json_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }
        body
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl CompletionApi for GeminiClient {
    async fn complete(&self, prompt: CompletionPrompt) -> Result<String, AssistantError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .http
            .post(&url)
            .json(&Self::request_body(&prompt))
            .send()
            .await
            .map_err(|e| AssistantError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Completion provider returned an error");
            return Err(AssistantError::Provider(format!(
                "provider returned {status}"
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Provider(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(AssistantError::Provider("empty completion".to_string()));
        }
        Ok(text)
    }
}

/// One care line per account per calendar day.
#[derive(Default)]
pub struct CareLineCache {
    entries: RwLock<HashMap<(Uuid, NaiveDate), String>>,
}

impl CareLineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: Uuid, date: NaiveDate) -> Option<String> {
        match self.entries.read() {
            Ok(entries) => entries.get(&(user_id, date)).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&(user_id, date)).cloned(),
        }
    }

    pub fn insert(&self, user_id: Uuid, date: NaiveDate, message: String) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Yesterday's lines are dead weight once the day rolls over
        entries.retain(|(_, d), _| *d >= date);
        entries.insert((user_id, date), message);
    }
}

/// Runs chat, extraction and the care line against a provider.
pub struct AssistantService<'a> {
    api: &'a dyn CompletionApi,
}

/// Caller context woven into the chat system instruction.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub display_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    /// "name dosage at time" lines for the caller's board, listing order.
    pub medications: Vec<String>,
}

impl ChatContext {
    fn render(&self) -> String {
        let mut out = format!("\n\nYou are talking to {}", self.display_name);
        if let Some(age) = self.age {
            out.push_str(&format!(", age {}", age));
        }
        if let Some(gender) = &self.gender {
            out.push_str(&format!(" ({})", gender));
        }
        out.push('.');
        if self.medications.is_empty() {
            out.push_str(" Their family's medication board is currently empty.");
        } else {
            out.push_str(" Their family's medication board:\n");
            for line in &self.medications {
                out.push_str(&format!("- {}\n", line));
            }
        }
        out
    }
}

impl<'a> AssistantService<'a> {
    pub fn new(api: &'a dyn CompletionApi) -> Self {
        Self { api }
    }

    pub async fn chat(
        &self,
        context: ChatContext,
        history: Vec<ChatMessage>,
        message: String,
    ) -> Result<String, AssistantError> {
        let system = format!("{}{}", CHAT_SYSTEM_PROMPT, context.render());
        let prompt = CompletionPrompt::chat(system, history, message);
        self.api.complete(prompt).await
    }

    /// Turns a recorded voice memo into a ready-to-save medication draft,
    /// resolving the spoken assignee against the hub roster.
    pub async fn extract(
        &self,
        audio: AudioClip,
        roster: &[ProfilePublic],
    ) -> Result<ExtractResponse, AssistantError> {
        if roster.is_empty() {
            return Err(AssistantError::EmptyRoster);
        }

        let prompt =
            CompletionPrompt::transcribe(EXTRACT_SYSTEM_PROMPT, audio, extraction_schema());
        let raw = self.api.complete(prompt).await?;
        let extracted = parse_extraction(&raw).ok_or(AssistantError::ExtractionFailed)?;

        let assigned_to = match_assignee(extracted.assigned_to_name.as_deref(), roster)
            .ok_or(AssistantError::EmptyRoster)?;

        Ok(ExtractResponse {
            name: extracted.name.clone(),
            dosage: extracted.dosage.clone().unwrap_or_default(),
            time: extracted.time_or_default(),
            remarks: extracted.remarks.clone(),
            assigned_to,
        })
    }

    /// Returns the caller's care line for `date`, generating it at most once
    /// per day. Provider failures degrade to a fixed message and are not
    /// cached, so a later request may still get a generated line.
    pub async fn care_line(
        &self,
        cache: &CareLineCache,
        user_id: Uuid,
        date: NaiveDate,
        member_names: &[String],
    ) -> String {
        if let Some(cached) = cache.get(user_id, date) {
            return cached;
        }

        let input = format!(
            "Family members: {}. Date: {}.",
            member_names.join(", "),
            date
        );
        let prompt = CompletionPrompt::chat(CARE_LINE_SYSTEM_PROMPT.to_string(), Vec::new(), input);
        match self.api.complete(prompt).await {
            Ok(line) => {
                let line = line.trim().to_string();
                cache.insert(user_id, date, line.clone());
                line
            }
            Err(err) => {
                debug!(error = %err, user_id = %user_id, "Care line generation failed, using fallback");
                CARE_LINE_FALLBACK.to_string()
            }
        }
    }
}

fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "dosage": { "type": "string" },
            "time": { "type": "string" },
            "remarks": { "type": "string" },
            "assignedToName": { "type": "string" }
        },
        "required": ["name"]
    })
}

/// Parses the provider's JSON answer, tolerating markdown code fences.
fn parse_extraction(raw: &str) -> Option<ExtractedMedication> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```").trim())
        .unwrap_or(trimmed);
    let extracted: ExtractedMedication = serde_json::from_str(body).ok()?;
    if extracted.name.trim().is_empty() {
        return None;
    }
    Some(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedApi {
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl CompletionApi for CannedApi {
        async fn complete(&self, _prompt: CompletionPrompt) -> Result<String, AssistantError> {
            self.reply
                .clone()
                .map_err(|_| AssistantError::Provider("down".to_string()))
        }
    }

    fn member(name: &str) -> ProfilePublic {
        ProfilePublic {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            avatar_index: 0,
        }
    }

    #[test]
    fn test_parse_extraction_plain_json() {
        let parsed =
            parse_extraction(r#"{"name": "Aspirin", "dosage": "100mg", "time": "09:30"}"#)
                .expect("should parse");
        assert_eq!(parsed.name, "Aspirin");
        assert_eq!(parsed.dosage.as_deref(), Some("100mg"));
        assert_eq!(parsed.time_or_default(), "09:30");
    }

    #[test]
    fn test_parse_extraction_strips_code_fence() {
        let raw = "```json\n{\"name\": \"Metformin\"}\n```";
        let parsed = parse_extraction(raw).expect("should parse");
        assert_eq!(parsed.name, "Metformin");
        assert_eq!(parsed.time_or_default(), "08:00");
    }

    #[test]
    fn test_parse_extraction_rejects_blank_name() {
        assert!(parse_extraction(r#"{"name": "  "}"#).is_none());
        assert!(parse_extraction("not json at all").is_none());
    }

    fn clip() -> AudioClip {
        AudioClip {
            mime_type: "audio/webm".to_string(),
            data: "c29tZSBhdWRpbw==".to_string(),
        }
    }

    #[tokio::test]
    async fn test_extract_resolves_assignee() {
        let api = CannedApi {
            reply: Ok(r#"{"name": "Aspirin", "assignedToName": "Grandma"}"#.to_string()),
        };
        let roster = vec![member("Dad"), member("Grandma Rose")];
        let service = AssistantService::new(&api);

        let draft = service
            .extract(clip(), &roster)
            .await
            .expect("extraction should succeed");
        assert_eq!(draft.name, "Aspirin");
        assert_eq!(draft.assigned_to, roster[1].user_id);
        assert_eq!(draft.time, "08:00");
    }

    #[tokio::test]
    async fn test_extract_requires_roster() {
        let api = CannedApi {
            reply: Ok(r#"{"name": "Aspirin"}"#.to_string()),
        };
        let service = AssistantService::new(&api);
        let result = service.extract(clip(), &[]).await;
        assert!(matches!(result, Err(AssistantError::EmptyRoster)));
    }

    #[tokio::test]
    async fn test_care_line_caches_per_day() {
        let api = CannedApi {
            reply: Ok("You are doing great together.".to_string()),
        };
        let service = AssistantService::new(&api);
        let cache = CareLineCache::new();
        let hub_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let names = vec!["Dad".to_string()];

        let first = service.care_line(&cache, hub_id, date, &names).await;
        assert_eq!(first, "You are doing great together.");
        assert_eq!(cache.get(hub_id, date), Some(first.clone()));

        // A failing provider no longer matters once the line is cached
        let down = CannedApi { reply: Err(()) };
        let second = AssistantService::new(&down)
            .care_line(&cache, hub_id, date, &names)
            .await;
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_care_line_falls_back_when_provider_fails() {
        let api = CannedApi { reply: Err(()) };
        let service = AssistantService::new(&api);
        let cache = CareLineCache::new();
        let hub_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let line = service
            .care_line(&cache, hub_id, date, &["Dad".to_string()])
            .await;
        assert_eq!(line, CARE_LINE_FALLBACK);
        // Fallbacks are not cached
        assert_eq!(cache.get(hub_id, date), None);
    }

    #[test]
    fn test_cache_evicts_older_days() {
        let cache = CareLineCache::new();
        let hub_id = Uuid::new_v4();
        let yesterday = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        cache.insert(hub_id, yesterday, "old".to_string());
        cache.insert(hub_id, today, "new".to_string());
        assert_eq!(cache.get(hub_id, yesterday), None);
        assert_eq!(cache.get(hub_id, today), Some("new".to_string()));
    }

    #[test]
    fn test_request_body_carries_inline_audio_and_schema() {
        let prompt = CompletionPrompt::transcribe("system", clip(), extraction_schema());
        let body = GeminiClient::request_body(&prompt);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["contents"][0]["parts"][0]["inline_data"]["mime_type"],
            "audio/webm"
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_chat_context_renders_board() {
        let context = ChatContext {
            display_name: "Maria".to_string(),
            age: Some(34),
            gender: Some("female".to_string()),
            medications: vec!["Aspirin 100mg at 08:00".to_string()],
        };
        let rendered = context.render();
        assert!(rendered.contains("Maria"));
        assert!(rendered.contains("age 34"));
        assert!(rendered.contains("Aspirin 100mg at 08:00"));
    }
}
