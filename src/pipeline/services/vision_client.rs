//! Frame analysis against an OpenAI-compatible chat-completions endpoint.
//!
//! Each frame goes out as one user message holding the analysis instructions
//! and the image as a data URL. The model is asked for a JSON object, which is
//! parsed leniently into an [`AnalysisResult`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::Frame;
use crate::config::AnalysisSettings;
use crate::error::{AnalysisError, AppError};
use crate::pipeline::domain::AnalysisResult;
use crate::pipeline::orchestration::FrameAnalyzer;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ANALYSIS_PROMPT: &str = r##"You are an expert game analyst. Analyze this game screenshot as accurately as possible.

How to identify the character the player controls:
1. The HUD comes first: skill icons at the bottom centre, the character portrait at the bottom left, health/mana/experience bars, item slots and the level display.
2. Then the camera: the character centred in a third-person view, the one the camera follows, the one that appears to be under player control.
3. Game specific cues: in League of Legends the champion portrait and skill icons in the bottom HUD, in Dota 2 the hero portrait and skill bar at the bottom left, in Overwatch the ability icons and health bar at the bottom, in Valorant the agent ability icons at the bottom right.

Work in this order: identify the game, identify the player character from that game's HUD, cross-check against the camera. Use only what is visible on screen, do not guess, and say "uncertain" when unsure.

Reply with a JSON object of this shape:
{
  "confidence": "high | medium | low",
  "game": "game name",
  "ui_analysis": {
    "skill_icons_visible": "true | false",
    "character_portrait_visible": "true | false",
    "health_mana_bars_visible": "true | false",
    "ui_layout": "description of the HUD layout"
  },
  "characters": {
    "player": "player character, identified from the HUD",
    "player_confidence": "high | medium | low",
    "identification_method": "how the player character was identified",
    "allies": ["allied characters"],
    "enemies": ["enemy characters"]
  },
  "situation": {
    "action": "what is happening",
    "gamePhase": "early | mid | late",
    "playerStatus": {
      "health": "health",
      "mana": "mana",
      "level": "level",
      "gold": "gold, if visible",
      "items": ["items"]
    }
  },
  "map": {
    "location": "where on the map",
    "features": ["terrain features"]
  },
  "tags": ["#tag1", "#tag2", "#tag3", "#tag4", "#tag5"],
  "summary": "one sentence summary of the scene",
  "analysis_notes": "anything notable about the analysis"
}

Rules: mark the player character "uncertain" if it is not clear, set confidence to "low" when the HUD is unclear, mark anything not visible as "not visible", and base every identification on evidence in the screenshot."##;

pub struct OpenAiVisionAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    request_size_limit: usize,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiVisionAnalyzer {
    pub fn new(settings: &AnalysisSettings) -> Result<Self, AppError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::AnalysisClient(
                    "no API key configured, set analysis.api_key or OPENAI_API_KEY".to_string(),
                )
            })?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::AnalysisClient(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            temperature: settings.temperature,
            request_size_limit: settings.request_size_limit_bytes,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, image_url: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": ANALYSIS_PROMPT },
                    { "type": "image_url", "image_url": { "url": image_url } }
                ]
            }],
            "response_format": { "type": "json_object" },
            "temperature": self.temperature,
        })
    }
}

#[async_trait]
impl FrameAnalyzer for OpenAiVisionAnalyzer {
    async fn analyze(&self, frame: &Frame) -> Result<AnalysisResult, AnalysisError> {
        let image_url = frame.to_data_url();
        if image_url.len() > self.request_size_limit {
            return Err(AnalysisError::PayloadTooLarge {
                size: image_url.len(),
                limit: self.request_size_limit,
            });
        }

        let url = format!("{}/chat/completions", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&image_url))
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(AnalysisError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let content = completion_content(&body)?;
        parse_analysis(&content)
    }

    fn name(&self) -> &'static str {
        "openai-vision"
    }
}

/// The service's `error.message`, or the raw body when it sent something else.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error details".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

/// Pulls the first choice's message text out of a completion body.
pub fn completion_content(body: &str) -> Result<String, AnalysisError> {
    let completion: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::Unparseable(e.to_string()))?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AnalysisError::EmptyResponse)
}

pub fn parse_analysis(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| AnalysisError::Unparseable(e.to_string()))?;
    if !value.is_object() {
        return Err(AnalysisError::Unparseable(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| AnalysisError::Unparseable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            api_key: Some("sk-test".to_string()),
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn refuses_to_build_without_a_key() {
        let settings = AnalysisSettings {
            api_key: Some("  ".to_string()),
            ..AnalysisSettings::default()
        };
        assert!(matches!(
            OpenAiVisionAnalyzer::new(&settings),
            Err(AppError::AnalysisClient(_))
        ));
    }

    #[test]
    fn request_carries_prompt_image_and_json_mode() {
        let analyzer = OpenAiVisionAnalyzer::new(&settings()).unwrap();
        let body = analyzer.request_body("data:image/jpeg;base64,AAAA");

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["response_format"]["type"], "json_object");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        let temperature = body["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
    }

    #[test]
    fn prompt_carries_the_whole_response_schema() {
        for key in ["\"confidence\"", "\"playerStatus\"", "\"analysis_notes\"", "\"#tag5\""] {
            assert!(ANALYSIS_PROMPT.contains(key), "prompt is missing {key}");
        }
        assert!(ANALYSIS_PROMPT.ends_with("evidence in the screenshot."));
    }

    #[test]
    fn extracts_completion_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"game\": \"LoL\"}"}}]}"#;
        let content = completion_content(body).unwrap();
        let result = parse_analysis(&content).unwrap();
        assert_eq!(result.game(), Some("LoL"));
    }

    #[test]
    fn empty_completions_are_reported() {
        assert_eq!(
            completion_content(r#"{"choices": []}"#),
            Err(AnalysisError::EmptyResponse)
        );
        assert_eq!(
            completion_content(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(AnalysisError::EmptyResponse)
        );
    }

    #[test]
    fn non_json_content_is_unparseable() {
        assert!(matches!(
            parse_analysis("Sorry, I can't help with that."),
            Err(AnalysisError::Unparseable(_))
        ));
        assert!(matches!(
            parse_analysis("[1, 2, 3]"),
            Err(AnalysisError::Unparseable(_))
        ));
    }

    #[test]
    fn error_message_prefers_service_detail() {
        let body = r#"{"error": {"message": "Invalid image", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid image");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "no error details");
    }

    #[tokio::test]
    async fn oversized_frames_are_refused_locally() {
        let settings = AnalysisSettings {
            request_size_limit_bytes: 16,
            ..settings()
        };
        let analyzer = OpenAiVisionAnalyzer::new(&settings).unwrap();
        let frame = Frame::captured(1.0, Bytes::from(vec![0u8; 64]));
        assert!(matches!(
            analyzer.analyze(&frame).await,
            Err(AnalysisError::PayloadTooLarge { limit: 16, .. })
        ));
    }
}
