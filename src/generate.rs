//! AI-assisted snippet generation
//!
//! One-shot collaborator: a prompt goes out, a `{title, description, code}`
//! triple comes back or the call fails. No retry: a failed generation is
//! reported and the user clicks again. The HTTP call runs on a background
//! thread and the UI polls the handle without blocking.

use crate::i18n::Language;
use crate::snippet::SnippetType;
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generator API key is not configured")]
    Unconfigured,
    #[error("request failed: {0}")]
    Http(String),
    #[error("unusable response: {0}")]
    BadResponse(String),
}

/// The draft fields a successful generation populates.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
}

pub trait SnippetGenerator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        snippet_type: SnippetType,
        language: Language,
    ) -> Result<GeneratedSnippet, GenerateError>;
}

/// Generator backed by a Gemini-style `generateContent` endpoint.
pub struct HttpGenerator {
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpGenerator {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            endpoint,
            model,
            api_key,
        }
    }

    fn system_instruction(snippet_type: SnippetType, language: Language) -> String {
        let display_language = match language {
            Language::Ka => "Georgian",
            Language::En => "English",
            Language::Es => "Spanish",
        };
        format!(
            "You are an expert frontend engineer helper. The user asks for a UI \
             component, a small HTML/CSS effect, or a full website template. The \
             selected type is \"{}\".\n\
             Return a raw JSON object (no markdown fencing) with keys \"title\", \
             \"description\" and \"code\".\n\
             Rules:\n\
             1. If the type is 'website', a full HTML structure with <html>, <head> \
             and <body> is mandatory.\n\
             2. If the type is 'component', skip <html> and provide the container \
             element and its styles.\n\
             3. Inline custom CSS in <style> tags.\n\
             4. Any displayed text must be in {}.",
            snippet_type.as_str(),
            display_language
        )
    }
}

impl SnippetGenerator for HttpGenerator {
    fn generate(
        &self,
        prompt: &str,
        snippet_type: SnippetType,
        language: Language,
    ) -> Result<GeneratedSnippet, GenerateError> {
        if self.api_key.is_empty() {
            return Err(GenerateError::Unconfigured);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": format!("Create a {} for: {}", snippet_type.as_str(), prompt) }]
            }],
            "systemInstruction": {
                "parts": [{ "text": Self::system_instruction(snippet_type, language) }]
            },
            "generationConfig": { "responseMimeType": "application/json" }
        });

        tracing::debug!(model = %self.model, "Requesting snippet generation");
        let response = ureq::post(&url)
            .timeout(Duration::from_secs(60))
            .send_json(body)
            .map_err(|e| GenerateError::Http(e.to_string()))?;

        let payload: serde_json::Value = response
            .into_json()
            .map_err(|e| GenerateError::BadResponse(e.to_string()))?;

        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GenerateError::BadResponse("no candidate text".to_string()))?;

        parse_generated(text)
    }
}

/// Parse the model's JSON payload. Some models wrap JSON in markdown fences
/// despite instructions; strip those before giving up.
fn parse_generated(text: &str) -> Result<GeneratedSnippet, GenerateError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|t| t.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).map_err(|e| GenerateError::BadResponse(e.to_string()))
}

/// Handle to a single in-flight generation.
///
/// `try_result` polls without blocking; until the worker finishes it keeps
/// returning `None`.
pub struct GenerationHandle {
    receiver: Receiver<Result<GeneratedSnippet, GenerateError>>,
    #[allow(dead_code)]
    thread: JoinHandle<()>,
    done: bool,
}

impl GenerationHandle {
    pub fn try_result(&mut self) -> Option<Result<GeneratedSnippet, GenerateError>> {
        if self.done {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(GenerateError::Http(
                    "generation worker died".to_string(),
                )))
            }
        }
    }
}

/// Run one generation in the background.
pub fn spawn_generation(
    generator: Arc<dyn SnippetGenerator>,
    prompt: String,
    snippet_type: SnippetType,
    language: Language,
) -> GenerationHandle {
    let (tx, rx) = mpsc::channel();
    let thread = std::thread::spawn(move || {
        let result = generator.generate(&prompt, snippet_type, language);
        if let Err(e) = &result {
            tracing::warn!("Snippet generation failed: {e}");
        }
        let _ = tx.send(result);
    });
    GenerationHandle {
        receiver: rx,
        thread,
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator(Result<GeneratedSnippet, &'static str>);

    impl SnippetGenerator for CannedGenerator {
        fn generate(
            &self,
            _prompt: &str,
            _snippet_type: SnippetType,
            _language: Language,
        ) -> Result<GeneratedSnippet, GenerateError> {
            match &self.0 {
                Ok(snippet) => Ok(snippet.clone()),
                Err(message) => Err(GenerateError::Http(message.to_string())),
            }
        }
    }

    #[test]
    fn parses_plain_json() {
        let generated =
            parse_generated(r#"{"title":"T","description":"D","code":"<b>x</b>"}"#).unwrap();
        assert_eq!(generated.title, "T");
        assert_eq!(generated.code, "<b>x</b>");
    }

    #[test]
    fn parses_fenced_json() {
        let generated =
            parse_generated("```json\n{\"title\":\"T\",\"code\":\"<i>y</i>\"}\n```").unwrap();
        assert_eq!(generated.code, "<i>y</i>");
        assert_eq!(generated.description, "");
    }

    #[test]
    fn garbage_is_a_bad_response() {
        assert!(matches!(
            parse_generated("here is your code!"),
            Err(GenerateError::BadResponse(_))
        ));
    }

    #[test]
    fn missing_key_is_unconfigured() {
        let generator = HttpGenerator::new(
            "https://example.invalid".to_string(),
            "model".to_string(),
            String::new(),
        );
        assert!(matches!(
            generator.generate("x", SnippetType::Component, Language::En),
            Err(GenerateError::Unconfigured)
        ));
    }

    #[test]
    fn handle_delivers_result_once() {
        let generator = Arc::new(CannedGenerator(Ok(GeneratedSnippet {
            title: "T".to_string(),
            description: String::new(),
            code: "<p>ok</p>".to_string(),
        })));
        let mut handle = spawn_generation(
            generator,
            "a card".to_string(),
            SnippetType::Component,
            Language::Ka,
        );

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        let result = loop {
            if let Some(result) = handle.try_result() {
                break result;
            }
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result.unwrap().code, "<p>ok</p>");
        assert!(handle.try_result().is_none());
    }
}
