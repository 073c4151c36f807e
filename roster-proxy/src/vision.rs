use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str = r#"근무표 이미지 분석: 날짜와 배경색을 분석하여 JSON 반환.

## 절대 규칙
- B > G → "근무" (#0082EB, #57BBE7 계열)
- G > B → "휴무" (#B0BF08 계열)
- B ≥ 150 → "근무"
- G ≥ 150 and B ≤ 50 → "휴무"

## 분석 순서
1. RGB 값 추출 (R, G, B)
2. B와 G 비교 → B>G면 근무, G>B면 휴무
3. 애매하면 텍스트 색상/내용 참고

## 반환 형식
[
  {"date": "2026-01-01", "color": "색상명", "type": "휴무", "reasoning": "RGB(176,191,8): G(191)>B(8), 휴무"},
  {"date": "2026-01-02", "color": "색상명", "type": "근무", "reasoning": "RGB(0,130,235): B(235)>G(130), 근무"}
]

reasoning에 반드시 RGB(R,G,B) 형식 포함. 날짜는 2026년 기준. JSON만 반환."#;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("no image was provided")]
    Missing,
    #[error("image is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("the vision model API key is not configured")]
    MissingApiKey,
    #[error("the vision model rejected the API key (status {0})")]
    Authentication(u16),
    #[error("vision model returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to reach the vision model: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected vision model response: {0}")]
    InvalidResponse(String),
    #[error("the vision model returned an empty reply")]
    EmptyReply,
}

/// A validated roster photo, ready to be embedded in a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterImage {
    media_type: &'static str,
    base64: String,
}

impl RosterImage {
    /// Accepts bare base64 or a `data:` URL.
    pub fn from_base64(input: &str) -> Result<Self, ImageError> {
        let input = input.trim();
        let payload = match input.strip_prefix("data:") {
            Some(url) => url.split_once(',').map_or(url, |(_, data)| data),
            None => input,
        };

        if payload.is_empty() {
            return Err(ImageError::Missing);
        }

        let bytes = STANDARD.decode(payload)?;

        Ok(Self {
            media_type: sniff_media_type(&bytes),
            base64: payload.to_string(),
        })
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(&'static str),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct VisionClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl VisionClient {
    pub fn new(api_key: Option<String>, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: format!("{}{CHAT_COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            model: model.into(),
        }
    }

    /// Asks the model to read the roster and returns its raw text reply.
    pub async fn describe_roster(&self, image: &RosterImage) -> Result<String, VisionError> {
        let api_key = self.api_key.as_deref().ok_or(VisionError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(SYSTEM_PROMPT),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.data_url(),
                            detail: "low",
                        },
                    }]),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        log::debug!(
            "Sending {} roster image to {} ({})",
            image.media_type(),
            self.endpoint,
            self.model
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(VisionError::Authentication(status.as_u16()));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(VisionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| VisionError::InvalidResponse(err.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(VisionError::EmptyReply)
    }
}
