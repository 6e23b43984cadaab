use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use log::{debug, trace, error};
use crate::classify::{classify_transport, UpstreamFailure};
use crate::config::ProviderConfig;
use crate::error::ErrorKind;
use crate::request::{ContentPart, InferenceRequest, Message};
use super::{RawResponse, Transport};

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl
{   pub url: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePart
{   Text { text: String }
  , ImageUrl { image_url: ImageUrl }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WireContent
{   Text(String)
  , Parts(Vec<WirePart>)
}

#[derive(Debug, Clone, Serialize)]
pub struct WireMessage
{   pub role: &'static str
  , pub content: WireContent
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat
{   #[serde(rename = "type")]
    pub format_type: &'static str
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<WireMessage>
  , pub max_tokens: usize
  , pub temperature: f32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   #[serde(default)]
    pub message: Option<ChoiceMessage>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

fn wire_message(message: &Message) -> WireMessage
{   let content = if message.has_image()
    {   WireContent::Parts(
          message.parts
            .iter()
            .map(|p| match p
            {   ContentPart::Text(text) => WirePart::Text {
                  text: text.clone()
                }
              , ContentPart::Image(img) => WirePart::ImageUrl {
                  image_url: ImageUrl { url: img.data_url() }
                }
            })
            .collect()
        )
    } else
    {   let text = message.parts
          .iter()
          .filter_map(|p| match p
          {   ContentPart::Text(t) => Some(t.as_str())
            , ContentPart::Image(_) => None
          })
          .collect::<Vec<_>>()
          .join("\n");
        WireContent::Text(text)
    };
    WireMessage
    {   role: message.role.as_str()
      , content
    }
}

impl From<&InferenceRequest> for ChatCompletionRequest
{   fn from(request: &InferenceRequest) -> Self
    {   ChatCompletionRequest
        {   model: request.model().to_string()
          , messages: request.messages()
              .iter()
              .map(wire_message)
              .collect()
          , max_tokens: request.max_tokens()
          , temperature: request.temperature()
          , response_format: request.json_output().then_some(
              ResponseFormat { format_type: "json_object" }
            )
        }
    }
}

// ===== Transport =====

/// OpenAI-compatible `/chat/completions` transport
pub struct OpenAiTransport
{   api_base: String
  , api_key: Option<String>
  , http_client: reqwest::Client
}

impl OpenAiTransport
{   pub fn new(config: &ProviderConfig)
      -> Result<Self, crate::error::Error>
    {   debug!("Creating OpenAiTransport for {}", config.api_base);
        let http_client = reqwest::Client::builder()
          .timeout(config.timeout())
          .build()
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(OpenAiTransport
        {   api_base: config.api_base.trim_end_matches('/').to_string()
          , api_key: config.api_key.clone()
          , http_client
        })
    }

    pub fn has_api_key(&self) -> bool
    {   self.api_key.is_some()
    }
}

#[async_trait]
impl Transport for OpenAiTransport
{   async fn send(
      &self
    , request: &InferenceRequest
    ) -> Result<RawResponse, UpstreamFailure>
    {   let api_key = self.api_key.as_ref()
          .ok_or_else(|| {
            error!("No API key configured");
            UpstreamFailure::new(
              ErrorKind::InvalidCredential
            , "OpenAI API key not configured"
            )
          })?;

        let payload = ChatCompletionRequest::from(request);
        trace!(
          "Sending {} message(s) to {}",
          payload.messages.len(), payload.model
        );

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&payload)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            classify_transport(&e)
          })?;

        let status = response.status().as_u16();
        trace!("Response status: {}", status);

        let body = response.text().await
          .map_err(|e| {
            error!("Failed to read response body: {}", e);
            classify_transport(&e)
          })?;

        Ok(RawResponse::new(status, body))
    }
}
