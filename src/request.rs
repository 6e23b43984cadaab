//! Provider-neutral inference request types

use serde::{Deserialize, Serialize};
use base64::Engine;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// Image carried inline as base64
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage
{   pub mime_type: &'static str
  , pub data_base64: String
}

impl InlineImage
{   /// Encode raw bytes; MIME type is chosen from the filename only
    pub fn from_bytes(filename: &str, bytes: &[u8]) -> Self
    {   InlineImage
        {   mime_type: mime_for_filename(filename)
          , data_base64: base64::engine::general_purpose::STANDARD
              .encode(bytes)
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> String
    {   format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// `.png` is PNG, everything else is sent as JPEG
pub fn mime_for_filename(filename: &str) -> &'static str
{   let ext = Path::new(filename)
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| e.to_ascii_lowercase());
    match ext.as_deref()
    {   Some("png") => "image/png"
      , Some("jpg") | Some("jpeg") => "image/jpeg"
      , _ => "image/jpeg"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart
{   Text(String)
  , Image(InlineImage)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message
{   pub role: Role
  , pub parts: Vec<ContentPart>
}

impl Message
{   pub fn system(text: impl Into<String>) -> Self
    {   Message
        {   role: Role::System
          , parts: vec![ContentPart::Text(text.into())]
        }
    }

    pub fn user(text: impl Into<String>) -> Self
    {   Message
        {   role: Role::User
          , parts: vec![ContentPart::Text(text.into())]
        }
    }

    pub fn user_with_image(
      text: impl Into<String>
    , image: InlineImage
    ) -> Self
    {   Message
        {   role: Role::User
          , parts: vec![
              ContentPart::Text(text.into())
            , ContentPart::Image(image)
            ]
        }
    }

    pub fn has_image(&self) -> bool
    {   self.parts
          .iter()
          .any(|p| matches!(p, ContentPart::Image(_)))
    }
}

/// One logical request to the inference service.
/// Fields are read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest
{   messages: Vec<Message>
  , model: String
  , max_tokens: usize
  , temperature: f32
  , json_output: bool
}

impl InferenceRequest
{   pub fn builder(model: impl Into<String>)
      -> InferenceRequestBuilder
    {   InferenceRequestBuilder
        {   messages: Vec::new()
          , model: model.into()
          , max_tokens: 1000
          , temperature: 0.7
          , json_output: false
        }
    }

    pub fn messages(&self) -> &[Message]
    {   &self.messages
    }

    pub fn model(&self) -> &str
    {   &self.model
    }

    pub fn max_tokens(&self) -> usize
    {   self.max_tokens
    }

    pub fn temperature(&self) -> f32
    {   self.temperature
    }

    pub fn json_output(&self) -> bool
    {   self.json_output
    }
}

pub struct InferenceRequestBuilder
{   messages: Vec<Message>
  , model: String
  , max_tokens: usize
  , temperature: f32
  , json_output: bool
}

impl InferenceRequestBuilder
{   pub fn message(mut self, message: Message) -> Self
    {   self.messages.push(message);
        self
    }

    pub fn system(self, text: impl Into<String>) -> Self
    {   self.message(Message::system(text))
    }

    pub fn user(self, text: impl Into<String>) -> Self
    {   self.message(Message::user(text))
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self
    {   self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self
    {   self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Ask the service for a JSON object response
    pub fn json_output(mut self) -> Self
    {   self.json_output = true;
        self
    }

    pub fn build(self) -> InferenceRequest
    {   InferenceRequest
        {   messages: self.messages
          , model: self.model
          , max_tokens: self.max_tokens
          , temperature: self.temperature
          , json_output: self.json_output
        }
    }
}
