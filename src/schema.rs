//! Lenient field shapes for JSON produced by the model

use serde::Deserialize;

/// A field the model sends either as a string or as a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar
{   Text(String)
  , Number(serde_json::Number)
}

impl Scalar
{   pub fn into_text(self) -> String
    {   match self
        {   Scalar::Text(s) => s.trim().to_string()
          , Scalar::Number(n) => n.to_string()
        }
    }
}

/// A field the model sends either as one string or as an array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextOrList
{   Text(String)
  , List(Vec<serde_json::Value>)
}

fn value_text(value: serde_json::Value) -> Option<String>
{   let text = match value
    {   serde_json::Value::String(s) => s
      , serde_json::Value::Null => return None
      , other => other.to_string()
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

impl TextOrList
{   /// Comma-separated text becomes a list
    pub fn into_split_list(self) -> Vec<String>
    {   match self
        {   TextOrList::Text(s) => s
              .split(',')
              .map(|m| m.trim())
              .filter(|m| !m.is_empty())
              .map(str::to_string)
              .collect()
          , TextOrList::List(items) => items
              .into_iter()
              .filter_map(value_text)
              .collect()
        }
    }

    /// Text is kept whole as a single item
    pub fn into_list(self) -> Vec<String>
    {   match self
        {   TextOrList::Text(s) => value_text(serde_json::Value::String(s))
              .into_iter()
              .collect()
          , TextOrList::List(items) => items
              .into_iter()
              .filter_map(value_text)
              .collect()
        }
    }

    /// Items are joined with `separator`
    pub fn into_joined(self, separator: &str) -> String
    {   self.into_list().join(separator)
    }
}

/// Strip a ```json fence some models wrap around JSON output
pub fn strip_code_fence(content: &str) -> &str
{   let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```")
    else
    {   return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn muscles_string_is_split_on_commas()
    {   let field: TextOrList = serde_json::from_str(r#""Chest, Shoulders,, Triceps ""#).unwrap();
        assert_eq!(field.into_split_list(), vec!["Chest", "Shoulders", "Triceps"]);
    }

    #[test]
    fn numeric_sets_become_text()
    {   let field: Scalar = serde_json::from_str("4").unwrap();
        assert_eq!(field.into_text(), "4");
    }

    #[test]
    fn fenced_json_is_unwrapped()
    {   assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence(" {\"a\":1} "), "{\"a\":1}");
    }
}
