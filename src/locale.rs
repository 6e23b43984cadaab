/// Language used for prompts and fallback text.
/// Russian is the app's primary language; every other tag gets English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale
{   Ru
  , En
}

impl Locale
{   pub fn from_tag(tag: &str) -> Self
    {   let tag = tag.trim().to_ascii_lowercase();
        if tag == "ru" || tag.starts_with("ru-") || tag.starts_with("ru_")
        {   Locale::Ru
        } else
        {   Locale::En
        }
    }

    pub fn tag(&self) -> &'static str
    {   match self
        {   Locale::Ru => "ru"
          , Locale::En => "en"
        }
    }

    /// Pick the string for this locale
    pub fn pick<'a>(&self, ru: &'a str, en: &'a str) -> &'a str
    {   match self
        {   Locale::Ru => ru
          , Locale::En => en
        }
    }
}
