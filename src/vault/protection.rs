use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a seed is stored and how often the user must confirm its use.
///
/// - `Simple`: software key, no prompts, survives PIN changes
/// - `SinglePrompt`: one confirmation per session before signing
/// - `PromptEveryTime`: confirmation on storage and on every signature
/// - `CloudBacked`: backed up to platform cloud storage (opt-in)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionLevel {
    #[default]
    Simple,
    SinglePrompt,
    PromptEveryTime,
    CloudBacked,
}

impl ProtectionLevel {
    pub const ALL: [ProtectionLevel; 4] = [
        ProtectionLevel::Simple,
        ProtectionLevel::SinglePrompt,
        ProtectionLevel::PromptEveryTime,
        ProtectionLevel::CloudBacked,
    ];

    /// Whether storing a new seed at this level needs confirmation
    pub fn confirms_on_store(&self) -> bool {
        matches!(self, Self::PromptEveryTime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::SinglePrompt => "singleprompt",
            Self::PromptEveryTime => "prompt",
            Self::CloudBacked => "cloud",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "simple" => Ok(Self::Simple),
            "singleprompt" => Ok(Self::SinglePrompt),
            "prompt" | "prompteverytime" => Ok(Self::PromptEveryTime),
            "cloud" | "cloudbacked" => Ok(Self::CloudBacked),
            other => Err(format!("unknown protection level '{}'", other)),
        }
    }
}
