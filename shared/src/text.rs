//! Localized labels.
//!
//! The presenter receives a [`TextProvider`]; nothing in the pipeline reads
//! language state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ta,
    Kn,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ta, Language::Kn];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ta => "ta",
            Language::Kn => "kn",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ta => "தமிழ் (Tamil)",
            Language::Kn => "ಕನ್ನಡ (Kannada)",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

/// Key to display string lookup.
pub trait TextProvider {
    /// Returns the text for `key`, or `key` itself when nothing matches.
    fn text<'a>(&'a self, key: &'a str) -> &'a str;
}

/// Built-in tables: the selected language, then English, then the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTextProvider {
    language: Language,
}

impl StaticTextProvider {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl TextProvider for StaticTextProvider {
    fn text<'a>(&'a self, key: &'a str) -> &'a str {
        lookup(table(self.language), key)
            .or_else(|| lookup(EN, key))
            .unwrap_or(key)
    }
}

fn table(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => EN,
        Language::Ta => TA,
        Language::Kn => KN,
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find_map(|(k, v)| (*k == key).then_some(*v))
}

const EN: &[(&str, &str)] = &[
    ("appTitle", "Farm Assistant"),
    ("cropData", "Crop Data"),
    ("weatherInfo", "Weather Information"),
    ("diseaseCheckup", "Plant Disease Checkup"),
    ("pestSolution", "Plant Pest Solution"),
    ("pestCheckup", "Pest Checkup"),
    ("pestPrediction", "Plant Pest Prediction"),
    ("yieldCheckup", "Plant Yield Checkup"),
    ("selectLanguage", "Select Language"),
    ("close", "Close"),
    ("diseaseIdentified", "Disease Identified:"),
    ("pestIdentified", "Pest Identified:"),
    ("explanation", "Explanation:"),
    ("controlMeasures", "Control Measures:"),
    ("recommendedPesticide", "Recommended Pesticide:"),
    ("aiExplanation", "AI Explanation:"),
    ("pestImage", "Pest Image:"),
    ("pestRisk", "Pest Risk:"),
    ("plantName", "Plant:"),
    ("processing", "Processing..."),
    ("requestingPermission", "Requesting camera permission..."),
    ("noCameraAccess", "No access to camera"),
    ("grantPermission", "Grant Permission"),
    ("loadingWeather", "Loading Weather..."),
];

const TA: &[(&str, &str)] = &[
    ("appTitle", "பண்ணை உதவியாளர்"),
    ("cropData", "பயிர் தரவு"),
    ("weatherInfo", "வானிலை தகவல்"),
    ("diseaseCheckup", "தாவர நோய் பரிசோதனை"),
    ("pestSolution", "தாவர பூச்சி தீர்வு"),
    ("yieldCheckup", "தாவர விளைச்சல் பரிசோதனை"),
    ("selectLanguage", "மொழியை தேர்ந்தெடு"),
    ("close", "மூடு"),
];

const KN: &[(&str, &str)] = &[
    ("appTitle", "ಕೃಷಿ ಸಹಾಯಕ"),
    ("cropData", "ಬೆಳೆ ಡೇಟಾ"),
    ("weatherInfo", "ಹವಾಮಾನ ಮಾಹಿತಿ"),
    ("diseaseCheckup", "ಗಿಡ ರೋಗ ಪರೀಕ್ಷೆ"),
    ("pestSolution", "ಗಿಡ ಕೀಟ ಪರಿಹಾರ"),
    ("yieldCheckup", "ಗಿಡ ಇಳುವರಿ ಪರೀಕ್ಷೆ"),
    ("selectLanguage", "ಭಾಷೆ ಆಯ್ಕೆಮಾಡಿ"),
    ("close", "ಮುಚ್ಚಿ"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_language_wins() {
        let ta = StaticTextProvider::new(Language::Ta);
        assert_eq!(ta.text("close"), "மூடு");

        let kn = StaticTextProvider::new(Language::Kn);
        assert_eq!(kn.text("appTitle"), "ಕೃಷಿ ಸಹಾಯಕ");
    }

    #[test]
    fn test_falls_back_to_english_then_key() {
        let kn = StaticTextProvider::new(Language::Kn);
        assert_eq!(kn.text("diseaseIdentified"), "Disease Identified:");
        assert_eq!(kn.text("noSuchKey"), "noSuchKey");
    }

    #[test]
    fn test_every_translation_has_english_source() {
        for key in TA.iter().chain(KN).map(|(k, _)| k) {
            assert!(lookup(EN, key).is_some(), "missing english text for {key}");
        }
    }

    #[test]
    fn test_language_codes() {
        for lang in Language::ALL {
            assert_eq!(Language::from_code(lang.code()), Some(lang));
        }
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::Ta.label(), "தமிழ் (Tamil)");
    }
}
