use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::endpoint::Endpoint;
use crate::gate::CapabilityGate;
use crate::pipeline::DiagnosticPipeline;
use crate::text::Language;
use crate::weather::WeatherState;

/// Generation of a screen. Bumped on every reset so shell answers addressed
/// to an earlier mount can be told apart from current ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenInstance(u64);

impl ScreenInstance {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for ScreenInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything one diagnostic screen owns between mount and unmount.
#[derive(Debug, Clone)]
pub struct DiagnosticScreen {
    pub instance: ScreenInstance,
    pub pipeline: DiagnosticPipeline,
    pub gate: CapabilityGate,
    /// Live camera preview is open.
    pub camera_visible: bool,
    /// A capture or gallery pick is waiting on the shell.
    pub acquisition_pending: bool,
    pub mounted: bool,
}

impl DiagnosticScreen {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            instance: ScreenInstance::default(),
            pipeline: DiagnosticPipeline::new(endpoint),
            gate: CapabilityGate::default(),
            camera_visible: false,
            acquisition_pending: false,
            mounted: false,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.pipeline.endpoint()
    }

    /// Drops media, result and permission bookkeeping. The next mount starts
    /// a fresh screen instance.
    pub fn reset(&mut self) {
        let instance = self.instance.next();
        *self = Self::new(self.endpoint());
        self.instance = instance;
    }

    /// True when a shell answer issued for `instance` still belongs here.
    pub fn is_current(&self, instance: ScreenInstance) -> bool {
        self.mounted && self.instance == instance
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub config: AppConfig,
    pub language: Language,

    pub disease: DiagnosticScreen,
    pub pest_image: DiagnosticScreen,
    pub pest_lookup: DiagnosticScreen,
    pub pest_risk: DiagnosticScreen,

    pub weather: WeatherState,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            language: Language::default(),
            disease: DiagnosticScreen::new(Endpoint::DiseaseImage),
            pest_image: DiagnosticScreen::new(Endpoint::PestImage),
            pest_lookup: DiagnosticScreen::new(Endpoint::PestQuery),
            pest_risk: DiagnosticScreen::new(Endpoint::PestRisk),
            weather: WeatherState::NotLoaded,
        }
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            language: config.default_language,
            config,
            ..Self::new()
        }
    }

    pub fn screen(&self, endpoint: Endpoint) -> &DiagnosticScreen {
        match endpoint {
            Endpoint::DiseaseImage => &self.disease,
            Endpoint::PestImage => &self.pest_image,
            Endpoint::PestQuery => &self.pest_lookup,
            Endpoint::PestRisk => &self.pest_risk,
        }
    }

    pub fn screen_mut(&mut self, endpoint: Endpoint) -> &mut DiagnosticScreen {
        match endpoint {
            Endpoint::DiseaseImage => &mut self.disease,
            Endpoint::PestImage => &mut self.pest_image,
            Endpoint::PestQuery => &mut self.pest_lookup,
            Endpoint::PestRisk => &mut self.pest_risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineState;

    #[test]
    fn test_screens_are_keyed_by_endpoint() {
        let model = Model::new();
        for endpoint in Endpoint::ALL {
            assert_eq!(model.screen(endpoint).endpoint(), endpoint);
        }
    }

    #[test]
    fn test_reset_starts_fresh_instance() {
        let mut model = Model::new();
        let screen = model.screen_mut(Endpoint::PestQuery);
        screen.mounted = true;
        screen.pipeline.set_query("aphid");
        screen.pipeline.submit(None);
        assert!(screen.pipeline.state().error().is_some());

        let before = screen.instance;
        screen.reset();
        assert_ne!(screen.instance, before);
        assert!(!screen.mounted);
        assert_eq!(screen.pipeline.query(), "");
        assert_eq!(screen.pipeline.state(), &PipelineState::Idle);
    }

    #[test]
    fn test_answers_from_earlier_instance_are_not_current() {
        let mut screen = DiagnosticScreen::new(Endpoint::DiseaseImage);
        screen.reset();
        screen.mounted = true;
        let first = screen.instance;
        assert!(screen.is_current(first));

        screen.reset();
        screen.mounted = true;
        assert!(!screen.is_current(first));
        assert!(screen.is_current(screen.instance));
    }

    #[test]
    fn test_config_language_becomes_initial_language() {
        let config = AppConfig::default().with_language(Language::Kn);
        assert_eq!(Model::with_config(config).language, Language::Kn);
    }
}
