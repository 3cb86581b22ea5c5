use super::job::{Job, RenderMode};
use super::settings::{
    ClassifierSettings, LayoutSettings, RendererSettings, Settings, TranslationSettings,
};

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub mode: RenderMode,
    pub layout: LayoutSettings,
    pub classifier: ClassifierSettings,
    pub translation: TranslationSettings,
    pub renderer: RendererSettings,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        let mut layout = settings.layout.clone();
        layout.font_size = job.font_size.unwrap_or(layout.font_size);
        layout.line_height = job.line_height.unwrap_or(layout.line_height);
        layout.min_gap_height = job.min_gap_height.unwrap_or(layout.min_gap_height);

        MergedConfig {
            mode: job.mode.unwrap_or(settings.mode),
            layout,
            classifier: settings.classifier.clone(),
            translation: settings.translation.clone(),
            renderer: settings.renderer.clone(),
        }
    }

    /// ジョブの上書き値を含めて検証する。
    pub fn validate(&self) -> crate::error::Result<()> {
        self.layout.validate()
    }
}
