//! Bar charts of the most frequent phrases, one panel per comment group.
//!
//! Panels are laid out top to bottom in a single SVG document, which is then
//! rasterized to PNG for upload.

pub mod error;
pub mod raster;
mod svg;

pub use error::ChartError;
pub use raster::rasterize;

use chrono::Utc;
use std::path::Path;
use tracing::info;
use verdict_core::PhraseKey;

/// One bar chart: an optional group label and `(phrase, count)` bars in
/// display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPanel {
    pub label: Option<String>,
    pub bars: Vec<(String, u64)>,
}

impl ChartPanel {
    pub fn new(label: Option<String>, bars: Vec<(String, u64)>) -> Self {
        Self { label, bars }
    }

    pub fn from_phrases(label: Option<String>, phrases: &[(PhraseKey, u64)]) -> Self {
        let bars = phrases
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect();
        Self { label, bars }
    }

    pub fn title(&self) -> String {
        match &self.label {
            Some(label) => format!("Top 2-word Phrases for {}", label),
            None => "Top 2-word Phrases".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub svg: String,
    pub png: Vec<u8>,
}

impl RenderedChart {
    pub fn save_png(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.png)?;
        info!("Chart saved to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChartRenderer {
    footer: bool,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer {
    /// Renderer that stamps the generation time under the last panel.
    pub fn new() -> Self {
        Self { footer: true }
    }

    pub fn without_footer() -> Self {
        Self { footer: false }
    }

    pub fn render_svg(&self, panels: &[ChartPanel]) -> Result<String, ChartError> {
        if panels.is_empty() {
            return Err(ChartError::NoPanels);
        }

        let footer = self
            .footer
            .then(|| format!("Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC")));
        Ok(svg::build_document(panels, footer.as_deref()))
    }

    pub fn render(&self, panels: &[ChartPanel]) -> Result<RenderedChart, ChartError> {
        let svg = self.render_svg(panels)?;
        let png = rasterize(&svg)?;
        info!("Rendered chart with {} panel(s)", panels.len());
        Ok(RenderedChart { svg, png })
    }
}
