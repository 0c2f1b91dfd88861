use thiserror::Error;
use verdict_core::CoreError;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to render: no chart panels were given")]
    NoPanels,

    #[error("Generated SVG could not be parsed: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("Cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {message}")]
    Encode { message: String },
}

impl From<ChartError> for CoreError {
    fn from(error: ChartError) -> Self {
        CoreError::Chart {
            message: error.to_string(),
        }
    }
}
