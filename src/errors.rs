use thiserror::Error;

#[derive(Debug, Error)]
pub enum PainterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Cell ({col}, {row}) lies outside the {cols}x{rows} grid")]
    OutOfGrid { col: u32, row: u32, cols: u32, rows: u32 },

    #[error("Input device error: {0}")]
    Device(String),

    #[error("Pixel sampling error: {0}")]
    Sampling(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl serde::Serialize for PainterError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type PainterResult<T> = Result<T, PainterError>;
