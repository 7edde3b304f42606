use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage unavailable")]
    StorageUnavailable,
    #[error("storage access failed: {0}")]
    Storage(String),
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("canvas not ready: {0}")]
    Canvas(String),
    #[error("geolocation failed: {0}")]
    Geolocation(String),
    #[error("export failed: {0}")]
    Export(String),
}

/// Renders a JS exception as text for the error variants above.
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Inline messages shown by the profiling form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Bitte gib an, wie oft du spielst.")]
    MissingGamingFrequency,
    #[error("Bitte gib dein Alter an.")]
    MissingAge,
    #[error("Das Alter muss zwischen {min} und {max} liegen.")]
    AgeOutOfRange { min: u8, max: u8 },
    #[error("Bitte bewerte deine Orientierung von 1 bis 5.")]
    ConfidenceOutOfRange,
}
