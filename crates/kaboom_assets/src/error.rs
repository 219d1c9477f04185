use thiserror::Error;

/// Why a single asset could not be fetched. Always recoverable: the caller
/// substitutes a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out after {timeout_ms}ms fetching '{url}'")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("network failure fetching '{url}': {reason}")]
    Network { url: String, reason: String },
    #[error("invalid image at '{url}': {reason}")]
    Invalid { url: String, reason: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. } | Self::Network { url, .. } | Self::Invalid { url, .. } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network",
            Self::Invalid { .. } => "invalid",
        }
    }
}

/// Placeholder generation failed. Fatal: without placeholders the asset
/// table cannot be made complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("sprite size {0} is outside the supported range 1..={max}", max = crate::synth::MAX_SPRITE_SIZE)]
    InvalidSize(u32),
    #[error("failed to allocate a {width}x{height} sprite raster")]
    Raster { width: u32, height: u32 },
}

/// Errors that can reach the boot code.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("fallback sprite synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("loader configuration rejected: {0}")]
    Config(String),
    #[error("background load stopped before finishing")]
    BackgroundAborted,
}
