//! Configuration loading for the newsreel services.
//!
//! Configuration is entirely environment-variable driven: model identifiers,
//! directory paths, the shared internal secret, and numeric limits. Each
//! service has its own config struct with a `from_env()` constructor;
//! unparsable values are a [`Error::Configuration`], missing values fall
//! back to the documented defaults.
//!
//! Binaries load a `.env` file first (via `dotenvy`), so local development
//! needs no exported shell state.

use std::path::PathBuf;

use crate::{Error, Result};

/// Default shared secret for internal service-to-service calls.
///
/// Suitable only for development; deployments override
/// `INTERNAL_SERVICE_SECRET`.
pub const DEFAULT_SECRET: &str = "dev-secret";

/// Read an env var, falling back to a default.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an env var, falling back to a default when unset.
///
/// An unparsable value is a configuration error, not a silent default:
/// a typo in `VIDEO_FPS` should fail startup, not produce a 0-fps encode.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Configuration(format!("invalid value for {key}: {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(default)
}

// ============================================================================
// Summarizer service
// ============================================================================

/// Configuration for the summarization service.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Primary summarization model id.
    pub model: String,
    /// Lower-quality fallback model id, used when the primary fails.
    pub fallback_model: String,
    /// Base URL of the inference API.
    pub inference_base_url: String,
    /// API key for the inference API (empty = anonymous).
    pub api_key: String,
    /// Hard upper bound on generated summary length (tokens/words).
    pub max_summary_length: u32,
    /// Hard lower bound on generated summary length.
    pub min_summary_length: u32,
    /// Directory for the content-addressed summary cache.
    pub cache_dir: PathBuf,
    /// Shared secret gating mutating endpoints.
    pub secret: String,
    /// Informational device label, surfaced in health and metadata.
    pub device: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: "facebook/bart-large-cnn".to_string(),
            fallback_model: "t5-small".to_string(),
            inference_base_url: "https://api-inference.huggingface.co".to_string(),
            api_key: String::new(),
            max_summary_length: 150,
            min_summary_length: 30,
            cache_dir: PathBuf::from("./cache"),
            secret: DEFAULT_SECRET.to_string(),
            device: "cpu".to_string(),
        }
    }
}

impl SummarizerConfig {
    /// Load from the environment, falling back to defaults per field.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            model: env_or("SUMMARIZER_MODEL", &defaults.model),
            fallback_model: env_or("SUMMARIZER_FALLBACK_MODEL", &defaults.fallback_model),
            inference_base_url: env_or("INFERENCE_BASE_URL", &defaults.inference_base_url),
            api_key: env_or("HF_API_KEY", ""),
            max_summary_length: env_parse("MAX_SUMMARY_LENGTH", defaults.max_summary_length)?,
            min_summary_length: env_parse("MIN_SUMMARY_LENGTH", defaults.min_summary_length)?,
            cache_dir: PathBuf::from(env_or("CACHE_DIR", "./cache")),
            secret: env_or("INTERNAL_SERVICE_SECRET", DEFAULT_SECRET),
            device: env_or("SUMMARIZER_DEVICE", &defaults.device),
        })
    }
}

// ============================================================================
// Speech service
// ============================================================================

/// Configuration for the speech-synthesis service.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// TTS engine command to invoke (e.g. `piper`).
    pub tts_command: String,
    /// Directory holding voice model files for the engine.
    pub voices_dir: PathBuf,
    /// Directory for freshly synthesized (pre-cache) audio.
    pub output_dir: PathBuf,
    /// Directory for the content-addressed audio cache.
    pub cache_dir: PathBuf,
    /// Shared secret gating mutating endpoints.
    pub secret: String,
    /// Target sample rate for produced audio.
    pub sample_rate: u32,
    /// Maximum accepted input text length, in characters.
    pub max_text_length: usize,
    /// Output audio container format.
    pub audio_format: String,
    /// Whether to expand abbreviations and spacing before synthesis.
    pub enable_preprocessing: bool,
    /// Whether to run the FFmpeg filter pass after synthesis.
    pub enable_postprocessing: bool,
    /// FFmpeg binary for the post-processing pass.
    pub ffmpeg_bin: String,
    /// ffprobe binary for artifact metadata.
    pub ffprobe_bin: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            tts_command: "piper".to_string(),
            voices_dir: PathBuf::from("./voices"),
            output_dir: PathBuf::from("./audio_output"),
            cache_dir: PathBuf::from("./cache"),
            secret: DEFAULT_SECRET.to_string(),
            sample_rate: 22_050,
            max_text_length: 1_000,
            audio_format: "wav".to_string(),
            enable_preprocessing: true,
            enable_postprocessing: true,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl SpeechConfig {
    /// Load from the environment, falling back to defaults per field.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            tts_command: env_or("TTS_COMMAND", &defaults.tts_command),
            voices_dir: PathBuf::from(env_or("TTS_VOICES_DIR", "./voices")),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "./audio_output")),
            cache_dir: PathBuf::from(env_or("CACHE_DIR", "./cache")),
            secret: env_or("INTERNAL_SERVICE_SECRET", DEFAULT_SECRET),
            sample_rate: env_parse("SAMPLE_RATE", defaults.sample_rate)?,
            max_text_length: env_parse("MAX_TEXT_LENGTH", defaults.max_text_length)?,
            audio_format: env_or("AUDIO_FORMAT", &defaults.audio_format),
            enable_preprocessing: env_flag("ENABLE_PREPROCESSING", true),
            enable_postprocessing: env_flag("ENABLE_POSTPROCESSING", true),
            ffmpeg_bin: env_or("FFMPEG_BIN", &defaults.ffmpeg_bin),
            ffprobe_bin: env_or("FFPROBE_BIN", &defaults.ffprobe_bin),
        })
    }
}

// ============================================================================
// Video service
// ============================================================================

/// Configuration for the video-assembly service.
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Directory for rendered videos, thumbnails, and subtitle sidecars.
    pub output_dir: PathBuf,
    /// Directory for downloaded intermediates (audio, images).
    pub cache_dir: PathBuf,
    /// Shared secret gating mutating endpoints.
    pub secret: String,
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// FFmpeg video codec name.
    pub video_codec: String,
    /// FFmpeg audio codec name.
    pub audio_codec: String,
    /// Theme applied when the request names none.
    pub default_theme: String,
    /// Font file used for drawtext title cards and subtitles.
    pub font_file: String,
    /// Maximum accepted video duration in seconds.
    pub max_video_length: u32,
    /// FFmpeg binary (overridable for packaged deployments).
    pub ffmpeg_bin: String,
    /// ffprobe binary.
    pub ffprobe_bin: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./video_output"),
            cache_dir: PathBuf::from("./cache"),
            secret: DEFAULT_SECRET.to_string(),
            width: 1920,
            height: 1080,
            fps: 30,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            default_theme: "modern".to_string(),
            font_file: "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string(),
            max_video_length: 300,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl VideoConfig {
    /// Load from the environment, falling back to defaults per field.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "./video_output")),
            cache_dir: PathBuf::from(env_or("CACHE_DIR", "./cache")),
            secret: env_or("INTERNAL_SERVICE_SECRET", DEFAULT_SECRET),
            width: env_parse("VIDEO_WIDTH", defaults.width)?,
            height: env_parse("VIDEO_HEIGHT", defaults.height)?,
            fps: env_parse("VIDEO_FPS", defaults.fps)?,
            video_codec: env_or("VIDEO_CODEC", &defaults.video_codec),
            audio_codec: env_or("AUDIO_CODEC", &defaults.audio_codec),
            default_theme: env_or("DEFAULT_THEME", &defaults.default_theme),
            font_file: env_or("FONT_FILE", &defaults.font_file),
            max_video_length: env_parse("MAX_VIDEO_LENGTH", defaults.max_video_length)?,
            ffmpeg_bin: env_or("FFMPEG_BIN", &defaults.ffmpeg_bin),
            ffprobe_bin: env_or("FFPROBE_BIN", &defaults.ffprobe_bin),
        })
    }

    /// Resolution string, e.g. `1920x1080`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizer_defaults() {
        let config = SummarizerConfig::default();
        assert_eq!(config.model, "facebook/bart-large-cnn");
        assert_eq!(config.fallback_model, "t5-small");
        assert_eq!(config.max_summary_length, 150);
        assert_eq!(config.min_summary_length, 30);
        assert_eq!(config.secret, DEFAULT_SECRET);
    }

    #[test]
    fn speech_defaults() {
        let config = SpeechConfig::default();
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.max_text_length, 1_000);
        assert_eq!(config.audio_format, "wav");
        assert!(config.enable_postprocessing);
    }

    #[test]
    fn video_defaults_and_resolution() {
        let config = VideoConfig::default();
        assert_eq!(config.resolution(), "1920x1080");
        assert_eq!(config.fps, 30);
        assert_eq!(config.default_theme, "modern");
    }

    #[test]
    fn env_parse_rejects_garbage() {
        // SAFETY: test-only env mutation; key is unique to this test.
        unsafe { std::env::set_var("NEWSREEL_TEST_BAD_U32", "not-a-number") };
        let result: Result<u32> = env_parse("NEWSREEL_TEST_BAD_U32", 5);
        assert!(matches!(result, Err(Error::Configuration(_))));
        unsafe { std::env::remove_var("NEWSREEL_TEST_BAD_U32") };
    }

    #[test]
    fn env_parse_defaults_when_unset() {
        let result: Result<u32> = env_parse("NEWSREEL_TEST_UNSET_U32", 7);
        assert_eq!(result.unwrap(), 7);
    }
}
