//! Subprocess-driven speech synthesis engine.
//!
//! Drives an external neural TTS binary (piper-style command-line
//! interface: voice model flag, output file flag, text on stdin). The
//! engine process is spawned per request; the loaded voice models live in
//! the engine binary's own cache, so concurrent requests are independent.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{Error, Result};

use super::traits::{SpeechEngine, VoiceSpec};

/// A voice available for synthesis.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VoiceInfo {
    /// Catalog identifier, referenced by requests.
    pub voice_id: String,
    /// Display name.
    pub name: String,
    /// ISO 639-1 language code.
    pub language: String,
    /// Voice gender label.
    pub gender: String,
    /// Human description.
    pub description: String,
}

/// The built-in voice catalog.
pub fn builtin_voices() -> Vec<VoiceInfo> {
    vec![
        VoiceInfo {
            voice_id: "default".to_string(),
            name: "Default Voice".to_string(),
            language: "en".to_string(),
            gender: "female".to_string(),
            description: "Default English voice".to_string(),
        },
        VoiceInfo {
            voice_id: "male".to_string(),
            name: "Male Voice".to_string(),
            language: "en".to_string(),
            gender: "male".to_string(),
            description: "Male English voice".to_string(),
        },
    ]
}

/// Speech engine that shells out to a TTS command.
pub struct CommandSpeechEngine {
    command: String,
    voices_dir: PathBuf,
}

impl CommandSpeechEngine {
    /// Create an engine invoking `command` with voice models under
    /// `voices_dir`.
    pub fn new(command: impl Into<String>, voices_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            voices_dir: voices_dir.into(),
        }
    }

    /// Voice model file for a catalog voice id.
    fn model_path(&self, voice_id: &str) -> PathBuf {
        self.voices_dir.join(format!("{voice_id}.onnx"))
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeechEngine {
    fn name(&self) -> &str {
        &self.command
    }

    async fn synthesize(&self, text: &str, voice: &VoiceSpec, output: &Path) -> Result<()> {
        let model = self.model_path(&voice.voice_id);
        // The engine's length scale is the inverse of playback speed.
        let length_scale = 1.0 / voice.speed.max(0.1);

        debug!(
            command = %self.command,
            voice = %voice.voice_id,
            chars = text.len(),
            "spawning speech engine"
        );

        let mut child = tokio::process::Command::new(&self.command)
            .arg("--model")
            .arg(&model)
            .arg("--length-scale")
            .arg(format!("{length_scale:.3}"))
            .arg("--output-file")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to spawn {}: {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            // Engine reads until EOF.
            drop(stdin);
        }

        let result = child.wait_with_output().await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Engine(format!(
                "{} exited with {}: {}",
                self.command,
                result.status,
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(Error::Engine(format!(
                "{} produced no output file",
                self.command
            )));
        }
        Ok(())
    }

    async fn ready(&self) -> bool {
        tokio::process::Command::new(&self.command)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_default_voice() {
        let voices = builtin_voices();
        assert!(voices.iter().any(|v| v.voice_id == "default"));
        assert!(voices.iter().all(|v| v.language == "en"));
    }

    #[test]
    fn model_path_derives_from_voice_id() {
        let engine = CommandSpeechEngine::new("piper", "/srv/voices");
        assert_eq!(
            engine.model_path("male"),
            PathBuf::from("/srv/voices/male.onnx")
        );
    }

    #[tokio::test]
    async fn missing_binary_is_not_ready() {
        let engine = CommandSpeechEngine::new("definitely-not-a-tts-binary", "/tmp");
        assert!(!engine.ready().await);
    }

    #[tokio::test]
    async fn missing_binary_fails_synthesis_as_engine_error() {
        let engine = CommandSpeechEngine::new("definitely-not-a-tts-binary", "/tmp");
        let err = engine
            .synthesize("hello", &VoiceSpec::default(), Path::new("/tmp/out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert!(err.is_fallback_trigger());
    }
}
