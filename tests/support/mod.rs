//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;

use newsreel::providers::{SpeechEngine, SummaryBounds, SummaryEngine, VoiceSpec};
use newsreel::{Error, Result};

/// Serve a router on an ephemeral port, returning its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Write a fake ffprobe that reports fixed metadata for any input.
pub fn fake_probe_bin(dir: &Path, duration: f64, size: u64) -> PathBuf {
    let path = dir.join("fake-ffprobe");
    let script = format!(
        "#!/bin/sh\necho '{{\"format\":{{\"duration\":\"{duration}\",\"size\":\"{size}\"}}}}'\n"
    );
    write_executable(&path, &script);
    path
}

/// Write a fake ffmpeg that creates its output file (the last argument).
///
/// When `fail_pattern` is set, invocations whose arguments contain the
/// pattern exit non-zero instead, which lets tests force the simplified
/// render fallback.
pub fn fake_ffmpeg_bin(dir: &Path, fail_pattern: Option<&str>) -> PathBuf {
    let path = dir.join("fake-ffmpeg");
    let failure_check = match fail_pattern {
        Some(pattern) => format!("case \"$*\" in *{pattern}*) exit 1;; esac\n"),
        None => String::new(),
    };
    let script = format!(
        "#!/bin/sh\n{failure_check}for last; do :; done\nprintf 'fake media' > \"$last\"\n"
    );
    write_executable(&path, &script);
    path
}

fn write_executable(path: &Path, content: &str) {
    std::fs::write(path, content).expect("write fake tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake tool");
    }
}

/// Summary engine that counts invocations and can fail on demand.
pub struct CountingSummaryEngine {
    pub name: &'static str,
    pub calls: Arc<AtomicUsize>,
    /// Fail requests whose input contains this marker.
    pub fail_marker: Option<&'static str>,
}

impl CountingSummaryEngine {
    pub fn reliable(name: &'static str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                name,
                calls: calls.clone(),
                fail_marker: None,
            }),
            calls,
        )
    }
}

#[async_trait]
impl SummaryEngine for CountingSummaryEngine {
    fn name(&self) -> &str {
        self.name
    }

    async fn summarize(&self, text: &str, _bounds: SummaryBounds) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.fail_marker
            && text.contains(marker)
        {
            return Err(Error::Engine("induced failure".to_string()));
        }
        Ok("A concise generated summary of the supplied article text.".to_string())
    }
}

/// Speech engine that writes a placeholder WAV and counts invocations.
pub struct CountingSpeechEngine {
    pub calls: Arc<AtomicUsize>,
    pub fail_marker: Option<&'static str>,
}

impl CountingSpeechEngine {
    pub fn reliable() -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                calls: calls.clone(),
                fail_marker: None,
            }),
            calls,
        )
    }
}

#[async_trait]
impl SpeechEngine for CountingSpeechEngine {
    fn name(&self) -> &str {
        "stub-tts"
    }

    async fn synthesize(&self, text: &str, _voice: &VoiceSpec, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = self.fail_marker
            && text.contains(marker)
        {
            return Err(Error::Engine("induced failure".to_string()));
        }
        tokio::fs::write(output, b"RIFF....WAVEfmt fake").await?;
        Ok(())
    }
}
