//! FFmpeg/ffprobe subprocess toolkit.
//!
//! All media heavy lifting — probing, audio filtering, video composition,
//! thumbnail extraction — is delegated to the FFmpeg binaries. Filter
//! graphs are assembled by pure functions so their structure is testable
//! without the binaries installed; the spawn paths only run where FFmpeg
//! exists.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tracing::debug;

use crate::cache::ArtifactMeta;
use crate::providers::VoiceSpec;
use crate::{Error, Result};

use super::themes::Theme;

/// Seconds the title card stays on screen (capped by video duration).
pub const TITLE_SECONDS: f64 = 3.0;

/// Maximum Ken Burns zoom gain over an image's display window.
const KEN_BURNS_ZOOM: f64 = 0.1;

/// Wrapper around the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone)]
pub struct MediaToolkit {
    ffmpeg: String,
    ffprobe: String,
}

/// One video composition job.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// Output frame width.
    pub width: u32,
    /// Output frame height.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Total video duration in seconds.
    pub duration: f64,
    /// Title shown for the first [`TITLE_SECONDS`].
    pub title: String,
    /// Visual theme.
    pub theme: &'static Theme,
    /// Narration audio track.
    pub audio: PathBuf,
    /// Downloaded still images, shown in order after the title.
    pub images: Vec<PathBuf>,
    /// SRT file to burn in, if any.
    pub subtitles: Option<PathBuf>,
    /// Font file for drawtext.
    pub font_file: String,
    /// Video codec.
    pub video_codec: String,
    /// Audio codec.
    pub audio_codec: String,
    /// Simplified fallback plan: plain title, no pans, no burned subtitles.
    pub simplified: bool,
}

/// One thumbnail card job.
#[derive(Debug, Clone)]
pub struct CardSpec {
    /// Card title.
    pub title: String,
    /// Optional secondary line.
    pub subtitle: Option<String>,
    /// Visual theme.
    pub theme: &'static Theme,
    /// Font file for drawtext.
    pub font_file: String,
}

/// Thumbnail card dimensions (YouTube-standard).
pub const CARD_WIDTH: u32 = 1280;
/// Thumbnail card dimensions (YouTube-standard).
pub const CARD_HEIGHT: u32 = 720;

impl MediaToolkit {
    /// Create a toolkit using the given binary names/paths.
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Whether the ffmpeg binary is runnable.
    pub async fn available(&self) -> bool {
        tokio::process::Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Probe a media file's duration and size via ffprobe.
    pub async fn probe(&self, path: &Path) -> Result<ArtifactMeta> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration,size",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::Engine(format!("failed to spawn {}: {e}", self.ffprobe)))?;

        if !output.status.success() {
            return Err(Error::Engine(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
        }
        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
            size: Option<String>,
        }

        let probed: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        let duration = probed
            .format
            .duration
            .and_then(|d| d.parse().ok())
            .unwrap_or(0.0);
        let size = match probed.format.size.and_then(|s| s.parse().ok()) {
            Some(size) => size,
            None => tokio::fs::metadata(path).await?.len(),
        };
        Ok(ArtifactMeta { size, duration })
    }

    /// Run the audio post-processing filter pass.
    ///
    /// Volume, loudness normalization, and light dynamic-range compression;
    /// resamples to the requested rate.
    pub async fn postprocess_audio(
        &self,
        input: &Path,
        output: &Path,
        voice: &VoiceSpec,
    ) -> Result<()> {
        let filter = audio_filter(voice);
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-filter:a".to_string(),
            filter,
            "-ar".to_string(),
            voice.sample_rate.to_string(),
            output.display().to_string(),
        ];
        self.run(&args).await
    }

    /// Compose a video per the plan.
    pub async fn render(&self, plan: &RenderPlan, output: &Path) -> Result<()> {
        let args = build_render_args(plan, output);
        self.run(&args).await
    }

    /// Extract a single frame as a JPEG thumbnail.
    pub async fn thumbnail_from_video(
        &self,
        video: &Path,
        at_seconds: f64,
        output: &Path,
    ) -> Result<()> {
        let args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{at_seconds:.2}"),
            "-i".to_string(),
            video.display().to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            "2".to_string(),
            output.display().to_string(),
        ];
        self.run(&args).await
    }

    /// Render a standalone thumbnail card (title + optional subtitle on a
    /// theme background).
    pub async fn render_card(&self, card: &CardSpec, output: &Path) -> Result<()> {
        let args = build_card_args(card, output);
        self.run(&args).await
    }

    async fn run(&self, args: &[String]) -> Result<()> {
        debug!(ffmpeg = %self.ffmpeg, ?args, "invoking ffmpeg");
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(args)
            .stdout(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Engine(format!("failed to spawn {}: {e}", self.ffmpeg)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            return Err(Error::Engine(format!(
                "{} exited with {}: {tail}",
                self.ffmpeg, output.status
            )));
        }
        Ok(())
    }
}

/// Escape text for use inside a drawtext filter argument.
pub(crate) fn drawtext_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            ',' => out.push_str("\\,"),
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// FFmpeg colors take `0xRRGGBB`; themes carry CSS-style `#rrggbb`.
fn ffmpeg_color(hex: &str) -> String {
    format!("0x{}", hex.trim_start_matches('#'))
}

/// Audio filter chain for the post-processing pass.
fn audio_filter(voice: &VoiceSpec) -> String {
    let mut stages = Vec::new();
    if (voice.volume - 1.0).abs() > f64::EPSILON {
        stages.push(format!("volume={:.2}", voice.volume));
    }
    stages.push("loudnorm".to_string());
    stages.push("acompressor".to_string());
    stages.join(",")
}

/// Assemble the full argument list for a composition job.
fn build_render_args(plan: &RenderPlan, output: &Path) -> Vec<String> {
    let mut args = vec!["-y".to_string()];

    // Input 0: theme background color source.
    args.push("-f".to_string());
    args.push("lavfi".to_string());
    args.push("-i".to_string());
    args.push(format!(
        "color=c={}:s={}x{}:d={:.2}:r={}",
        ffmpeg_color(plan.theme.background),
        plan.width,
        plan.height,
        plan.duration,
        plan.fps
    ));

    // Input 1: narration audio.
    args.push("-i".to_string());
    args.push(plan.audio.display().to_string());

    // Inputs 2..: still images, looped for their display window.
    let image_window = images_window(plan);
    for image in &plan.images {
        args.push("-loop".to_string());
        args.push("1".to_string());
        args.push("-t".to_string());
        args.push(format!("{image_window:.2}"));
        args.push("-i".to_string());
        args.push(image.display().to_string());
    }

    args.push("-filter_complex".to_string());
    args.push(build_filter_graph(plan));

    args.push("-map".to_string());
    args.push("[vout]".to_string());
    args.push("-map".to_string());
    args.push("1:a".to_string());

    args.push("-c:v".to_string());
    args.push(plan.video_codec.clone());
    args.push("-c:a".to_string());
    args.push(plan.audio_codec.clone());
    args.push("-pix_fmt".to_string());
    args.push("yuv420p".to_string());
    args.push("-r".to_string());
    args.push(plan.fps.to_string());
    args.push("-t".to_string());
    args.push(format!("{:.2}", plan.duration));
    args.push("-shortest".to_string());
    args.push(output.display().to_string());
    args
}

/// Seconds each image stays on screen.
fn images_window(plan: &RenderPlan) -> f64 {
    if plan.images.is_empty() {
        return 0.0;
    }
    ((plan.duration - TITLE_SECONDS).max(0.0) / plan.images.len() as f64).max(0.1)
}

/// Assemble the filter_complex graph for a composition job.
fn build_filter_graph(plan: &RenderPlan) -> String {
    let mut chains = Vec::new();
    let mut current = "0:v".to_string();

    // Image overlays, shown sequentially after the title card window.
    let window = images_window(plan);
    for (i, _) in plan.images.iter().enumerate() {
        let input = i + 2;
        let start = TITLE_SECONDS + i as f64 * window;
        let end = start + window;
        let frames = (window * plan.fps as f64).max(1.0) as u32;

        let prep = if plan.simplified {
            format!(
                "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}[img{i}]",
                w = plan.width,
                h = plan.height,
            )
        } else {
            // Slow push-in: zoom grows linearly over the display window.
            format!(
                "[{input}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},\
                 zoompan=z='1+{zoom}*on/{frames}':d={frames}:s={w}x{h}:fps={fps}[img{i}]",
                w = plan.width,
                h = plan.height,
                zoom = KEN_BURNS_ZOOM,
                fps = plan.fps,
            )
        };
        chains.push(prep);

        let next = format!("v{i}");
        chains.push(format!(
            "[{current}][img{i}]overlay=(W-w)/2:(H-h)/2:enable='between(t,{start:.2},{end:.2})'[{next}]"
        ));
        current = next;
    }

    // Title card over the first seconds.
    let title_end = TITLE_SECONDS.min(plan.duration);
    let title = drawtext_escape(&plan.title);
    let title_filter = if plan.simplified {
        format!(
            "[{current}]drawtext=fontfile={font}:text='{title}':fontsize={size}:fontcolor={color}:\
             x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,0,{title_end:.2})'[vtitle]",
            font = plan.font_file,
            size = plan.theme.title_size,
            color = ffmpeg_color(plan.theme.title_color),
        )
    } else {
        // Half-second fade in and out, matching the source pipeline.
        format!(
            "[{current}]drawtext=fontfile={font}:text='{title}':fontsize={size}:fontcolor={color}:\
             borderw=2:bordercolor=black:x=(w-text_w)/2:y=(h-text_h)/2:\
             alpha='if(lt(t,0.5),t/0.5,if(lt(t,{fade_out:.2}),1,({title_end:.2}-t)/0.5))':\
             enable='between(t,0,{title_end:.2})'[vtitle]",
            font = plan.font_file,
            size = plan.theme.title_size,
            color = ffmpeg_color(plan.theme.title_color),
            fade_out = (title_end - 0.5).max(0.0),
        )
    };
    chains.push(title_filter);
    current = "vtitle".to_string();

    // Burned subtitles (full plan only; the SRT sidecar always exists).
    if let Some(srt) = plan.subtitles.as_ref().filter(|_| !plan.simplified) {
        chains.push(format!(
            "[{current}]subtitles={}:force_style='FontSize={}'[vout]",
            srt.display(),
            plan.theme.subtitle_size / 2
        ));
    } else {
        chains.push(format!("[{current}]null[vout]"));
    }

    chains.join(";")
}

/// Assemble the argument list for a thumbnail card.
fn build_card_args(card: &CardSpec, output: &Path) -> Vec<String> {
    let title = drawtext_escape(&card.title);
    let mut filters = vec![format!(
        "drawtext=fontfile={font}:text='{title}':fontsize=80:fontcolor={color}:\
         shadowcolor=black:shadowx=3:shadowy=3:x=(w-text_w)/2:y=(h-text_h)/2-40",
        font = card.font_file,
        color = ffmpeg_color(card.theme.title_color),
    )];
    if let Some(subtitle) = &card.subtitle {
        let subtitle = drawtext_escape(subtitle);
        filters.push(format!(
            "drawtext=fontfile={font}:text='{subtitle}':fontsize=40:fontcolor={color}:\
             shadowcolor=black:shadowx=2:shadowy=2:x=(w-text_w)/2:y=(h+text_h)/2+40",
            font = card.font_file,
            color = ffmpeg_color(card.theme.subtitle_color),
        ));
    }

    vec![
        "-y".to_string(),
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "color=c={}:s={CARD_WIDTH}x{CARD_HEIGHT}:d=1",
            ffmpeg_color(card.theme.background)
        ),
        "-vf".to_string(),
        filters.join(","),
        "-frames:v".to_string(),
        "1".to_string(),
        "-q:v".to_string(),
        "3".to_string(),
        output.display().to_string(),
    ]
}
