//! Media tooling: FFmpeg invocation, subtitle files, and visual themes.

pub mod ffmpeg;
pub mod srt;
pub mod themes;

pub use ffmpeg::{CardSpec, MediaToolkit, RenderPlan};
pub use srt::render_srt;
pub use themes::Theme;
