//! ffmpeg invocations: the wav transcode and the startup availability probe.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TtsError};

/// Transcode `input` to 48 kHz stereo wav at `output`, overwriting it.
pub async fn transcode_to_wav(ffmpeg: &str, input: &Path, output: &Path) -> Result<()> {
    debug!(input = %input.display(), output = %output.display(), "transcoding artifact");

    let result = Command::new(ffmpeg)
        .arg("-i")
        .arg(input)
        .args(["-ar", "48000", "-ac", "2"])
        .arg(output)
        .arg("-y")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| TtsError::TranscodeFailed(format!("cannot run {ffmpeg}: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let last_line = stderr.lines().last().unwrap_or("").trim();
        return Err(TtsError::TranscodeFailed(format!(
            "{ffmpeg} exited with {}: {last_line}",
            result.status
        )));
    }
    if !output.exists() {
        return Err(TtsError::TranscodeFailed(format!(
            "{ffmpeg} produced no output at {}",
            output.display()
        )));
    }
    Ok(())
}

/// First line of `ffmpeg -version`, or `None` when ffmpeg cannot be run.
pub async fn probe_ffmpeg(ffmpeg: &str) -> Option<String> {
    let output = Command::new(ffmpeg)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}
