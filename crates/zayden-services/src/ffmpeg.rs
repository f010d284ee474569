//! Media conversion through an `ffmpeg` subprocess.

use crate::exif;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use zayden_core::{
    config::MediaConfig,
    error::ZaydenError,
    traits::{MediaConverter, StickerPack},
};

/// Sticker canvas: 512x512, aspect preserved, transparent padding.
const STICKER_FILTER: &str = "scale=512:512:force_original_aspect_ratio=decrease,fps=15,\
format=rgba,pad=512:512:(ow-iw)/2:(oh-ih)/2:color=0x00000000";

/// Converter that shells out to ffmpeg with a timeout.
pub struct FfmpegConverter {
    ffmpeg: String,
    timeout: Duration,
}

impl FfmpegConverter {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.convert_timeout_secs),
        }
    }

    /// Arguments between input and output for a sticker.
    fn sticker_args(is_video: bool) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-vcodec".into(),
            "libwebp".into(),
            "-vf".into(),
            STICKER_FILTER.into(),
        ];
        if is_video {
            args.extend(
                ["-loop", "0", "-ss", "00:00:00", "-t", "00:00:05", "-preset", "default"]
                    .map(String::from),
            );
        }
        args.extend(["-an", "-vsync", "0", "-f", "webp"].map(String::from));
        args
    }

    fn audio_args() -> Vec<String> {
        ["-vn", "-ac", "2", "-b:a", "128k", "-ar", "44100", "-f", "mp3"]
            .map(String::from)
            .to_vec()
    }

    fn image_args() -> Vec<String> {
        ["-frames:v", "1", "-f", "image2", "-vcodec", "png"]
            .map(String::from)
            .to_vec()
    }

    /// Write `data` to a temp dir, run ffmpeg, and read back the output.
    async fn convert(
        &self,
        data: Vec<u8>,
        input_ext: &str,
        output_ext: &str,
        args: &[String],
        label: &str,
    ) -> Result<Vec<u8>, ZaydenError> {
        let dir = tempfile::tempdir()
            .map_err(|e| ZaydenError::Media(format!("{label}: failed to create temp dir: {e}")))?;
        let input = dir.path().join(format!("input.{input_ext}"));
        let output = dir.path().join(format!("output.{output_ext}"));
        tokio::fs::write(&input, &data).await?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(&input)
            .args(args)
            .arg(&output)
            .kill_on_drop(true);

        debug!("executing: {} -i {} ... ({label})", self.ffmpeg, input.display());
        self.execute_with_timeout(cmd, label).await?;
        read_output(&output, label).await
    }

    async fn execute_with_timeout(&self, mut cmd: Command, label: &str) -> Result<(), ZaydenError> {
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ZaydenError::Media(format!(
                    "{label} timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ZaydenError::Media(format!("failed to run ffmpeg for {label}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZaydenError::Media(format!(
                "{label}: ffmpeg exited with {}: {stderr}",
                output.status
            )));
        }
        Ok(())
    }
}

async fn read_output(path: &Path, label: &str) -> Result<Vec<u8>, ZaydenError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ZaydenError::Media(format!("{label}: no output produced: {e}")))?;
    if bytes.is_empty() {
        return Err(ZaydenError::Media(format!("{label}: empty output")));
    }
    Ok(bytes)
}

/// File extension for a mimetype, used only to hint ffmpeg's demuxer.
fn extension_for(mimetype: &str) -> &str {
    match mimetype.split(';').next().unwrap_or_default().trim() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/mpeg" => "mp3",
        "audio/mp4" => "m4a",
        _ => "bin",
    }
}

#[async_trait]
impl MediaConverter for FfmpegConverter {
    async fn to_sticker(
        &self,
        data: Vec<u8>,
        mimetype: &str,
        pack: &StickerPack,
    ) -> Result<Vec<u8>, ZaydenError> {
        // Already a WebP: only the metadata needs to change.
        let webp = if mimetype.starts_with("image/webp") && data.starts_with(b"RIFF") {
            data
        } else {
            let is_video = mimetype.starts_with("video/") || mimetype == "image/gif";
            self.convert(
                data,
                extension_for(mimetype),
                "webp",
                &Self::sticker_args(is_video),
                "sticker",
            )
            .await?
        };
        exif::embed_exif(&webp, &exif::sticker_exif(pack))
    }

    async fn to_audio(&self, data: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
        self.convert(data, "bin", "mp3", &Self::audio_args(), "to_audio")
            .await
    }

    async fn to_image(&self, data: Vec<u8>) -> Result<Vec<u8>, ZaydenError> {
        self.convert(data, "webp", "png", &Self::image_args(), "to_image")
            .await
    }
}

/// Whether `path` looks like an ffmpeg binary that can be spawned.
pub async fn is_available(path: &str) -> bool {
    Command::new(path)
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(path: &str) -> FfmpegConverter {
        FfmpegConverter::from_config(&MediaConfig {
            ffmpeg_path: path.into(),
            convert_timeout_secs: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("audio/ogg; codecs=opus"), "ogg");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }

    #[test]
    fn test_sticker_args_video_limits_duration() {
        let still = FfmpegConverter::sticker_args(false);
        let anim = FfmpegConverter::sticker_args(true);
        assert!(!still.contains(&"-t".to_string()));
        assert!(anim.contains(&"-t".to_string()));
        assert!(anim.contains(&"libwebp".to_string()));
        assert_eq!(still.last().map(String::as_str), Some("webp"));
    }

    #[tokio::test]
    async fn test_webp_input_skips_ffmpeg() {
        // Nonexistent binary: the call must not need it.
        let conv = converter("/nonexistent/ffmpeg");
        let mut data = vec![0x2f];
        data.extend_from_slice(&0u32.to_le_bytes());
        data.push(0);
        let mut webp = b"RIFF".to_vec();
        webp.extend_from_slice(&((4 + 8 + data.len()) as u32).to_le_bytes());
        webp.extend_from_slice(b"WEBPVP8L");
        webp.extend_from_slice(&(data.len() as u32).to_le_bytes());
        webp.extend_from_slice(&data);

        let pack = StickerPack {
            name: "p".into(),
            publisher: "a".into(),
        };
        let out = conv.to_sticker(webp, "image/webp", &pack).await.unwrap();
        assert_eq!(&out[12..16], b"VP8X");
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let conv = converter("/nonexistent/ffmpeg");
        let err = conv.to_audio(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, ZaydenError::Media(_)));
        assert!(!is_available("/nonexistent/ffmpeg").await);
    }
}
