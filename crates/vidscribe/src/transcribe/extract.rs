use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::error::ExtractError;

/// Media preprocessor: pulls the audio track out of a container file as a
/// mono 16 kHz WAV via an ffmpeg subprocess. The call blocks on the job's
/// dedicated thread; failure is observed through the exit status and the
/// presence of the output file.
pub struct AudioExtractor {
    ffmpeg_path: PathBuf,
}

impl AudioExtractor {
    pub fn new<P: AsRef<Path>>(ffmpeg_path: P) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.as_ref().to_path_buf(),
        }
    }

    /// True when the input holds a video container that needs its audio
    /// track extracted before the engine can consume it.
    pub fn needs_extraction(input: &Path) -> bool {
        mime_guess::from_path(input)
            .first()
            .map(|m| m.type_() == mime_guess::mime::VIDEO)
            .unwrap_or(false)
    }

    pub fn extract(&self, input: &Path, output: &Path) -> Result<(), ExtractError> {
        info!(
            "Extracting audio from {} to {}",
            input.display(),
            output.display()
        );

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-ar", "16000", "-ac", "1"])
            .arg(output)
            .output()
            .map_err(|e| ExtractError::Spawn {
                program: self.ffmpeg_path.clone(),
                source: e,
            })?;

        debug!(
            "ffmpeg stderr: {}",
            String::from_utf8_lossy(&result.stderr).trim()
        );

        if !result.status.success() {
            return Err(ExtractError::CommandFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !output.exists() {
            return Err(ExtractError::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}
