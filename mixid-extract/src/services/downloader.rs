//! SoundCloud downloader
//!
//! Shells out to `scdl` to fetch the mix as MP3 into the run's scratch
//! directory, then archives a copy under `<output_dir>/soundcloudtracks/`.

use crate::types::{ExtractionError, MediaSource};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default downloader executable
pub const DEFAULT_PROGRAM: &str = "scdl";

/// Archive folder inside the output directory
pub const ARCHIVE_SUBDIR: &str = "soundcloudtracks";

/// Media source backed by the `scdl` command-line tool
#[derive(Debug, Clone)]
pub struct ScdlDownloader {
    program: String,
    /// Where downloaded mixes are copied; `None` disables archiving
    archive_dir: Option<PathBuf>,
}

impl ScdlDownloader {
    pub fn new(program: impl Into<String>, archive_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            archive_dir,
        }
    }

    /// Downloader archiving into `<output_dir>/soundcloudtracks`
    pub fn for_output_dir(program: Option<String>, output_dir: &Path) -> Self {
        Self::new(
            program.unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            Some(output_dir.join(ARCHIVE_SUBDIR)),
        )
    }

    async fn archive(&self, media: &Path) {
        let Some(dir) = &self.archive_dir else {
            return;
        };
        let Some(file_name) = media.file_name() else {
            return;
        };

        let target = dir.join(file_name);
        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::copy(media, &target).await
        }
        .await;

        // Archiving is best effort; the run continues without it
        match result {
            Ok(_) => tracing::info!(path = %target.display(), "Archived downloaded track"),
            Err(e) => tracing::warn!(path = %target.display(), error = %e, "Failed to archive track"),
        }
    }
}

#[async_trait::async_trait]
impl MediaSource for ScdlDownloader {
    async fn fetch(&self, source_url: &str, workdir: &Path) -> Result<PathBuf, ExtractionError> {
        tokio::fs::create_dir_all(workdir).await?;

        tracing::info!(source_url = %source_url, program = %self.program, "Downloading track");

        let output = Command::new(&self.program)
            .arg("-l")
            .arg(source_url)
            .arg("--path")
            .arg(workdir)
            .args(["--onlymp3", "--no-playlist-folder", "--overwrite", "--addtofile"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractionError::Download(format!("could not run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Download(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let media = find_first_mp3(workdir)?.ok_or(ExtractionError::NoAudioFile)?;
        self.archive(&media).await;
        Ok(media)
    }
}

/// First `.mp3` file in `dir` by name, if any
pub fn find_first_mp3(dir: &Path) -> Result<Option<PathBuf>, ExtractionError> {
    let mut mp3s: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
        })
        .collect();
    mp3s.sort();
    Ok(mp3s.into_iter().next())
}
