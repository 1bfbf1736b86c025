//! Media probe backed by the local file system.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{MediaInfo, MediaKind, MediaProbe},
};
use core_async::task::spawn_blocking;
use lofty::config::ParseOptions;
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Probes media files on disk.
///
/// - Audio length comes from the container via `lofty`
/// - Video length is read the same way when `lofty` understands the
///   container (MP4 does); otherwise it is reported as unknown and the item
///   waits for the operator
/// - Image size is decoded from the header with `image`
/// - Text slides are read as UTF-8
///
/// Relative sources resolve against the base directory, which defaults to
/// the process working directory. Audio, video and image files are opened
/// on the blocking pool and only their headers are read.
pub struct LocalMediaProbe {
    base_dir: Option<PathBuf>,
    parse_options: ParseOptions,
}

impl LocalMediaProbe {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            parse_options: ParseOptions::new(),
        }
    }

    /// Resolve relative sources against `base_dir`, typically the directory
    /// holding the playlist file.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::new()
        }
    }

    pub fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(|e| open_error(path, e))
    }

    async fn timed_duration(&self, kind: MediaKind, path: &Path) -> Result<Option<Duration>> {
        let options = self.parse_options;
        let owned = path.to_path_buf();

        let parsed = spawn_blocking(move || -> Result<std::result::Result<Duration, String>> {
            let reader = open_buffered(&owned)?;
            let parsed = Probe::new(reader)
                .options(options)
                .guess_file_type()
                .map_err(|e| e.to_string())
                .and_then(|probe| probe.read().map_err(|e| e.to_string()))
                .map(|tagged| tagged.properties().duration());
            Ok(parsed)
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("probe task failed: {e}")))??;

        match parsed {
            Ok(duration) if duration.is_zero() => Ok(None),
            Ok(duration) => Ok(Some(duration)),
            Err(reason) if kind == MediaKind::Video => {
                debug!(path = %path.display(), %reason, "Video length unknown");
                Ok(None)
            }
            Err(reason) => Err(BridgeError::Unsupported(format!(
                "{}: {reason}",
                path.display()
            ))),
        }
    }

    async fn image_info(&self, path: &Path) -> Result<MediaInfo> {
        let owned = path.to_path_buf();

        let (width, height) = spawn_blocking(move || {
            image::ImageReader::new(open_buffered(&owned)?)
                .with_guessed_format()
                .map_err(BridgeError::Io)?
                .into_dimensions()
                .map_err(|e| BridgeError::Unsupported(format!("{}: {e}", owned.display())))
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("probe task failed: {e}")))??;

        Ok(MediaInfo::default().with_dimensions(width, height))
    }

    async fn text_info(&self, path: &Path) -> Result<MediaInfo> {
        let data = self.read(path).await?;
        let body = String::from_utf8(data).map_err(|_| {
            BridgeError::Unsupported(format!("{}: text is not valid UTF-8", path.display()))
        })?;
        Ok(MediaInfo::default().with_body(body))
    }
}

fn open_error(path: &Path, err: std::io::Error) -> BridgeError {
    match err.kind() {
        ErrorKind::NotFound => {
            BridgeError::NotAvailable(format!("media source not found: {}", path.display()))
        }
        _ => BridgeError::Io(err),
    }
}

fn open_buffered(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| open_error(path, e))
}

impl Default for LocalMediaProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for LocalMediaProbe {
    async fn probe(&self, kind: MediaKind, source: &str) -> Result<MediaInfo> {
        let path = self.resolve(source);
        debug!(%kind, path = %path.display(), "Probing media");

        let info = match kind {
            MediaKind::Audio | MediaKind::Video => match self.timed_duration(kind, &path).await? {
                Some(duration) => MediaInfo::default().with_duration(duration),
                None => MediaInfo::default(),
            },
            MediaKind::Image => self.image_info(&path).await?,
            MediaKind::Text => self.text_info(&path).await?,
        };

        debug!(%kind, duration = ?info.duration, dimensions = ?info.dimensions, "Probe complete");
        Ok(info)
    }
}
