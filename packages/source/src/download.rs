//! Streaming archive download.

use std::path::{Path, PathBuf};

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::AcquisitionError;
use crate::progress::ProgressCallback;

/// Name of the file a URL is saved as: its last path segment.
#[must_use]
pub fn archive_file_name(url: &str) -> String {
    url.split(['?', '#'])
        .next()
        .and_then(|u| u.rsplit('/').find(|s| !s.is_empty()))
        .unwrap_or("download.zip")
        .to_string()
}

/// Downloads `url` into `dir` unless a file of the same name is already
/// there, returning the local path. `progress` is finished either way.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if the download fails.
pub async fn fetch_archive(
    url: &str,
    dir: &Path,
    progress: &dyn ProgressCallback,
) -> Result<PathBuf, AcquisitionError> {
    let dest = dir.join(archive_file_name(url));
    if dest.exists() {
        log::info!("Using cached archive {}", dest.display());
        progress.finish(format!("Using cached {}", archive_file_name(url)));
        return Ok(dest);
    }

    download_file(url, &dest, progress).await?;
    Ok(dest)
}

/// Downloads a file from a URL to a local path.
///
/// The body is streamed to a `.part` file that is renamed into place only
/// once complete, so an interrupted download never looks cached.
///
/// # Errors
///
/// Returns an error if the HTTP request fails, the response is not
/// successful, or the local file cannot be written.
pub async fn download_file(
    url: &str,
    dest: &Path,
    progress: &dyn ProgressCallback,
) -> Result<u64, AcquisitionError> {
    log::info!("Downloading {url}");
    log::info!("  -> {}", dest.display());

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AcquisitionError::io(parent, e))?;
    }

    let client = reqwest::Client::builder()
        .user_agent("tornado-track/0.1")
        .build()?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(AcquisitionError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    if let Some(size) = response.content_length() {
        progress.set_total(size);
        #[allow(clippy::cast_precision_loss)]
        let mb = size as f64 / 1_048_576.0;
        log::info!("  file size: {mb:.1} MB");
    }
    progress.set_message(format!("Downloading {}", archive_file_name(url)));

    let part = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&part)
        .await
        .map_err(|e| AcquisitionError::io(&part, e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| AcquisitionError::io(&part, e))?;
        downloaded += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    file.flush()
        .await
        .map_err(|e| AcquisitionError::io(&part, e))?;
    drop(file);

    tokio::fs::rename(&part, dest)
        .await
        .map_err(|e| AcquisitionError::io(dest, e))?;

    #[allow(clippy::cast_precision_loss)]
    let mb = downloaded as f64 / 1_048_576.0;
    log::info!("  download complete: {mb:.1} MB");
    progress.finish(format!("Downloaded {}", archive_file_name(url)));

    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use crate::progress::tests::RecordingProgress;
    use crate::scratch::ScratchDir;

    #[test]
    fn file_name_from_url() {
        assert_eq!(
            archive_file_name(
                "https://www.spc.noaa.gov/gis/svrgis/zipped/1950-2017-torn-aspath.zip"
            ),
            "1950-2017-torn-aspath.zip"
        );
        assert_eq!(
            archive_file_name("https://example.org/data/tracks.zip?token=abc"),
            "tracks.zip"
        );
        assert_eq!(archive_file_name("https://example.org/"), "example.org");
    }

    #[tokio::test]
    async fn cached_archive_skips_download() {
        let scratch = ScratchDir::create().unwrap();
        let cached = scratch.path().join("tracks.zip");
        std::fs::write(&cached, b"PK").unwrap();

        let progress = RecordingProgress::default();
        // Unroutable URL: reaching the network would fail the test.
        let path = fetch_archive("http://127.0.0.1:9/tracks.zip", scratch.path(), &progress)
            .await
            .unwrap();
        assert_eq!(path, cached);
        assert_eq!(progress.finished(), ["Using cached tracks.zip"]);
    }

    #[tokio::test]
    async fn unreachable_host_is_an_acquisition_error() {
        let scratch = ScratchDir::create().unwrap();
        let err = fetch_archive("http://127.0.0.1:9/tracks.zip", scratch.path(), &NullProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Http(_)));
        assert!(!scratch.path().join("tracks.zip").exists());
    }
}
