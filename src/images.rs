use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::CardError;

/// `//host/img.jpg` becomes `https://host/img.jpg`; anything else is returned as-is.
pub fn normalize_image_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

static INDEXED_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3,}\.jpg(\.part)?$").expect("static pattern"));

/// Deterministic image name for a record index: `7` -> `007.jpg`.
pub fn image_file_name(index: usize) -> String {
    format!("{:03}.jpg", index)
}

/// Downloads product images into one directory, one file per record index.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    dir: PathBuf,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client, dir: impl Into<PathBuf>) -> Self {
        Self { client, dir: dir.into() }
    }

    /// Remove `NNN.jpg` / `NNN.jpg.part` files left by an earlier run, so every
    /// indexed file in the directory belongs to a record of this run. Other
    /// files are left alone. Returns how many were removed.
    pub async fn clear_previous(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let is_indexed = name.to_str().is_some_and(|n| INDEXED_IMAGE.is_match(n));
            if is_indexed && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("Removed {} image(s) from a previous run in {}", removed, self.dir.display());
        }
        Ok(removed)
    }

    /// Download `image_url` to `{dir}/{index:03}.jpg` and return the file name.
    ///
    /// An empty URL performs no I/O and yields an empty name. On any failure
    /// nothing is left behind under the final name or its `.part` sibling.
    pub async fn fetch(&self, image_url: &str, index: usize) -> Result<String, CardError> {
        if image_url.is_empty() {
            return Ok(String::new());
        }

        let url = normalize_image_url(image_url);
        let name = image_file_name(index);
        debug!("[{}] downloading {}", index, url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CardError::HttpStatus { status: status.as_u16(), url });
        }
        let bytes = response.bytes().await?;

        let final_path = self.dir.join(&name);
        let part_path = self.dir.join(format!("{}.part", name));
        if let Err(e) = write_atomically(&part_path, &final_path, &bytes).await {
            match tokio::fs::remove_file(&part_path).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                Err(cleanup) => warn!(
                    "⚠️ Could not remove partial image {}: {}",
                    part_path.display(),
                    cleanup
                ),
            }
            return Err(e.into());
        }

        info!("\t[{}] Image saved: {}", index, name);
        Ok(name)
    }
}

async fn write_atomically(part: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(part, bytes).await?;
    tokio::fs::rename(part, target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn protocol_relative_urls_get_https() {
        assert_eq!(
            normalize_image_url("//s.alicdn.com/kf/H1.jpg"),
            "https://s.alicdn.com/kf/H1.jpg"
        );
    }

    #[test]
    fn absolute_and_relative_urls_are_untouched() {
        assert_eq!(normalize_image_url("http://a.com/x.jpg"), "http://a.com/x.jpg");
        assert_eq!(normalize_image_url("/img/x.jpg"), "/img/x.jpg");
        assert_eq!(normalize_image_url(""), "");
    }

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(image_file_name(0), "000.jpg");
        assert_eq!(image_file_name(42), "042.jpg");
        assert_eq!(image_file_name(1234), "1234.jpg");
    }

    #[tokio::test]
    async fn empty_url_does_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(reqwest::Client::new(), dir.path());

        let name = fetcher.fetch("", 3).await.unwrap();

        assert_eq!(name, "");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn downloads_bytes_under_index_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kf/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\xFF\xD8jpeg".to_vec()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(reqwest::Client::new(), dir.path());

        let name = fetcher
            .fetch(&format!("{}/kf/a.jpg", server.uri()), 5)
            .await
            .unwrap();

        assert_eq!(name, "005.jpg");
        assert_eq!(std::fs::read(dir.path().join("005.jpg")).unwrap(), b"\xFF\xD8jpeg");
        assert!(!dir.path().join("005.jpg.part").exists());
    }

    #[tokio::test]
    async fn failed_download_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ImageFetcher::new(reqwest::Client::new(), dir.path());

        let err = fetcher
            .fetch(&format!("{}/missing.jpg", server.uri()), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, CardError::HttpStatus { status: 404, .. }), "got: {err:?}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn clear_previous_removes_only_indexed_images() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["000.jpg", "001.jpg", "1234.jpg", "002.jpg.part", "cover.jpg", "01.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("003.jpg")).unwrap();
        let fetcher = ImageFetcher::new(reqwest::Client::new(), dir.path());

        let removed = fetcher.clear_previous().await.unwrap();

        assert_eq!(removed, 4);
        let mut left: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["003.jpg", "01.jpg", "cover.jpg", "notes.txt"]);
    }

    #[tokio::test]
    async fn rename_failure_removes_the_part_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory squatting on the final name makes the rename fail.
        std::fs::create_dir(dir.path().join("004.jpg")).unwrap();
        std::fs::write(dir.path().join("004.jpg").join("keep"), b"x").unwrap();
        let fetcher = ImageFetcher::new(reqwest::Client::new(), dir.path());

        let err = fetcher
            .fetch(&format!("{}/a.jpg", server.uri()), 4)
            .await
            .unwrap_err();

        assert!(matches!(err, CardError::Io(_)), "got: {err:?}");
        assert!(!dir.path().join("004.jpg.part").exists());
    }

    #[tokio::test]
    async fn unwritable_directory_cleans_up_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created");
        let fetcher = ImageFetcher::new(reqwest::Client::new(), &missing);

        let err = fetcher
            .fetch(&format!("{}/a.jpg", server.uri()), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, CardError::Io(_)), "got: {err:?}");
        assert!(!missing.exists());
    }
}
