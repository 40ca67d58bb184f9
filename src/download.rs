use crate::cdn::parse_cdn_link;
use crate::config::SiteConfig;
use crate::logging::redact_url_for_log;
use crate::session::Session;
use crate::{FailerError, Result};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// Hex SHA-256 of the bytes written. Reported, not checked.
    pub sha256: String,
}

/// Saves CDN files, naming them after the CDN filename unless told otherwise.
#[derive(Debug, Clone, Default)]
pub struct DownloadExecutor {
    config: SiteConfig,
}

impl DownloadExecutor {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn download(
        &self,
        session: &Session,
        asset_link: &str,
        directory: &Path,
        filename: Option<&str>,
    ) -> Result<DownloadOutcome> {
        match filename {
            Some(name) => download_asset(session, asset_link, directory, name),
            None => {
                let name = parse_cdn_link(asset_link, &self.config)?.display_filename();
                download_asset(session, asset_link, directory, &name)
            }
        }
    }
}

/// Stream `asset_link` into `directory/filename`, replacing whatever is
/// there. Bytes go to a temporary sibling first and are renamed into place
/// once complete, so a failed transfer never leaves a truncated target.
/// The directory must already exist.
pub fn download_asset(
    session: &Session,
    asset_link: &str,
    directory: &Path,
    filename: &str,
) -> Result<DownloadOutcome> {
    let target = directory.join(filename);
    tracing::info!(
        url = %redact_url_for_log(asset_link),
        path = %target.display(),
        "downloading submission file"
    );

    let mut reader = session.transport().open(asset_link)?;

    let tmp_path = directory.join(format!(".{}.download", Uuid::new_v4().simple()));
    let (bytes_written, sha256) =
        match stream_to_file(asset_link, reader.as_mut(), &tmp_path, &target) {
            Ok(done) => done,
            Err(err) => {
                let _ = std::fs::remove_file(&tmp_path);
                tracing::warn!(path = %target.display(), error = %err, "download failed");
                return Err(err);
            }
        };

    if let Err(e) = std::fs::rename(&tmp_path, &target) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(FailerError::filesystem(&target, e));
    }

    tracing::debug!(path = %target.display(), bytes = bytes_written, "download finished");
    Ok(DownloadOutcome {
        path: target,
        bytes_written,
        sha256,
    })
}

fn stream_to_file(
    asset_link: &str,
    reader: &mut dyn Read,
    tmp_path: &Path,
    target: &Path,
) -> Result<(u64, String)> {
    let mut file = std::fs::File::create(tmp_path).map_err(|e| FailerError::filesystem(target, e))?;
    let mut hasher = Sha256::new();
    let mut total = 0_u64;
    let mut buf = [0u8; 1024 * 64];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| FailerError::transport(asset_link, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| FailerError::filesystem(target, e))?;
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    file.flush().map_err(|e| FailerError::filesystem(target, e))?;

    Ok((total, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use crate::transport::{Page, Transport};

    const ASSET: &str = "https://d.cdn.example.net/art/alice/1700000000.alice_mydrawing.png";

    fn example_site() -> SiteConfig {
        SiteConfig {
            cdn_host: "d.cdn.example.net".to_string(),
            ..SiteConfig::default()
        }
    }

    fn session_over(transport: impl Transport + 'static) -> Session {
        Session::new(Box::new(transport), false)
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .expect("read_dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".download"))
            .collect()
    }

    #[test]
    fn default_name_comes_from_the_cdn_link() {
        let data: Vec<u8> = (0..200_000_u32).map(|i| (i % 251) as u8).collect();
        let session = session_over(FakeTransport::new().bytes(ASSET, &data));
        let dir = tempfile::tempdir().expect("tempdir");

        let outcome = DownloadExecutor::new(example_site())
            .download(&session, ASSET, dir.path(), None)
            .expect("download");

        assert_eq!(outcome.path, dir.path().join("1700000000.alice_mydrawing.png"));
        assert_eq!(outcome.bytes_written, data.len() as u64);
        assert_eq!(std::fs::read(&outcome.path).expect("read"), data);
        assert_eq!(outcome.sha256, hex::encode(Sha256::digest(&data)));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn existing_file_is_overwritten() {
        let session = session_over(FakeTransport::new().bytes(ASSET, b"new"));
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("art.png");
        std::fs::write(&target, b"old contents that are longer").expect("seed");

        download_asset(&session, ASSET, dir.path(), "art.png").expect("download");
        assert_eq!(std::fs::read(&target).expect("read"), b"new");
    }

    #[test]
    fn unparseable_link_without_filename_fails() {
        let session = session_over(FakeTransport::new().bytes("https://elsewhere.net/x.png", b"x"));
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DownloadExecutor::new(example_site())
            .download(&session, "https://elsewhere.net/x.png", dir.path(), None)
            .expect_err("no name");
        assert!(matches!(err, FailerError::UnparseableAssetLink(_)), "{err}");
    }

    #[test]
    fn fetch_failure_is_transport_and_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");

        for transport in [
            FakeTransport::new().down(ASSET),
            FakeTransport::new().status(ASSET, 404),
        ] {
            let session = session_over(transport);
            let err = download_asset(&session, ASSET, dir.path(), "art.png").expect_err("fail");
            assert!(err.is_transport(), "{err}");
        }
        assert_eq!(std::fs::read_dir(dir.path()).expect("read_dir").count(), 0);
    }

    #[test]
    fn name_at_the_length_limit_still_saves() {
        let session = session_over(FakeTransport::new().bytes(ASSET, b"data"));
        let dir = tempfile::tempdir().expect("tempdir");
        let name = format!("{}.png", "a".repeat(251));

        let outcome = download_asset(&session, ASSET, dir.path(), &name).expect("download");
        assert_eq!(outcome.path, dir.path().join(&name));
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn missing_directory_is_filesystem_error() {
        let session = session_over(FakeTransport::new().bytes(ASSET, b"data"));
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");

        let err = download_asset(&session, ASSET, &missing, "art.png").expect_err("fail");
        assert!(matches!(err, FailerError::Filesystem { .. }), "{err}");
        assert_eq!(err.category(), crate::FailureCategory::Filesystem);
    }

    struct BrokenStream;

    impl Read for BrokenStream {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))
        }
    }

    struct DropsMidway;

    impl Transport for DropsMidway {
        fn get(&self, url: &str) -> Result<Page> {
            Err(FailerError::transport(url, "unused"))
        }

        fn post_form(&self, url: &str, _fields: &[(String, String)]) -> Result<Page> {
            Err(FailerError::transport(url, "unused"))
        }

        fn open(&self, _url: &str) -> Result<Box<dyn Read>> {
            Ok(Box::new(
                std::io::Cursor::new(b"first half".to_vec()).chain(BrokenStream),
            ))
        }
    }

    #[test]
    fn interrupted_stream_leaves_previous_file_alone() {
        let session = session_over(DropsMidway);
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("art.png");
        std::fs::write(&target, b"previous").expect("seed");

        let err = download_asset(&session, ASSET, dir.path(), "art.png").expect_err("fail");
        assert!(err.is_transport(), "{err}");
        assert_eq!(std::fs::read(&target).expect("read"), b"previous");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }
}
