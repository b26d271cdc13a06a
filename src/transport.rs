use std::path::PathBuf;

use url::Url;

use crate::error::{TtyreelError, TtyreelResult};

/// The bytes-and-status result of fetching a source URL.
#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(bytes: Vec<u8>) -> Self {
        Self { status: 200, bytes }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the bytes of a resolved source URL.
///
/// Implementations are synchronous from the engine's point of view; an
/// async host keeps its own transport and feeds results back through
/// `Player::complete_fetch` instead.
pub trait Transport {
    fn fetch(&mut self, url: &str) -> TtyreelResult<FetchResponse>;
}

/// Serves `file://` URLs and plain filesystem paths. The transport the
/// CLI host uses.
#[derive(Debug, Default)]
pub struct FsTransport;

impl Transport for FsTransport {
    fn fetch(&mut self, url: &str) -> TtyreelResult<FetchResponse> {
        let path = match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map_err(|()| TtyreelError::transport(format!("not a local file URL: {url}")))?,
            Ok(parsed) => {
                return Err(TtyreelError::transport(format!(
                    "unsupported URL scheme '{}'",
                    parsed.scheme()
                )));
            }
            Err(_) => PathBuf::from(url),
        };
        let bytes = std::fs::read(&path)
            .map_err(|e| TtyreelError::transport(format!("read '{}': {e}", path.display())))?;
        Ok(FetchResponse::ok(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls_and_plain_paths_are_served() {
        let dir = std::env::temp_dir().join("ttyreel_transport_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bytes.bin");
        std::fs::write(&path, b"abc").unwrap();

        let mut transport = FsTransport;
        let by_path = transport.fetch(&path.to_string_lossy()).unwrap();
        assert_eq!(by_path.bytes, b"abc");
        assert!(by_path.is_success());

        let url = Url::from_file_path(&path).unwrap();
        let by_url = transport.fetch(url.as_str()).unwrap();
        assert_eq!(by_url.bytes, b"abc");
    }

    #[test]
    fn unknown_schemes_are_transport_errors() {
        let mut transport = FsTransport;
        let err = transport.fetch("gopher://example.com/x").unwrap_err();
        assert!(matches!(err, TtyreelError::Transport(_)));
    }
}
