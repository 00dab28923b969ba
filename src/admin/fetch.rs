// Retrieval of the public roster page.

use crate::admin::*;

use log::{debug, info};

use std::fs;
use std::time::Duration;

pub trait RosterSource {
    fn fetch_page(&self) -> AdminResult<String>;
}

/// The live page, over HTTP. Any failure (DNS, timeout, non-success status)
/// is a connectivity error; there is no retry.
pub struct HttpSource {
    url: String,
    timeout_seconds: u64,
}

impl HttpSource {
    pub fn new(url: &str, timeout_seconds: u64) -> HttpSource {
        HttpSource {
            url: url.to_string(),
            timeout_seconds,
        }
    }
}

impl RosterSource for HttpSource {
    fn fetch_page(&self) -> AdminResult<String> {
        info!("fetch_page: GET {}", self.url);
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .user_agent(concat!("sdpadm/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(FetchSnafu { url: &self.url })?;
        let resp = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .context(FetchSnafu { url: &self.url })?;
        let body = resp.text().context(FetchSnafu { url: &self.url })?;
        debug!("fetch_page: {} bytes", body.len());
        Ok(body)
    }
}

/// A saved copy of the page.
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: &str) -> FileSource {
        FileSource {
            path: path.to_string(),
        }
    }
}

impl RosterSource for FileSource {
    fn fetch_page(&self) -> AdminResult<String> {
        info!("fetch_page: reading {:?}", self.path);
        fs::read_to_string(&self.path).context(ReadingPageSnafu { path: &self.path })
    }
}

#[cfg(test)]
pub struct StaticSource(pub String);

#[cfg(test)]
impl RosterSource for StaticSource {
    fn fetch_page(&self) -> AdminResult<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("page.html");
        fs::write(&p, "<div id=\"aba1\"></div>").unwrap();
        let src = FileSource::new(p.to_str().unwrap());
        assert_eq!(src.fetch_page().unwrap(), "<div id=\"aba1\"></div>");

        let missing = FileSource::new(dir.path().join("none.html").to_str().unwrap());
        assert!(matches!(
            missing.fetch_page(),
            Err(AdminError::ReadingPage { .. })
        ));
    }

    #[test]
    fn unreachable_host_is_a_fetch_error() {
        let src = HttpSource::new("http://127.0.0.1:9/roster", 1);
        assert!(matches!(src.fetch_page(), Err(AdminError::Fetch { .. })));
    }
}
