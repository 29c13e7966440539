//! Fixtures shared by unit tests: throwaway site trees and parsed requests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_std::io::Cursor;
use async_std::task;
use temp_dir::TempDir;

use crate::config::{Config, Host, Sites};
use crate::http::parser::{ReadLimits, read_request};
use crate::http::request::Request;

/// A temporary directory removed on drop. `root()` is the www root and
/// `outside()` a sibling directory beyond it.
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.child("www")).unwrap();
        fs::create_dir(dir.child("outside")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.child("www")
    }

    pub fn outside(&self) -> PathBuf {
        self.dir.child("outside")
    }

    pub fn file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[cfg(unix)]
    pub fn symlink(&self, target: &Path, rel: &str) -> PathBuf {
        let link = self.root().join(rel);
        std::os::unix::fs::symlink(target, &link).unwrap();
        link
    }

    pub fn host_config(&self) -> Config {
        Config::new()
            .with("root", &self.root().to_string_lossy())
            .with("default", "yes")
    }

    pub fn sites(&self) -> Sites {
        self.sites_with(Config::new(), self.host_config(), HashMap::new())
    }

    pub fn sites_with(
        &self,
        settings: Config,
        host_config: Config,
        documents: HashMap<String, Config>,
    ) -> Sites {
        let host = Host::new("example.com", host_config, documents);
        Sites::new(settings, vec![host]).unwrap()
    }
}

pub fn request(sites: &Sites, raw: &str) -> Request {
    let mut cursor = Cursor::new(raw.as_bytes().to_vec());
    let raw = task::block_on(read_request(&mut cursor, ReadLimits::default())).unwrap();
    Request::from_raw(raw, sites, "127.0.0.1")
}
