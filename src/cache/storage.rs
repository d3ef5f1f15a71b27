use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::fs;

/// File storage under a base directory, addressable by relative key and
/// served back through a public base URL.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self {
            base_dir,
            base_url: normalize_base_url(&base_url),
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key);
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    pub fn get_result_prefix(hash: &str) -> String {
        format!("results/{hash}")
    }

    pub fn get_meta_key(prefix: &str) -> String {
        format!("{prefix}/meta.json")
    }

    pub fn get_output_key(prefix: &str, ext: &str) -> String {
        format!("{prefix}/output.{ext}")
    }

    pub fn resolve_path(&self, key: &str) -> PathBuf {
        let normalized = key.trim_start_matches('/');
        self.base_dir.join(Path::new(normalized))
    }
}

/// Strips trailing slashes and collapses accidentally doubled schemes
/// (`http://https://host` style values showing up from concatenated env
/// configuration).
fn normalize_base_url(raw: &str) -> String {
    let mut base = raw.trim().trim_end_matches('/').to_string();
    loop {
        let stripped = base
            .strip_prefix("http://http://")
            .map(|rest| format!("http://{rest}"))
            .or_else(|| {
                base.strip_prefix("https://https://")
                    .map(|rest| format!("https://{rest}"))
            })
            .or_else(|| {
                base.strip_prefix("http://https://")
                    .map(|rest| format!("https://{rest}"))
            })
            .or_else(|| {
                base.strip_prefix("https://http://")
                    .map(|rest| format!("http://{rest}"))
            });
        match stripped {
            Some(next) => base = next,
            None => return base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_joins_key() {
        let storage = LocalFileStorage::new(PathBuf::from("/tmp"), "http://host/cache/".into());
        assert_eq!(
            storage.get_public_url("/results/abc/output.png"),
            "http://host/cache/results/abc/output.png"
        );
    }

    #[test]
    fn doubled_schemes_are_collapsed() {
        assert_eq!(
            normalize_base_url("http://https://host/cache"),
            "https://host/cache"
        );
        assert_eq!(
            normalize_base_url("http://http://http://host"),
            "http://host"
        );
    }
}
