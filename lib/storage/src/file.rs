// JSON data file holding the domain list
use atomicwrites::{AtomicFile, OverwriteBehavior};
use domainmap_core::{Domain, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufReader;
use std::path::Path;

/// On-disk layout: `{"domains": [Domain...]}` in insertion order
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DomainFile {
    pub domains: Vec<Domain>,
}

impl DomainFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path.as_ref())?;
        let data = serde_json::from_reader(BufReader::new(file))?;
        Ok(data)
    }

    /// Replace the file atomically; readers of the path never see a torn write
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| serde_json::to_writer_pretty(f, self))
            .map_err(|e| match e {
                atomicwrites::Error::Internal(io) => Error::Io(io),
                atomicwrites::Error::User(json) => Error::from(json),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("domains.json");

        let file = DomainFile {
            domains: vec![
                Domain::root("t1", "Tech"),
                Domain::child("ai", "AI", "t1").with_description("machine learning"),
            ],
        };
        file.save(&path).unwrap();

        let loaded = DomainFile::load(&path).unwrap();
        assert_eq!(loaded.domains, file.domains);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.json");
        fs::write(&path, b"not json").unwrap();
        assert!(matches!(DomainFile::load(&path), Err(Error::Serialization(_))));
    }
}
