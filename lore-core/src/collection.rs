use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Clone, Debug)]
pub struct ImageFile {
    pub name: String,
    pub path: PathBuf,
}

impl ImageFile {
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }
}

/// Flat directory of locally available images, in file-name order.
#[derive(Clone, Debug)]
pub struct ImageCollection {
    root: PathBuf,
    files: Vec<ImageFile>,
}

impl ImageCollection {
    pub fn open(root: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for e in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
            let e = e?;
            if !e.file_type().is_file() {
                continue;
            }
            files.push(ImageFile {
                name: e.file_name().to_string_lossy().to_string(),
                path: e.path().to_path_buf(),
            });
        }
        // directory enumeration order is platform dependent; rows must not be
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[ImageFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Run `f` over every file on a pool of `workers` threads. Results keep
    /// file-name order.
    pub fn par_map<T, F>(&self, workers: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&ImageFile) -> T + Sync + Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()?;
        Ok(pool.install(|| self.files.par_iter().map(|file| f(file)).collect()))
    }

    /// blake3 over (name, size) of every file. Cheap staleness hint for the
    /// cache; file contents are not hashed.
    pub fn fingerprint(&self) -> Result<[u8; 32]> {
        let mut hasher = blake3::Hasher::new();
        for f in &self.files {
            let len = fs::metadata(&f.path)?.len();
            hasher.update(&(f.name.len() as u64).to_le_bytes());
            hasher.update(f.name.as_bytes());
            hasher.update(&len.to_le_bytes());
        }
        Ok(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_sorted_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.gif"), b"c").unwrap();
        fs::write(dir.path().join("a.gif"), b"a").unwrap();
        fs::write(dir.path().join("b.gif"), b"b").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("0.gif"), b"0").unwrap();

        let c = ImageCollection::open(dir.path()).unwrap();
        let names: Vec<_> = c.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.gif", "b.gif", "c.gif"]);
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageCollection::open(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, crate::error::LoreError::Walk(_)), "{err:?}");
    }

    #[test]
    fn fingerprint_tracks_sizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.gif"), b"a").unwrap();
        let before = ImageCollection::open(dir.path()).unwrap().fingerprint().unwrap();
        assert_eq!(
            before,
            ImageCollection::open(dir.path()).unwrap().fingerprint().unwrap()
        );

        fs::write(dir.path().join("a.gif"), b"aa").unwrap();
        let after = ImageCollection::open(dir.path()).unwrap().fingerprint().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn par_map_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["d", "a", "c", "b"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let c = ImageCollection::open(dir.path()).unwrap();
        let got = c.par_map(3, |f| f.read().unwrap()).unwrap();
        assert_eq!(got, [b"a", b"b", b"c", b"d"]);
    }
}
