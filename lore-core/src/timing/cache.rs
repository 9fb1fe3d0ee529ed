use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::collection::ImageCollection;
use crate::container::manifest::{Manifest, Meta};
use crate::container::superblock::{Superblock, VERSION};
use crate::domain::{TimingRow, TimingVector, packed_len};
use crate::error::{LoreError, Result};
use crate::matrix::TimingMatrix;
use crate::stats::BuildStats;
use crate::timing::extract::{ExtractOptions, Extracted, extract_timing};

const TOOL: &str = "lore-core/timing-v1";

#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Extraction worker threads.
    pub workers: usize,
    pub extract: ExtractOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            extract: ExtractOptions::default(),
        }
    }
}

/// Header and manifest of a persisted matrix, without the row data.
#[derive(Clone, Debug)]
pub struct CacheInfo {
    pub rows: u64,
    pub width: u64,
    pub manifest: Manifest,
}

enum RowOutcome {
    Accepted(TimingRow),
    Rejected,
    Failed,
}

/// Extract every image in `collection` and assemble the matrix in file-name
/// order. Rejected or undecodable images are dropped.
pub fn build_matrix(
    collection: &ImageCollection,
    opts: &BuildOptions,
) -> Result<(TimingMatrix, BuildStats)> {
    let outcomes = collection.par_map(opts.workers, |file| {
        debug!(file = %file.name, "processing");
        let bytes = match file.read() {
            Ok(b) => b,
            Err(e) => {
                warn!(file = %file.name, error = %e, "unreadable image, skipping");
                return RowOutcome::Failed;
            }
        };
        match extract_timing(&bytes, &opts.extract) {
            Ok(Extracted::Vector(vector)) => RowOutcome::Accepted(TimingRow {
                source: file.name.clone(),
                vector,
            }),
            Ok(Extracted::Rejected(why)) => {
                info!(file = %file.name, reason = %why, "image rejected");
                RowOutcome::Rejected
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "undecodable image, skipping");
                RowOutcome::Failed
            }
        }
    })?;

    let mut stats = BuildStats {
        scanned: outcomes.len() as u64,
        ..Default::default()
    };
    let mut rows = Vec::new();
    for o in outcomes {
        match o {
            RowOutcome::Accepted(row) => {
                stats.accepted += 1;
                rows.push(row);
            }
            RowOutcome::Rejected => stats.rejected += 1,
            RowOutcome::Failed => stats.failed += 1,
        }
    }

    if rows.is_empty() {
        return Err(LoreError::EmptyCollection(collection.root().to_path_buf()));
    }
    let matrix = TimingMatrix::with_width(opts.extract.vector_len(), rows);
    Ok((matrix, stats))
}

/// On-disk timing matrix for one image directory. Never updated
/// incrementally; `invalidate` and rebuild after the collection changes.
pub struct TimingCache {
    path: PathBuf,
    images: PathBuf,
    opts: BuildOptions,
}

impl TimingCache {
    pub fn new(path: impl Into<PathBuf>, images: impl Into<PathBuf>, opts: BuildOptions) -> Self {
        Self {
            path: path.into(),
            images: images.into(),
            opts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached matrix, or a full rebuild when there is no readable cache.
    pub fn load(&self) -> Result<TimingMatrix> {
        if let Some(matrix) = self.read_cached()? {
            return Ok(matrix);
        }
        let (matrix, _) = self.rebuild()?;
        Ok(matrix)
    }

    pub fn rebuild(&self) -> Result<(TimingMatrix, BuildStats)> {
        let collection = ImageCollection::open(&self.images)?;
        info!(
            images = collection.len(),
            workers = self.opts.workers,
            "building timing matrix"
        );
        let (matrix, stats) = build_matrix(&collection, &self.opts)?;
        info!(
            scanned = stats.scanned,
            accepted = stats.accepted,
            rejected = stats.rejected,
            failed = stats.failed,
            "timing matrix built"
        );
        self.persist(&matrix, collection.fingerprint()?)?;
        Ok((matrix, stats))
    }

    /// Delete the cache file. Returns whether one existed.
    pub fn invalidate(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn info(&self) -> Result<Option<CacheInfo>> {
        let mut f = match File::open(&self.path) {
            Ok(f) => BufReader::new(f),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let sb = Superblock::read_from(&mut f)?;
        let manifest = read_manifest(&mut f, sb.manifest_len)?;
        Ok(Some(CacheInfo {
            rows: sb.rows,
            width: sb.width,
            manifest,
        }))
    }

    /// `Ok(None)` on a cache miss (absent or unreadable). A blob that parses
    /// but has the wrong shape is an error.
    fn read_cached(&self) -> Result<Option<TimingMatrix>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no timing cache");
                return Ok(None);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "timing cache unreadable, rebuilding");
                return Ok(None);
            }
        };
        let mut f = BufReader::new(f);

        let sb = match Superblock::read_from(&mut f) {
            Ok(sb) => sb,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "timing cache header unreadable, rebuilding");
                return Ok(None);
            }
        };
        if sb.version != VERSION {
            return Err(self.corrupt(format!(
                "layout version {}, expected {VERSION}; delete the cache",
                sb.version
            )));
        }
        let manifest = match read_manifest(&mut f, sb.manifest_len) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "timing cache manifest unreadable, rebuilding");
                return Ok(None);
            }
        };
        let payload = match zstd::stream::decode_all(&mut f) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "timing cache payload unreadable, rebuilding");
                return Ok(None);
            }
        };

        let matrix = self.assemble(&sb, manifest.sources, &payload)?;
        matrix.validate(self.opts.extract.vector_len(), &self.path)?;
        self.warn_if_stale(&manifest.meta);
        debug!(rows = matrix.row_count(), width = matrix.width(), "timing cache hit");
        Ok(Some(matrix))
    }

    fn assemble(&self, sb: &Superblock, sources: Vec<String>, payload: &[u8]) -> Result<TimingMatrix> {
        if sb.rows == 0 {
            return Err(self.corrupt("matrix has no rows".into()));
        }
        if sources.len() as u64 != sb.rows {
            return Err(self.corrupt(format!(
                "manifest lists {} sources for {} rows",
                sources.len(),
                sb.rows
            )));
        }
        let width = sb.width as usize;
        let stride = packed_len(width);
        let expected = stride
            .checked_mul(sources.len())
            .ok_or_else(|| self.corrupt("row data size overflows".into()))?;
        if payload.len() != expected {
            return Err(self.corrupt(format!(
                "row data is {} bytes, expected {expected}",
                payload.len()
            )));
        }
        let rows = sources
            .into_iter()
            .zip(payload.chunks(stride.max(1)))
            .map(|(source, bits)| TimingRow {
                source,
                vector: TimingVector::unpack(bits, width),
            })
            .collect();
        Ok(TimingMatrix::with_width(width, rows))
    }

    fn warn_if_stale(&self, meta: &Meta) {
        let current = ImageCollection::open(&self.images).and_then(|c| c.fingerprint());
        match current {
            Ok(fp) if fp != meta.fingerprint => warn!(
                images = %self.images.display(),
                "image collection changed since the timing cache was built; invalidate to pick it up"
            ),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "could not fingerprint image collection"),
        }
    }

    fn persist(&self, matrix: &TimingMatrix, fingerprint: [u8; 32]) -> Result<()> {
        let manifest = Manifest {
            sources: matrix.rows().iter().map(|r| r.source.clone()).collect(),
            meta: Meta {
                created: OffsetDateTime::now_utc().unix_timestamp(),
                tool: TOOL.to_string(),
                fingerprint,
            },
        };
        let mut manifest_buf = Vec::new();
        ciborium::ser::into_writer(&manifest, &mut manifest_buf)
            .map_err(|e| LoreError::Format(format!("manifest encode: {e}")))?;

        let mut raw = Vec::with_capacity(packed_len(matrix.width()) * matrix.row_count());
        for r in matrix.rows() {
            raw.extend_from_slice(&r.vector.pack());
        }
        let payload = zstd::stream::encode_all(&raw[..], 3)?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        Superblock {
            version: VERSION,
            rows: matrix.row_count() as u64,
            width: matrix.width() as u64,
            manifest_len: manifest_buf.len() as u64,
        }
        .write_to(&mut tmp)?;
        tmp.write_all(&manifest_buf)?;
        tmp.write_all(&payload)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        info!(path = %self.path.display(), bytes = payload.len(), "timing cache written");
        Ok(())
    }

    fn corrupt(&self, reason: String) -> LoreError {
        LoreError::CorruptCache {
            path: self.path.clone(),
            reason,
        }
    }
}

fn read_manifest(r: &mut impl Read, len: u64) -> Result<Manifest> {
    let mut buf = Vec::new();
    r.take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(LoreError::Format("manifest truncated".into()));
    }
    ciborium::de::from_reader(&buf[..]).map_err(|e| LoreError::Format(format!("manifest decode: {e}")))
}
