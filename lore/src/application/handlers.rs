use std::io::Write;
use std::path::PathBuf;

use lore_core::error::Result;
use lore_core::media::{gif_comments, read_frames};
use lore_core::timing::extract::resample;
use lore_core::{
    BuildOptions, CorrectionPolicy, Extracted, ExtractOptions, ImageCollection, SequenceMap,
    TimingCache, decode, parse_metadata, scan_collection,
};
use tracing::{info, warn};

use crate::presentation::cli::GlobalArgs;

fn extract_options(g: &GlobalArgs) -> ExtractOptions {
    ExtractOptions {
        expected_duration_ms: g.duration_ms,
        quantum_ms: g.quantum_ms,
        ..Default::default()
    }
}

fn cache_from_args(g: &GlobalArgs) -> TimingCache {
    let opts = BuildOptions {
        workers: g.workers,
        extract: extract_options(g),
    };
    TimingCache::new(g.cache.clone(), g.imgs.clone(), opts)
}

fn policy_from_args(g: &GlobalArgs) -> CorrectionPolicy {
    if g.no_corrections {
        CorrectionPolicy::default()
    } else {
        CorrectionPolicy::recovered_set()
    }
}

fn sequence_map(g: &GlobalArgs) -> Result<SequenceMap> {
    let collection = ImageCollection::open(&g.imgs)?;
    let entries = scan_collection(&collection, g.workers)?;
    info!(entries = entries.len(), images = collection.len(), "embedded sequence entries");
    Ok(SequenceMap::build(entries, &policy_from_args(g)))
}

pub fn handle_decode(g: &GlobalArgs) -> Result<()> {
    let matrix = cache_from_args(g).load()?;
    let seq = sequence_map(g)?;
    let message = decode(&matrix, &seq);
    let mut out = std::io::stdout().lock();
    writeln!(out, "{message}")?;
    Ok(())
}

pub fn handle_rebuild(g: &GlobalArgs) -> Result<()> {
    // rebuild replaces the file by rename; a failed build leaves it untouched
    let (matrix, stats) = cache_from_args(g).rebuild()?;
    eprintln!(
        "rebuild: {} rows x {} slots (scanned={} rejected={} failed={})",
        matrix.row_count(),
        matrix.width(),
        stats.scanned,
        stats.rejected,
        stats.failed
    );
    Ok(())
}

pub fn handle_invalidate(g: &GlobalArgs) -> Result<()> {
    let cache = cache_from_args(g);
    if cache.invalidate()? {
        eprintln!("invalidate: removed {}", cache.path().display());
    } else {
        eprintln!("invalidate: no cache at {}", cache.path().display());
    }
    Ok(())
}

pub fn handle_seqmap(g: &GlobalArgs) -> Result<()> {
    let seq = sequence_map(g)?;
    write_seqmap(&mut std::io::stdout().lock(), &seq)
}

fn write_seqmap(out: &mut impl Write, seq: &SequenceMap) -> Result<()> {
    for (position, ch) in seq.iter() {
        writeln!(out, "{position}\t{ch}")?;
    }
    Ok(())
}

pub fn handle_inspect(g: &GlobalArgs, image: PathBuf) -> Result<()> {
    let bytes = std::fs::read(&image)?;
    let opts = extract_options(g);
    let mut out = std::io::stdout().lock();

    writeln!(out, "{}", image.display())?;
    match gif_comments(&bytes) {
        Ok(comments) => match comments.iter().find_map(|c| parse_metadata(c)) {
            Some((position, ch)) => writeln!(out, "  sequence: {position} = {ch:?}")?,
            None => writeln!(out, "  sequence: none ({} comments)", comments.len())?,
        },
        Err(e) => writeln!(out, "  sequence: unreadable metadata ({e})")?,
    }

    let Some(frames) = read_frames(&bytes, opts.probe)? else {
        writeln!(out, "  rejected: probe pixel outside canvas")?;
        return Ok(());
    };
    writeln!(
        out,
        "  frames: {}  total: {}ms  expected: {}ms",
        frames.len(),
        frames.total_duration_ms(),
        opts.expected_duration_ms
    )?;
    match resample(&frames, &opts) {
        Extracted::Vector(v) => writeln!(out, "  accepted: {} slots", v.len())?,
        Extracted::Rejected(why) => writeln!(out, "  rejected: {why}")?,
    }
    Ok(())
}

pub fn handle_info(g: &GlobalArgs) -> Result<()> {
    let cache = cache_from_args(g);
    let Some(info) = cache.info()? else {
        eprintln!("info: no cache at {}", cache.path().display());
        return Ok(());
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "cache:       {}", cache.path().display())?;
    writeln!(out, "rows:        {}", info.rows)?;
    writeln!(out, "width:       {}", info.width)?;
    writeln!(out, "created:     {}", info.manifest.meta.created)?;
    writeln!(out, "tool:        {}", info.manifest.meta.tool)?;
    writeln!(out, "fingerprint: {}", hex::encode(info.manifest.meta.fingerprint))?;

    match ImageCollection::open(&g.imgs).and_then(|c| c.fingerprint()) {
        Ok(fp) if fp != info.manifest.meta.fingerprint => {
            warn!(imgs = %g.imgs.display(), "image collection differs from the cached build")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not fingerprint image collection"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn args(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            imgs: dir.join("imgs"),
            cache: dir.join("timing_data.bin"),
            workers: 1,
            duration_ms: 19_684_800,
            quantum_ms: 400,
            no_corrections: false,
            verbose: false,
        }
    }

    #[test]
    fn failed_rebuild_keeps_existing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let g = args(dir.path());
        fs::create_dir(&g.imgs).unwrap();
        fs::write(g.imgs.join("junk.gif"), b"not a gif").unwrap();
        fs::write(&g.cache, b"previous cache").unwrap();

        assert!(handle_rebuild(&g).is_err());
        assert_eq!(fs::read(&g.cache).unwrap(), b"previous cache");
    }

    #[test]
    fn seqmap_prints_raw_chars() {
        let seq = SequenceMap::build([(2, 'x'), (1, '^')], &CorrectionPolicy::default());
        let mut out = Vec::new();
        write_seqmap(&mut out, &seq).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\t \n1\t^\n2\tx\n");
    }

    #[test]
    fn invalidate_removes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let g = args(dir.path());
        fs::write(&g.cache, b"previous cache").unwrap();

        handle_invalidate(&g).unwrap();
        assert!(!g.cache.exists());
        handle_invalidate(&g).unwrap();
    }
}
