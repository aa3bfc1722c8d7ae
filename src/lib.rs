/// Project overview:
/// - Computes the block-hashed content Etag used to detect duplicate or changed
///   uploads in object storage
/// - The core (`etag`) is single-threaded and strictly sequential per file
/// - Batch hashing of many files uses a producer-consumer model with worker threads
/// - Include/exclude filtering via Regex, optional progress bar
///
/// Entry points:
/// - `compute_etag`: any reader plus its exact length
/// - `sum`: a local file, `Result` with the failure kind
/// - `get_etag`: a local file, empty string on any failure
/// - `sum_paths`: files and directory trees, one result per file
pub mod backends;
pub mod digest;
pub mod encoding;
pub mod etag;

pub use backends::{EtagError, LocalBackend, SourceBackend};
pub use etag::{block_count, compute_etag, compute_etag_with, Etag, BLOCK_SIZE, EMPTY_ETAG};

use crossbeam_channel::unbounded;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use walkdir::WalkDir;

/// Etag of a local file. The length comes from the file's metadata.
pub fn sum<P: AsRef<Path>>(path: P) -> Result<Etag, EtagError> {
    sum_with(&LocalBackend::new(), path.as_ref())
}

/// Etag of `path` as served by `backend`.
pub fn sum_with(backend: &dyn SourceBackend, path: &Path) -> Result<Etag, EtagError> {
    let (mut reader, len) = backend.open(path)?;
    compute_etag(&mut reader, len)
}

/// Etag of a local file, or an empty string if anything failed.
pub fn get_etag<P: AsRef<Path>>(path: P) -> String {
    match sum(path) {
        Ok(etag) => etag.into_string(),
        Err(e) => {
            log::debug!("etag failed: {}", e);
            String::new()
        }
    }
}

pub struct SumOptions<'a> {
    pub threads: usize,
    pub include: Option<&'a regex::Regex>,
    pub exclude: Option<&'a regex::Regex>,
    pub no_progress: bool,
}

impl Default for SumOptions<'_> {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            include: None,
            exclude: None,
            no_progress: true,
        }
    }
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct FileEtag {
    pub path: PathBuf,
    pub size: u64,
    pub result: Result<Etag, EtagError>,
}

/// Hash every file under `roots` in parallel.
///
/// Roots may be files or directories; directories are walked recursively and
/// filtered by the include/exclude patterns (explicit file roots are not
/// filtered). Results come back in discovery order. A root that cannot be
/// walked, or is neither a regular file nor a directory, yields a failed
/// entry for that root.
pub fn sum_paths(
    backend: Arc<dyn SourceBackend>,
    roots: &[PathBuf],
    options: &SumOptions,
) -> Vec<FileEtag> {
    let (tx, rx) = unbounded::<(usize, PathBuf, u64)>();

    // Progress bar: start as spinner, switch to bar when total is known
    let pb = if options.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_message("Scanning files...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Some(pb)
    };

    let results: Arc<Mutex<Vec<(usize, FileEtag)>>> = Arc::new(Mutex::new(Vec::new()));

    // Producer thread
    let roots = roots.to_vec();
    let include = options.include.cloned();
    let exclude = options.exclude.cloned();
    let pb_producer = pb.clone();
    let results_producer = Arc::clone(&results);
    let producer = thread::spawn(move || {
        let mut total_bytes = 0u64;
        let mut index = 0usize;
        let mut switched = false;
        let failed = |index: usize, path: PathBuf, err: EtagError| {
            lock(&results_producer).push((
                index,
                FileEtag {
                    path,
                    size: 0,
                    result: Err(err),
                },
            ));
        };
        for root in &roots {
            match std::fs::metadata(root) {
                Ok(meta) if meta.is_file() => {
                    if tx.send((index, root.clone(), meta.len())).is_err() {
                        return;
                    }
                    index += 1;
                    total_bytes += meta.len();
                }
                Ok(meta) if !meta.is_dir() => {
                    failed(
                        index,
                        root.clone(),
                        EtagError::Other(format!(
                            "{} is not a regular file or directory",
                            root.display()
                        )),
                    );
                    index += 1;
                }
                _ => {
                    for entry in WalkDir::new(root) {
                        let entry = match entry {
                            Ok(entry) => entry,
                            Err(e) => {
                                let path = e
                                    .path()
                                    .map(Path::to_path_buf)
                                    .unwrap_or_else(|| root.clone());
                                let err = match e.into_io_error() {
                                    Some(io) => EtagError::Io(io),
                                    None => EtagError::Other(format!(
                                        "cannot walk {}",
                                        path.display()
                                    )),
                                };
                                failed(index, path, err);
                                index += 1;
                                continue;
                            }
                        };
                        if !entry.file_type().is_file() {
                            continue;
                        }
                        let file_str = entry.path().to_string_lossy();
                        if let Some(ref re) = include {
                            if !re.is_match(&file_str) {
                                continue;
                            }
                        }
                        if let Some(ref re) = exclude {
                            if re.is_match(&file_str) {
                                continue;
                            }
                        }
                        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                        if tx.send((index, entry.into_path(), size)).is_err() {
                            return;
                        }
                        index += 1;
                        total_bytes += size;
                    }
                }
            }
            if let Some(pb) = pb_producer.as_ref() {
                if !switched && index > 0 {
                    if let Ok(style) = ProgressStyle::with_template(
                        "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    ) {
                        pb.set_style(style.progress_chars("##-"));
                    }
                    pb.set_message("Hashing...");
                    switched = true;
                }
                pb.set_length(total_bytes);
            }
        }
        log::debug!("Producer queued {} files, {} bytes", index, total_bytes);
    });

    // Worker threads
    let mut handles = Vec::new();
    for worker in 0..options.threads.max(1) {
        let rx = rx.clone();
        let backend = Arc::clone(&backend);
        let results = Arc::clone(&results);
        let pb_worker = pb.clone();

        let handle = thread::spawn(move || {
            while let Ok((index, path, size)) = rx.recv() {
                let result = sum_with(backend.as_ref(), &path);
                match &result {
                    Ok(etag) => log::info!("{} {}", etag, path.display()),
                    Err(e) => log::warn!("Failed to hash {}: {}", path.display(), e),
                }
                lock(&results).push((index, FileEtag { path, size, result }));
                if let Some(pb) = pb_worker.as_ref() {
                    pb.inc(size);
                }
            }
            log::debug!("Worker {} exiting", worker);
        });
        handles.push(handle);
    }
    drop(rx);

    if producer.join().is_err() {
        log::error!("Producer thread panicked");
    }
    for (i, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            log::error!("Worker thread {} panicked", i);
        }
    }
    if let Some(pb) = pb.as_ref() {
        pb.finish_with_message("Hashing complete");
    }

    let mut results = std::mem::take(&mut *lock(&results));
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, file)| file).collect()
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
