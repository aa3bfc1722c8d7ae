use qetag::{sum, sum_paths, EtagError, LocalBackend, SumOptions, EMPTY_ETAG};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

fn options(threads: usize) -> SumOptions<'static> {
    SumOptions {
        threads,
        include: None,
        exclude: None,
        no_progress: true,
    }
}

#[test]
fn test_sum_paths_walks_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
    fs::write(dir.path().join("a.bin"), b"hello world").unwrap();
    fs::write(dir.path().join("nested/b.bin"), vec![7u8; 4096]).unwrap();
    fs::write(dir.path().join("nested/deeper/c.bin"), b"").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &options(4));

    assert_eq!(results.len(), 3);
    for file in &results {
        let expected = sum(&file.path).unwrap();
        assert_eq!(file.result.as_ref().unwrap(), &expected);
    }
    let empty = results
        .iter()
        .find(|f| f.path.ends_with("nested/deeper/c.bin"))
        .unwrap();
    assert_eq!(empty.size, 0);
    assert_eq!(empty.result.as_ref().unwrap(), &EMPTY_ETAG);
}

#[test]
fn test_sum_paths_keeps_root_order() {
    let dir = tempdir().unwrap();
    let names = ["z", "y", "x", "w", "v"];
    let mut roots: Vec<PathBuf> = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let path = dir.path().join(name);
        fs::write(&path, vec![i as u8; 100 * (i + 1)]).unwrap();
        roots.push(path);
    }

    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &options(3));
    let paths: Vec<_> = results.iter().map(|f| f.path.clone()).collect();
    assert_eq!(paths, roots);
    assert!(results.iter().all(|f| f.result.is_ok()));
}

#[test]
fn test_sum_paths_filters() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("keep.dat"), b"1").unwrap();
    fs::write(dir.path().join("skip.tmp"), b"2").unwrap();
    fs::write(dir.path().join("drop.dat"), b"3").unwrap();

    let include = regex::Regex::new(r"\.dat$").unwrap();
    let exclude = regex::Regex::new("drop").unwrap();
    let opts = SumOptions {
        threads: 2,
        include: Some(&include),
        exclude: Some(&exclude),
        no_progress: true,
    };
    let roots = vec![dir.path().to_path_buf()];
    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &opts);

    assert_eq!(results.len(), 1);
    assert!(results[0].path.ends_with("keep.dat"));
}

#[test]
fn test_sum_paths_reports_missing_root() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good");
    fs::write(&good, b"data").unwrap();
    let roots = vec![dir.path().join("missing"), good];

    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &options(1));
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0].result, Err(EtagError::Io(_))));
    assert!(results[1].result.is_ok());
}

#[cfg(unix)]
#[test]
fn test_sum_paths_reports_special_file_root() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good");
    fs::write(&good, b"data").unwrap();
    let roots = vec![PathBuf::from("/dev/null"), good];

    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &options(2));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].path, PathBuf::from("/dev/null"));
    assert!(matches!(results[0].result, Err(EtagError::Other(_))));
    assert!(results[1].result.is_ok());
}

#[cfg(unix)]
#[test]
fn test_sum_paths_non_utf8_names() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let name = dir.path().join(OsStr::from_bytes(b"\xffname.bin"));
    fs::write(&name, b"hello world").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let results = sum_paths(Arc::new(LocalBackend::new()), &roots, &options(2));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, name);
    assert_eq!(
        results[0].result.as_ref().unwrap(),
        &"FiqubDXJT8-0FdvpX0CLnOke6Ebt"
    );
}
