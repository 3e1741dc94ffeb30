use super::*;

#[test]
fn test_unix_absolute_path_not_modified() {
    let cur = Path::new("/home/user/corpora");
    let result = expand_dir(cur, "/data/my-corpus");
    assert_eq!(result, PathBuf::from("/data/my-corpus"));
}

#[test]
fn test_windows_absolute_path_not_modified() {
    let cur = Path::new("/home/user/corpora");
    let result = expand_dir(cur, "c:/data/my-corpus");
    assert_eq!(result, PathBuf::from("c:/data/my-corpus"));
}

#[test]
fn test_relative_path_gets_curdir_prepended() {
    let cur = Path::new("/projects/corpora");
    let result = expand_dir(cur, "my-corpus");
    assert_eq!(result, PathBuf::from("/projects/corpora/my-corpus"));
}

#[test]
fn test_is_absolute_path_detection() {
    assert!(is_absolute_path("/a/b"));
    assert!(is_absolute_path("C:/a/b"));
    assert!(is_absolute_path("z:/a"));
    assert!(!is_absolute_path("a/b"));
    assert!(!is_absolute_path(""));
}

#[test]
fn test_try_narrow_overflow_is_compiler_failure() {
    let big: u64 = u64::from(u32::MAX) + 1;
    let err = try_narrow::<u32>(big, "maxNode").unwrap_err();
    assert!(matches!(err, Error::CompilerFailure(_)));
}

#[test]
fn test_try_narrow_ok() {
    let v: u32 = try_narrow(42u64, "x").unwrap();
    assert_eq!(v, 42);
}

#[test]
fn test_atomic_write_and_read_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let dst = dir.path().join("manifest");
    atomic_write(dir.path(), &dst, b"hello world").unwrap();
    let mut f = open_file_r(&dst).unwrap();
    let mut buf = String::new();
    f.read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "hello world");
}

#[test]
fn test_read_buffer_at_offset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    atomic_write(dir.path(), &path, b"0123456789").unwrap();
    let mut f = open_file_r(&path).unwrap();
    let buf = read_buffer_at(&mut f, 3, 4).unwrap();
    assert_eq!(buf, b"3456");
}

#[test]
fn test_read_buffer_at_short_read_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data");
    atomic_write(dir.path(), &path, b"short").unwrap();
    let mut f = open_file_r(&path).unwrap();
    assert!(read_buffer_at(&mut f, 0, 100).is_err());
}
