use isam_file::{Config, ErrorKind, IsamFile};
use std::io::Write;
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn key_length_must_be_in_range() -> TestResult {
    let folder = tempfile::tempdir()?;

    for bad in [0, 7, 41, 1000] {
        let err = Config::new(folder.path().join("bad.db"))
            .key_len(bad)
            .create()
            .expect_err("key length is out of range");
        assert_eq!(ErrorKind::KeyLen, err.kind());
    }

    for good in [8, 40] {
        let path = folder.path().join(format!("good{good}.db"));
        Config::new(path).key_len(good).create()?;
    }

    Ok(())
}

#[test]
fn create_refuses_existing_files() -> TestResult {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("exists.db");

    Config::new(&path).key_len(8).create()?;

    let err = Config::new(&path)
        .key_len(8)
        .create()
        .expect_err("file exists");
    assert_eq!(ErrorKind::FileExists, err.kind());

    Ok(())
}

#[test]
fn open_refuses_missing_and_foreign_files() -> TestResult {
    let folder = tempfile::tempdir()?;

    let err = IsamFile::open(folder.path().join("nope.db")).expect_err("missing");
    assert_eq!(ErrorKind::NoSuchFile, err.kind());

    // a file that starts with anything but the magic word is rejected
    let foreign = folder.path().join("foreign.db");
    std::fs::File::create(&foreign)?.write_all(&[0xAA; 256])?;

    let err = IsamFile::open(&foreign).expect_err("foreign file");
    assert_eq!(ErrorKind::BadMagic, err.kind());

    // too short for even a header
    let stub = folder.path().join("stub.db");
    std::fs::File::create(&stub)?.write_all(&[0x7E, 0xF1, 0xA8, 0x15])?;

    let err = IsamFile::open(&stub).expect_err("truncated file");
    assert_eq!(ErrorKind::ReadError, err.kind());

    Ok(())
}

#[test]
fn reopened_files_keep_their_geometry() -> TestResult {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("geom.db");

    {
        let file = Config::new(&path)
            .key_len(12)
            .data_len(20)
            .records_per_block(8)
            .block_count(16)
            .create()?;
        file.close()?;
    }

    let file = IsamFile::open(&path)?;
    assert_eq!(12, file.key_len());
    assert_eq!(20, file.data_len());

    Ok(())
}
