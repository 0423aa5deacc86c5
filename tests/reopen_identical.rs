use isam_file::{Config, IsamFile};
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn open_and_close_leave_the_file_untouched() -> TestResult {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("bytes.db");

    {
        let mut file = Config::new(&path)
            .key_len(8)
            .data_len(4)
            .records_per_block(4)
            .block_count(4)
            .create()?;
        for key in ["one", "two", "three", "four", "five"] {
            file.write_new(key, *b"data")?;
        }
        file.delete("two", *b"data")?;
        file.close()?;
    }

    let before = std::fs::read(&path)?;

    // opening only reads; closing writes nothing back
    IsamFile::open(&path)?.close()?;

    let after = std::fs::read(&path)?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn clean_files_carry_no_updating_mark() -> TestResult {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("clean.db");

    {
        let mut file = Config::new(&path)
            .key_len(8)
            .data_len(4)
            .records_per_block(4)
            .block_count(4)
            .create()?;
        file.write_new("steady", *b"....")?;
        file.close()?;
    }

    // the file_state word is the last of the twelve header words
    let bytes = std::fs::read(&path)?;
    let state = u64::from_le_bytes(bytes[88..96].try_into()?);
    assert_eq!(0, state & 1024);

    Ok(())
}
