use isam_file::{Config, IsamFile};
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn single_record_round_trip() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("t.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(4)
        .create()?;

    assert!(file.is_empty());
    assert_eq!(8, file.key_len());
    assert_eq!(4, file.data_len());

    file.write_new("alpha   ", [0x01, 0x02, 0x03, 0x04])?;

    assert_eq!(vec![0x01, 0x02, 0x03, 0x04], file.read_by_key("alpha   ")?);
    assert_eq!(1, file.len());

    Ok(())
}

#[test]
fn value_survives_reopen() -> TestResult {
    let folder = tempfile::tempdir()?;
    let path = folder.path().join("t.db");

    {
        let mut file = Config::new(&path)
            .key_len(8)
            .data_len(4)
            .records_per_block(4)
            .block_count(4)
            .create()?;
        file.write_new("alpha   ", [0x01, 0x02, 0x03, 0x04])?;
        file.close()?;
    }

    let mut file = IsamFile::open(&path)?;
    assert_eq!(1, file.len());
    assert_eq!(vec![0x01, 0x02, 0x03, 0x04], file.read_by_key("alpha   ")?);

    Ok(())
}
