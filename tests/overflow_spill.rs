use isam_file::{Config, ErrorKind};
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn appends_past_the_regular_area_spill_into_overflow() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("spill.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(2)
        .create()?;

    // regular capacity: block 0 carries the dummy plus two records,
    // block 1 three (last slots reserved); the rest goes to overflow
    for i in 1..=9u8 {
        file.write_new(format!("k{i}"), [i; 4])?;
    }
    assert_eq!(9, file.len());

    // regular: dummy + k1 + k2 in block 0, k3..k5 in block 1
    let stats = file.file_stats()?;
    assert_eq!(6, stats.regular.records_used);
    assert_eq!(2, stats.regular.records_empty);
    assert_eq!(4, stats.overflow.records_used);

    // k3 started regular block 1 and is indexed; overflow keys are not
    assert_eq!(1, file.block_for_key("k3")?);
    assert_eq!(1, file.block_for_key("k6")?);
    assert_eq!(1, file.block_for_key("k9")?);

    // everything is still reachable, in order
    file.set_key("")?;
    for i in 1..=9u8 {
        let (key, value) = file.read_next()?;
        assert_eq!(format!("k{i}").as_bytes(), &key[..]);
        assert_eq!([i; 4], value[..]);
    }
    assert_eq!(
        ErrorKind::EndOfFile,
        file.read_next().expect_err("scan is done").kind(),
    );

    Ok(())
}

#[test]
fn overflow_blocks_do_not_reserve_their_last_slot() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("full.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(2)
        .create()?;

    for i in 1..=9u8 {
        file.write_new(format!("k{i}"), [i; 4])?;
    }

    // k6..k9 fill all four slots of the first overflow block
    let stats = file.file_stats()?;
    assert_eq!(1, stats.overflow.blocks_full);
    assert_eq!(4, stats.overflow.records_used);
    assert_eq!(0, stats.overflow.records_empty);

    // the next append opens a second overflow block
    file.write_new("l0", [10; 4])?;
    let stats = file.file_stats()?;
    assert_eq!(5, stats.overflow.records_used);
    assert_eq!(2, stats.overflow.blocks_full + stats.overflow.blocks_partial);

    Ok(())
}
