use isam_file::Config;
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn fresh_file_stats() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("fresh.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(4)
        .create()?;

    let stats = file.file_stats()?;

    // only block 0 exists, holding nothing but the dummy record
    assert_eq!(1, stats.regular.records_used);
    assert_eq!(3, stats.regular.records_empty);
    assert_eq!(1, stats.regular.blocks_partial);
    assert_eq!(0, stats.regular.blocks_empty + stats.regular.blocks_full);

    assert_eq!(0, stats.overflow.records_used + stats.overflow.records_empty);
    assert_eq!(0, stats.key_min);
    assert_eq!(0, stats.key_max);

    Ok(())
}

#[test]
fn occupancy_and_key_lengths() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("occ.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(2)
        .create()?;

    // fills block 0 (dummy + 2), block 1 (3) and one overflow block (4),
    // plus one record in a second overflow block
    for key in ["ab", "cdef", "ghijklmn", "op", "qr", "st", "uv", "wx", "yz", "zz"] {
        file.write_new(key, *b"....")?;
    }

    let stats = file.file_stats()?;

    assert_eq!(6, stats.regular.records_used);
    assert_eq!(2, stats.regular.records_empty);
    assert_eq!(2, stats.regular.blocks_partial);
    assert_eq!(3, stats.regular.used_average);

    assert_eq!(5, stats.overflow.records_used);
    assert_eq!(1, stats.overflow.blocks_full);
    assert_eq!(1, stats.overflow.blocks_partial);
    assert_eq!(4, stats.overflow.used_max);
    assert_eq!(1, stats.overflow.used_min);
    assert_eq!(2, stats.overflow.used_average);

    assert_eq!(2, stats.key_min);
    assert_eq!(8, stats.key_max);
    // lengths: 2+4+8+2+2+2+2+2+2+2 = 28, over ten keys
    assert_eq!(2, stats.key_average);

    // the scan leaves the file rewound
    assert_eq!(b"ab".to_vec(), file.read_next()?.0);

    Ok(())
}

#[test]
fn deleted_records_count_as_empty() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("deleted.db"))
        .key_len(8)
        .data_len(4)
        .records_per_block(4)
        .block_count(4)
        .create()?;

    for key in ["a0", "a1", "a2", "a3"] {
        file.write_new(key, *b"....")?;
    }

    // "a2" sits first in block 1: a sticky delete keeps the slot taken
    // on disk but it no longer counts as used
    file.delete("a1", *b"....")?;
    file.delete("a2", *b"....")?;

    let stats = file.file_stats()?;
    assert_eq!(3, stats.regular.records_used); // dummy, a0, a3
    assert_eq!(2, file.len());

    Ok(())
}
