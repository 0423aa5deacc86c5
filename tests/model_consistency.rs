use isam_file::{Config, ErrorKind, IsamFile};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use test_log::test;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn scan(file: &mut IsamFile) -> isam_file::Result<Vec<(Vec<u8>, Vec<u8>)>> {
    file.set_key("")?;
    let mut pairs = Vec::new();
    loop {
        match file.read_next() {
            Ok(pair) => pairs.push(pair),
            Err(e) if e.kind() == ErrorKind::EndOfFile => return Ok(pairs),
            Err(e) => return Err(e),
        }
    }
}

/// Drives a random mix of operations against a `BTreeMap` oracle.
#[test]
fn random_operations_match_the_oracle() -> TestResult {
    let folder = tempfile::tempdir()?;

    let mut file = Config::new(folder.path().join("model.db"))
        .key_len(8)
        .data_len(8)
        .records_per_block(4)
        .block_count(4)
        .create()?;

    let mut oracle: BTreeMap<Vec<u8>, [u8; 8]> = BTreeMap::new();
    let mut rng = StdRng::seed_from_u64(0xDECA_FBAD);
    let mut ticket = 0u8;

    for round in 0..500usize {
        let key = format!("k{:02}", rng.random_range(0..30u32)).into_bytes();

        match rng.random_range(0..6u32) {
            // insert
            0 | 1 => {
                ticket = ticket.wrapping_add(1);
                let value = [ticket; 8];

                match file.write_new(&key, value) {
                    Ok(()) => {
                        assert!(
                            oracle.insert(key.clone(), value).is_none(),
                            "accepted a duplicate key",
                        );
                    }
                    Err(e) if e.kind() == ErrorKind::RecordExists => {
                        assert!(oracle.contains_key(&key), "rejected a fresh key");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            // delete with the stored value
            2 | 3 => match oracle.get(&key).copied() {
                Some(value) => {
                    file.delete(&key, value)?;
                    oracle.remove(&key);
                }
                None => {
                    let err = file.delete(&key, [0u8; 8]).expect_err("key is absent");
                    assert_eq!(ErrorKind::NoSuchKey, err.kind());
                }
            },

            // update
            4 => match oracle.get(&key).copied() {
                Some(old) => {
                    ticket = ticket.wrapping_add(1);
                    let new = [ticket; 8];
                    file.update(&key, old, new)?;
                    oracle.insert(key.clone(), new);
                }
                None => {
                    let err = file
                        .update(&key, [0u8; 8], [1u8; 8])
                        .expect_err("key is absent");
                    assert_eq!(ErrorKind::NoSuchKey, err.kind());
                }
            },

            // point read
            _ => match oracle.get(&key) {
                Some(value) => assert_eq!(value.to_vec(), file.read_by_key(&key)?),
                None => {
                    let err = file.read_by_key(&key).expect_err("key is absent");
                    assert!(
                        matches!(err.kind(), ErrorKind::NoSuchKey | ErrorKind::EndOfFile),
                        "unexpected error {:?} in round {round}",
                        err.kind(),
                    );
                }
            },
        }

        assert_eq!(oracle.len() as u64, file.len(), "count diverged in round {round}");

        if round % 50 == 49 {
            let expected: Vec<(Vec<u8>, Vec<u8>)> = oracle
                .iter()
                .map(|(k, v)| (k.clone(), v.to_vec()))
                .collect();
            assert_eq!(expected, scan(&mut file)?, "scan diverged in round {round}");
        }
    }

    // survive a reopen with the final state intact
    file.close()?;
    let mut file = IsamFile::open(folder.path().join("model.db"))?;

    let expected: Vec<(Vec<u8>, Vec<u8>)> = oracle
        .iter()
        .map(|(k, v)| (k.clone(), v.to_vec()))
        .collect();
    assert_eq!(expected, scan(&mut file)?);

    Ok(())
}
