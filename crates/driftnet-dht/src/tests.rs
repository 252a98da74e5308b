use crate::{Dht, Error, Options, OFFSET_BYTES};
use tempfile::TempDir;

fn open_new(dir: &TempDir, name: &str, options: Options) -> Dht {
    Dht::open(
        dir.path().join(name),
        Options {
            create: true,
            ..options
        },
    )
    .unwrap()
}

fn small_options() -> Options {
    Options {
        index_bits: 2,
        ..Options::default()
    }
}

#[test]
fn put_get_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(&dir, "t.dht", small_options());

    db.put(b"key", &[1, 2, 3]).unwrap();
    db.put(b"key2", b"val").unwrap();

    assert_eq!(db.get(b"key").unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(db.get(b"key2").unwrap(), Some(b"val".to_vec()));
    assert_eq!(db.get(b"missing").unwrap(), None);
}

#[test]
fn empty_value_is_permitted_and_retrievable() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(&dir, "t.dht", small_options());

    db.put(b"key", &[]).unwrap();
    assert_eq!(db.get(b"key").unwrap(), Some(Vec::new()));
}

#[test]
fn key_and_value_length_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            key_len: 4,
            value_len: 3,
            index_bits: 2,
            ..Options::default()
        },
    );

    // Exactly K and exactly V succeed.
    db.put(b"fork", &[7, 8, 9]).unwrap();
    assert_eq!(db.get(b"fork").unwrap(), Some(vec![7, 8, 9]));

    assert!(matches!(
        db.put(b"forks", &[1]),
        Err(Error::KeyTooLong { len: 5, max: 4 })
    ));
    assert!(matches!(
        db.get(b"forks"),
        Err(Error::KeyTooLong { len: 5, max: 4 })
    ));
    assert!(matches!(
        db.put(b"f", &[1, 2, 3, 4]),
        Err(Error::ValueTooLong { len: 4, max: 3 })
    ));
    // Contract violations leave the file untouched.
    assert_eq!(db.bucket_count(), 1);
}

#[test]
fn index_width_boundaries() {
    let dir = tempfile::tempdir().unwrap();

    let err = Dht::open(
        dir.path().join("wide.dht"),
        Options {
            index_bits: 65,
            create: true,
            ..Options::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::IndexWidthTooLarge { bits: 65, max: 64 }));

    // The full hash width passes validation; the refusal, if any, comes from
    // the file layer, not the width check.
    let err = Dht::open(
        dir.path().join("wide64.dht"),
        Options {
            index_bits: 64,
            create: true,
            ..Options::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn file_size_matches_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.dht");
    let db = Dht::open(
        &path,
        Options {
            key_len: 4,
            value_len: 3,
            index_bits: 2,
            create: true,
            ..Options::default()
        },
    )
    .unwrap();

    let idx_size = 4 * OFFSET_BYTES;
    assert_eq!(db.size(), idx_size);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), idx_size);

    db.put(b"key", &[1, 2, 3]).unwrap();
    let bucket_size = 4 + 3 + OFFSET_BYTES;
    assert_eq!(db.size(), idx_size + bucket_size);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), idx_size + bucket_size);
    assert_eq!(db.bucket_count(), 1);
}

#[test]
fn collision_chains_remain_retrievable_via_put() {
    let dir = tempfile::tempdir().unwrap();
    // Two directory slots force heavy chaining.
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            index_bits: 1,
            ..Options::default()
        },
    );

    db.put(b"key", &[1, 2, 3]).unwrap();
    for i in 0..100u8 {
        db.put(&[i], &[i]).unwrap();
    }

    assert_eq!(db.get(b"key").unwrap(), Some(vec![1, 2, 3]));
    for i in 0..100u8 {
        assert_eq!(db.get(&[i]).unwrap(), Some(vec![i]), "key {i}");
    }
    // Pigeonhole: 101 buckets over two chains, the longer one has been
    // walked end to end by now.
    assert!(db.biggest_collision_depth() >= 50);
}

#[test]
fn batch_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(&dir, "t.dht", small_options());

    let mut batch = db.batch();
    batch.add(b"key", &[1, 2, 3]).unwrap();
    assert_eq!(batch.len(), 1);
    batch.commit().unwrap();
    assert!(batch.is_empty());

    assert_eq!(db.get(b"key").unwrap(), Some(vec![1, 2, 3]));
}

#[test]
fn batch_collision_chains_remain_retrievable() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            index_bits: 1,
            ..Options::default()
        },
    );

    let mut batch = db.batch();
    batch.add(b"key", &[1, 2, 3]).unwrap();
    for i in 0..100u8 {
        batch.add(&[i], &[i]).unwrap();
    }
    batch.commit().unwrap();

    assert_eq!(db.get(b"key").unwrap(), Some(vec![1, 2, 3]));
    for i in 0..100u8 {
        assert_eq!(db.get(&[i]).unwrap(), Some(vec![i]), "key {i}");
    }
    assert_eq!(db.bucket_count(), 101);
}

#[test]
fn batch_links_to_buckets_written_by_put() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            index_bits: 1,
            ..Options::default()
        },
    );

    // Pre-existing on-disk heads become the tails of batch chains.
    for i in 0..10u8 {
        db.put(&[i], &[i]).unwrap();
    }
    let mut batch = db.batch();
    for i in 10..50u8 {
        batch.add(&[i], &[i]).unwrap();
    }
    batch.commit().unwrap();

    for i in 0..50u8 {
        assert_eq!(db.get(&[i]).unwrap(), Some(vec![i]), "key {i}");
    }
}

#[test]
fn batch_rejects_overlong_entries_eagerly() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            key_len: 4,
            value_len: 3,
            index_bits: 2,
            ..Options::default()
        },
    );

    let mut batch = db.batch();
    assert!(matches!(
        batch.add(b"toolong", &[1]),
        Err(Error::KeyTooLong { .. })
    ));
    assert!(matches!(
        batch.add(b"k", &[1, 2, 3, 4]),
        Err(Error::ValueTooLong { .. })
    ));
    batch.commit().unwrap();
    assert_eq!(db.bucket_count(), 0);
}

#[test]
fn batch_commit_is_reusable() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(&dir, "t.dht", small_options());

    let mut batch = db.batch();
    batch.add(b"a", &[1]).unwrap();
    batch.commit().unwrap();
    batch.add(b"b", &[2]).unwrap();
    batch.commit().unwrap();
    // Empty commit is a no-op.
    batch.commit().unwrap();

    assert_eq!(db.get(b"a").unwrap(), Some(vec![1]));
    assert_eq!(db.get(b"b").unwrap(), Some(vec![2]));
    assert_eq!(db.bucket_count(), 2);
}

#[test]
fn batch_spanning_many_directory_windows() {
    let dir = tempfile::tempdir().unwrap();
    // 2^16 slots * 8 bytes = 512 KiB directory, several 64 KiB windows.
    let db = open_new(
        &dir,
        "t.dht",
        Options {
            index_bits: 16,
            ..Options::default()
        },
    );

    let mut batch = db.batch();
    for i in 0..2000u32 {
        batch.add(&i.to_le_bytes(), &i.to_le_bytes()).unwrap();
    }
    batch.commit().unwrap();

    for i in 0..2000u32 {
        assert_eq!(
            db.get(&i.to_le_bytes()).unwrap(),
            Some(i.to_le_bytes().to_vec()),
            "key {i}"
        );
    }
}

#[test]
fn reopen_preserves_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.dht");
    let options = Options {
        key_len: 4,
        value_len: 3,
        index_bits: 2,
        ..Options::default()
    };

    let db = Dht::open(
        &path,
        Options {
            create: true,
            ..options.clone()
        },
    )
    .unwrap();
    db.put(b"key", &[1, 2, 3]).unwrap();
    for i in 0..20u8 {
        db.put(&[i], &[i]).unwrap();
    }
    let size_before = db.size();
    drop(db);

    let db = Dht::open(&path, options).unwrap();
    assert_eq!(db.size(), size_before);
    assert_eq!(db.size(), std::fs::metadata(&path).unwrap().len());
    assert_eq!(db.get(b"key").unwrap(), Some(vec![1, 2, 3]));
    for i in 0..20u8 {
        assert_eq!(db.get(&[i]).unwrap(), Some(vec![i]), "key {i}");
    }
}

#[test]
fn missing_file_without_create_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Dht::open(dir.path().join("absent.dht"), Options::default()).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn later_insert_shadows_earlier_one() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_new(&dir, "t.dht", small_options());

    db.put(b"key", &[1]).unwrap();
    db.put(b"key", &[2]).unwrap();
    // Prepend semantics: the newest bucket wins the chain walk.
    assert_eq!(db.get(b"key").unwrap(), Some(vec![2]));
    assert_eq!(db.bucket_count(), 2);
}
