//! Integration tests for content hashing against the filesystem
//! capability interface (as opposed to hash.rs's own in-crate unit
//! tests, which exercise the algorithm in isolation).

use conflux::fs::OsFilesystem;
use conflux::hash::{hash_bytes, hash_file, Hasher};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn hash_consistency_across_repeated_calls() {
    let data = b"The quick brown fox jumps over the lazy dog";
    let hash1 = hash_bytes(data);
    let hash2 = hash_bytes(data);
    let hash3 = hash_bytes(data);
    assert_eq!(hash1, hash2);
    assert_eq!(hash2, hash3);
}

#[test]
fn hash_uniqueness_across_distinct_inputs() {
    let hash1 = hash_bytes(b"foo");
    let hash2 = hash_bytes(b"bar");
    let hash3 = hash_bytes(b"baz");
    assert_ne!(hash1, hash2);
    assert_ne!(hash2, hash3);
    assert_ne!(hash1, hash3);
}

#[test]
fn hash_sensitivity_to_small_edits() {
    let hash1 = hash_bytes(b"test");
    let hash2 = hash_bytes(b"Test");
    let hash3 = hash_bytes(b"test ");
    let hash4 = hash_bytes(b"tes");

    assert_ne!(hash1, hash2, "case difference should change the hash");
    assert_ne!(hash1, hash3, "trailing space should change the hash");
    assert_ne!(hash1, hash4, "missing character should change the hash");
}

#[test]
fn incremental_hashing_matches_one_shot() {
    let full_data = b"Hello, World! This is a test of incremental hashing.";
    let hash_full = hash_bytes(full_data);

    let mut hasher = Hasher::new();
    hasher.update(b"Hello, World! ");
    hasher.update(b"This is a test ");
    hasher.update(b"of incremental hashing.");
    let hash_incremental = hasher.finalize();

    assert_eq!(hash_full, hash_incremental);
}

#[test]
fn file_hash_matches_in_memory_hash_for_small_file() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let mut temp_file = NamedTempFile::new()?;
    let data = b"Small file content for testing";
    temp_file.write_all(data)?;
    temp_file.flush()?;

    let file_hash = hash_file(&fs, temp_file.path())?;
    let memory_hash = hash_bytes(data);
    assert_eq!(file_hash, memory_hash);
    Ok(())
}

#[test]
fn file_hash_matches_in_memory_hash_for_large_file() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let mut temp_file = NamedTempFile::new()?;
    let chunk = vec![0x42u8; 1024];
    for _ in 0..1024 {
        temp_file.write_all(&chunk)?;
    }
    temp_file.flush()?;

    let file_hash = hash_file(&fs, temp_file.path())?;
    let memory_hash = hash_bytes(&vec![0x42u8; 1024 * 1024]);
    assert_eq!(file_hash, memory_hash);
    Ok(())
}

#[test]
fn file_hash_of_empty_file_matches_empty_bytes() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let temp_file = NamedTempFile::new()?;
    let file_hash = hash_file(&fs, temp_file.path())?;
    assert_eq!(file_hash, hash_bytes(b""));
    Ok(())
}

#[test]
fn display_is_sixteen_lowercase_hex_digits() {
    let hash = hash_bytes(b"test data");
    let rendered = hash.to_string();
    assert_eq!(rendered.len(), 16);
    for c in rendered.chars() {
        assert!(c.is_ascii_hexdigit());
        if c.is_ascii_alphabetic() {
            assert!(c.is_lowercase());
        }
    }
}

#[test]
fn algorithm_name_is_fnv1a_by_default() {
    let hash = hash_bytes(b"test");
    assert_eq!(hash.algorithm(), "FNV-1a");
}

#[test]
fn distinct_files_hash_to_distinct_values() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let mut file1 = NamedTempFile::new()?;
    let mut file2 = NamedTempFile::new()?;
    let mut file3 = NamedTempFile::new()?;

    file1.write_all(b"Content A")?;
    file2.write_all(b"Content B")?;
    file3.write_all(b"Content C")?;
    file1.flush()?;
    file2.flush()?;
    file3.flush()?;

    let hash1 = hash_file(&fs, file1.path())?;
    let hash2 = hash_file(&fs, file2.path())?;
    let hash3 = hash_file(&fs, file3.path())?;

    assert_ne!(hash1, hash2);
    assert_ne!(hash2, hash3);
    assert_ne!(hash1, hash3);
    Ok(())
}

#[test]
fn streaming_buffer_boundary_is_handled() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let mut temp_file = NamedTempFile::new()?;
    let data_64k = vec![0xAAu8; 64 * 1024];
    temp_file.write_all(&data_64k)?;
    temp_file.flush()?;

    let file_hash = hash_file(&fs, temp_file.path())?;
    assert_eq!(file_hash, hash_bytes(&data_64k));

    let mut temp_file2 = NamedTempFile::new()?;
    let mut data_64k_plus = vec![0xAAu8; 64 * 1024];
    data_64k_plus.push(0xBB);
    temp_file2.write_all(&data_64k_plus)?;
    temp_file2.flush()?;

    let file_hash2 = hash_file(&fs, temp_file2.path())?;
    assert_eq!(file_hash2, hash_bytes(&data_64k_plus));
    assert_ne!(file_hash, file_hash2, "one extra byte should change the hash");
    Ok(())
}

#[test]
fn hash_is_deterministic_across_repeated_runs() {
    let data = b"Determinism test data";
    let hashes: Vec<_> = (0..10).map(|_| hash_bytes(data)).collect();
    for h in &hashes[1..] {
        assert_eq!(&hashes[0], h);
    }
}

#[test]
fn very_large_file_hashes_without_buffering_it_all_in_memory() -> std::io::Result<()> {
    let fs = OsFilesystem;
    let mut temp_file = NamedTempFile::new()?;
    let chunk = vec![0x55u8; 1024 * 1024];
    for _ in 0..10 {
        temp_file.write_all(&chunk)?;
    }
    temp_file.flush()?;

    let hash = hash_file(&fs, temp_file.path())?;
    assert_eq!(hash.algorithm(), "FNV-1a");
    Ok(())
}
