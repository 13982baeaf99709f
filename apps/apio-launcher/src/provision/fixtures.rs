//! Bundle fixtures shared by the installer and coordinator tests.

use std::io::Write;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;

/// One entry of a fixture bundle.
pub enum Entry<'a> {
    File(&'a str, &'a [u8], u32),
    Dir(&'a str),
}

/// Creates a temporary test directory with a unique name.
pub fn temp_test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "apio_launcher_test_{}_{}",
        name,
        rand::random::<u64>()
    ));
    std::fs::create_dir_all(&dir).expect("Should create temp dir");
    dir
}

/// Builds an in-memory `.tgz` with the given entries.
pub fn tgz(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry {
            Entry::File(path, content, mode) => {
                header.set_size(content.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, *content)
                    .expect("Should append file");
            }
            Entry::Dir(path) => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .expect("Should append dir");
            }
        }
    }
    builder
        .into_inner()
        .expect("Should finish tar")
        .finish()
        .expect("Should finish gzip")
}

/// Builds an in-memory `.zip` with the given entries.
pub fn zip(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for entry in entries {
        match entry {
            Entry::File(path, content, mode) => {
                let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
                writer.start_file(*path, options).expect("Should start file");
                writer.write_all(content).expect("Should write");
            }
            Entry::Dir(path) => {
                writer
                    .add_directory(*path, zip::write::SimpleFileOptions::default())
                    .expect("Should add dir");
            }
        }
    }
    writer.finish().expect("Should finish zip").into_inner()
}

/// A well-formed Unix bundle whose binary prints `marker`.
pub fn unix_bundle(marker: &str) -> Vec<u8> {
    let script = format!("#!/bin/sh\necho {marker}\n");
    tgz(&[
        Entry::Dir("apio"),
        Entry::File("apio/apio", script.as_bytes(), 0o644),
        Entry::File("apio/_internal/base_library.zip", b"lib", 0o644),
    ])
}

/// A well-formed Windows bundle.
pub fn windows_bundle() -> Vec<u8> {
    zip(&[
        Entry::Dir("apio/"),
        Entry::File("apio/apio.exe", b"MZ", 0o644),
        Entry::File("apio/_internal/python3.dll", b"dll", 0o644),
    ])
}
