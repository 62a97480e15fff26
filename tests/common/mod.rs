//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{AesMode, ZipArchive, ZipWriter};
use zipper::PasswordPrompt;

/// Answers password prompts from a fixed list and counts the questions.
pub struct Scripted {
    answers: VecDeque<String>,
    pub asked: usize,
}

impl Scripted {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: 0,
        }
    }

    /// A prompt that must never be consulted.
    pub fn silent() -> Self {
        Self::new(&[])
    }
}

impl PasswordPrompt for Scripted {
    fn read_password(&mut self) -> io::Result<String> {
        self.asked += 1;
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more passwords"))
    }
}

/// Writes `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

/// Creates an archive at `path`, AES-256 encrypted when `password` is set.
pub fn create_zip(path: &Path, entries: &[(&str, &str)], password: Option<&str>) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        let options = SimpleFileOptions::default();
        match password {
            Some(password) => zip
                .start_file(*name, options.with_aes_encryption(AesMode::Aes256, password))
                .unwrap(),
            None => zip.start_file(*name, options).unwrap(),
        }
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Sorted entry names of the archive at `path`.
pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Base directory string for a request.
pub fn base_of(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

/// Creates a deflated archive at `path` encrypted with legacy ZipCrypto.
pub fn create_zip_crypto(path: &Path, entries: &[(&str, &str)], password: &str) {
    use zip::unstable::write::FileOptionsExt;

    let options =
        FileOptionsExt::with_deprecated_encryption(SimpleFileOptions::default(), password.as_bytes())
            .unwrap();
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        zip.start_file(*name, options.clone()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// A wrong password that passes the one-byte ZipCrypto header check of the
/// first entry in the archive at `path`.
pub fn header_collision(path: &Path) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..100_000)
        .map(|n| format!("w{n}"))
        .find(|candidate| archive.by_index_decrypt(0, candidate.as_bytes()).is_ok())
        .unwrap()
}
