//! End-to-end tests from argv to archives on disk.

use std::fs;

use tempfile::TempDir;
use zipper::{BackendKind, Invocation, backend, run};

mod common;

use common::{Scripted, base_of, entry_names, write_file};

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_rich_zip_then_plain_unzip() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.txt", "alpha");
    write_file(dir.path(), "b.txt", "beta");
    write_file(dir.path(), "debug.log", "noise");
    let base = base_of(dir.path());
    let archive = dir.path().join("out.zip");
    let archive_arg = archive.to_string_lossy().into_owned();

    let invocation = backend(BackendKind::Rich)
        .parse(&argv(&[
            "zipper", "zip", "*", "-o", &archive_arg, "--exclude", "*.log", "--base", &base,
            "--compression", "store",
        ]))
        .unwrap();
    let report = run(&invocation, &mut Scripted::silent()).unwrap();

    assert_eq!(report.created().count(), 1);
    assert_eq!(entry_names(&archive), vec!["a.txt", "b.txt"]);

    let target = dir.path().join("restored");
    let target_arg = target.to_string_lossy().into_owned();
    let invocation = backend(BackendKind::Plain)
        .parse(&argv(&["zipper", "unzip", "out.zip", "--base", &base, "--output", &target_arg]))
        .unwrap();
    assert!(matches!(invocation, Invocation::Unzip(_)));
    run(&invocation, &mut Scripted::silent()).unwrap();

    assert_eq!(fs::read_to_string(target.join("a.txt")).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(target.join("b.txt")).unwrap(), "beta");
    assert!(!target.join("debug.log").exists());
}

#[test]
fn test_plain_grouped_excludes() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "proj/src/lib.rs", "");
    write_file(dir.path(), "proj/target/out.bin", "");
    write_file(dir.path(), "proj/notes.tmp", "");
    let base = base_of(dir.path());

    let invocation = backend(BackendKind::Plain)
        .parse(&argv(&[
            "zipper", "zip", "proj", "--exclude", "*/target", "*.tmp", "--base", &base,
        ]))
        .unwrap();
    run(&invocation, &mut Scripted::silent()).unwrap();

    assert_eq!(entry_names(&dir.path().join("proj.zip")), vec!["proj/src/lib.rs"]);
}

#[test]
fn test_both_backends_agree() {
    let args = argv(&[
        "zipper", "zip", "a*", "--exclude", "x?", "y", "--password", "--", "b", "--base", "src",
    ]);
    let rich = backend(BackendKind::Rich).parse(&args).unwrap();
    let plain = backend(BackendKind::Plain).parse(&args).unwrap();
    assert_eq!(rich, plain);

    // Flattening repeats the flag before each trailing value
    let args = argv(&["zipper", "zip", "--password", "a.txt", "b.txt"]);
    let rich = backend(BackendKind::Rich).parse(&args).unwrap();
    let plain = backend(BackendKind::Plain).parse(&args).unwrap();
    assert_eq!(rich, plain);
    let Invocation::Zip(request) = rich else {
        panic!("expected zip");
    };
    assert!(request.password);
    assert_eq!(request.inputs, vec!["a.txt", "b.txt"]);
}
