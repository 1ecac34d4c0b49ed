//! End-to-end scenarios from the testable-properties list: build a small tree on disk, run
//! the real driver and parsers against it, then query the resulting database.

use std::fs;
use std::time::SystemTime;

use clink::config::Config;
use clink::db::SymbolDatabase;
use clink::symbol::Category;

fn config_for(root: &std::path::Path) -> Config {
    Config {
        db_path: root.join("clink.db"),
        scan_roots: vec![root.to_path_buf()],
        jobs: 2,
        include_dirs: Vec::new(),
        color: false,
        rescan: true,
    }
}

#[test]
fn asm_definition_and_call_are_indexed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.s"), "foo:\n  call bar\n").unwrap();

    let config = config_for(dir.path());
    let mut db = SymbolDatabase::open(&config.db_path).unwrap();
    clink::driver::build(&mut db, &config, SystemTime::UNIX_EPOCH).unwrap();

    let defs = db.find_definition("foo").unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].lineno, 1);

    let calls = db.find_caller("bar").unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].parent, "foo");
    assert_eq!(calls[0].category, Category::FunctionCall);
}

#[test]
fn find_file_matches_stored_suffix() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("include/clink")).unwrap();
    fs::write(dir.path().join("include/clink/clink.h"), "#define X 1\n").unwrap();

    let config = config_for(dir.path());
    let mut db = SymbolDatabase::open(&config.db_path).unwrap();
    clink::driver::build(&mut db, &config, SystemTime::UNIX_EPOCH).unwrap();

    let found = db.find_file("clink.h").unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("include/clink/clink.h"));
}

#[test]
fn reindexing_unchanged_tree_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.s"), "foo:\n  call bar\n").unwrap();

    let config = config_for(dir.path());
    let mut db = SymbolDatabase::open(&config.db_path).unwrap();
    clink::driver::build(&mut db, &config, SystemTime::UNIX_EPOCH).unwrap();
    let first = db.find_symbol(".*").unwrap().len();

    clink::driver::build(&mut db, &config, SystemTime::UNIX_EPOCH).unwrap();
    let second = db.find_symbol(".*").unwrap().len();

    assert_eq!(first, second);
}

#[test]
fn build_skips_unrecognised_files_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.md"), "not source code\n").unwrap();
    fs::write(dir.path().join("a.s"), "foo:\n").unwrap();

    let config = config_for(dir.path());
    let mut db = SymbolDatabase::open(&config.db_path).unwrap();
    clink::driver::build(&mut db, &config, SystemTime::UNIX_EPOCH).unwrap();

    let defs = db.find_definition("foo").unwrap();
    assert_eq!(defs.len(), 1);
}
