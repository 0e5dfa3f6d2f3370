//! Action log persistence, including concurrent appends

use buildtap::action_log::{ActionLog, LogEntry};
use buildtap::Action;
use std::path::Path;
use std::thread;

fn action(source: &str, output: &str) -> Action {
    Action {
        tool_name: "cc".to_string(),
        executable: "/usr/bin/cc".to_string(),
        arguments: vec![
            "/usr/bin/cc".to_string(),
            "-c".to_string(),
            source.to_string(),
            "-o".to_string(),
            output.to_string(),
        ],
        sources: vec![source.to_string()],
        output: Some(output.to_string()),
    }
}

#[test]
fn test_log_is_compilation_database_shaped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compile_commands.json");
    let log = ActionLog::open(&path);

    log.append(&[action("/w/a.c", "/w/a.o")], Path::new("/w"))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw.as_array().unwrap()[0];
    assert_eq!(entry["directory"], "/w");
    assert_eq!(entry["file"], "/w/a.c");
    assert_eq!(entry["output"], "/w/a.o");
    assert_eq!(entry["arguments"][0], "/usr/bin/cc");
}

#[test]
fn test_entries_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = ActionLog::open(dir.path().join("actions.json"));
    let a = action("/w/a.c", "/w/a.o");

    log.append(std::slice::from_ref(&a), Path::new("/w")).unwrap();

    assert_eq!(log.entries().unwrap(), LogEntry::from_action(&a, Path::new("/w")));
}

#[test]
fn test_empty_existing_file_is_treated_as_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actions.json");
    std::fs::write(&path, "\n").unwrap();

    let log = ActionLog::open(&path);
    assert_eq!(log.append(&[action("/w/a.c", "/w/a.o")], Path::new("/w")).unwrap(), 1);
    assert_eq!(log.entries().unwrap().len(), 1);
}

#[test]
fn test_concurrent_appends_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("actions.json");

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let path = path.clone();
            thread::spawn(move || {
                let log = ActionLog::open(&path);
                for i in 0..10 {
                    let source = format!("/w/src_{}_{}.c", worker, i);
                    let output = format!("/w/src_{}_{}.o", worker, i);
                    log.append(&[action(&source, &output)], Path::new("/w"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entries = ActionLog::open(&path).entries().unwrap();
    assert_eq!(entries.len(), 80);
    let mut files: Vec<_> = entries.into_iter().map(|e| e.file).collect();
    files.sort();
    files.dedup();
    assert_eq!(files.len(), 80);
}
