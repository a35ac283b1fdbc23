use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn tagmire(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tagmire"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to run tagmire")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = tagmire(temp_dir.path(), &["init"]);
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".tagmire/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[tracking]"));

    // Second init without --force fails
    assert!(!tagmire(temp_dir.path(), &["init"]).status.success());
    assert!(tagmire(temp_dir.path(), &["init", "--force"]).status.success());
}

#[test]
fn test_annotate_then_check_after_edit() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(tagmire(root, &["init"]).status.success());

    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/lib.rs"), "pub fn a() {}\npub fn b() {}\n").unwrap();

    assert!(tagmire(root, &["tags", "add", "review"]).status.success());
    let output = tagmire(
        root,
        &["annotate", "src/lib.rs", "1:7", "1:8", "--tag", "review", "--note", "rename"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let listed = stdout(&tagmire(root, &["list", "src/lib.rs"]));
    assert!(listed.contains("src/lib.rs:1:7-1:8 [review]"));
    assert!(listed.contains("rename"));

    // Unknown tags are rejected
    assert!(!tagmire(root, &["annotate", "src/lib.rs", "0:0", "0:3", "--tag", "nope"]).status.success());

    std::fs::write(
        root.join("src/lib.rs"),
        "//! docs\n\npub fn a() {}\npub fn b() {}\n",
    )
    .unwrap();
    let checked = stdout(&tagmire(root, &["check"]));
    assert!(checked.contains("1 reanchored"), "{checked}");

    let json = stdout(&tagmire(root, &["list", "--json"]));
    let annotations: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(annotations[0]["startLine"], 3);
    assert_eq!(annotations[0]["startChar"], 7);
    assert_eq!(annotations[0]["contentSnapshot"], "b");
}

#[test]
fn test_mv_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(tagmire(root, &["init"]).status.success());

    std::fs::write(root.join("old.txt"), "hello world\n").unwrap();
    assert!(tagmire(root, &["tags", "add", "note"]).status.success());
    assert!(tagmire(root, &["annotate", "old.txt", "0:6", "0:11", "--tag", "note"]).status.success());

    std::fs::rename(root.join("old.txt"), root.join("new.txt")).unwrap();
    let moved = stdout(&tagmire(root, &["mv", "old.txt", "new.txt"]));
    assert!(moved.contains("Moved 1 annotations"), "{moved}");

    assert!(!tagmire(root, &["remove", "new.txt", "0:0"]).status.success());
    assert!(tagmire(root, &["remove", "new.txt", "0:8"]).status.success());
    assert!(stdout(&tagmire(root, &["list"])).contains("No annotations."));
}

#[test]
fn test_tags_edit_and_list_by_tag() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    assert!(tagmire(root, &["init"]).status.success());

    std::fs::write(root.join("a.txt"), "alpha beta\n").unwrap();
    assert!(tagmire(root, &["tags", "add", "bug"]).status.success());
    assert!(tagmire(root, &["tags", "add", "perf"]).status.success());
    assert!(tagmire(root, &["annotate", "a.txt", "0:0", "0:5", "--tag", "bug"]).status.success());
    assert!(tagmire(root, &["annotate", "a.txt", "0:6", "0:10", "--tag", "perf"]).status.success());

    let edited = tagmire(root, &["tags", "edit", "bug", "--name", "defect", "--color", "#123456"]);
    assert!(edited.status.success(), "{}", String::from_utf8_lossy(&edited.stderr));
    assert!(stdout(&edited).contains("Updated tag defect"));
    assert!(stdout(&tagmire(root, &["tags", "list"])).contains("#123456"));

    // Renaming onto another tag's name is refused
    assert!(!tagmire(root, &["tags", "edit", "defect", "--name", "perf"]).status.success());

    let json = stdout(&tagmire(root, &["list", "--tag", "defect", "--json"]));
    let annotations: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(annotations.as_array().unwrap().len(), 1);
    assert_eq!(annotations[0]["contentSnapshot"], "alpha");

    assert!(!tagmire(root, &["list", "--tag", "bug"]).status.success());
}
