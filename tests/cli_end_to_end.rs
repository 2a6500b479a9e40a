use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::{
    prelude::PredicateBooleanExt,
    str::{contains, starts_with},
};
use tempfile::TempDir;

fn inkpress(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("inkpress"));
    cmd.current_dir(data_dir)
        .env_remove("INKPRESS_CONFIG_FILE")
        .env("INKPRESS__LOGGING__LEVEL", "warn")
        .arg("--data-dir")
        .arg(data_dir.join("state"));
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path.display().to_string()
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).trim().to_string()
}

#[test]
fn exports_a_markdown_file_to_stdout() {
    let dir = TempDir::new().expect("tempdir");
    let article = write(dir.path(), "post.md", "# Hello\n\nSome *text* here.\n");

    inkpress(dir.path())
        .args(["export", &article])
        .assert()
        .success()
        .stdout(starts_with("<section style=\""))
        .stdout(contains("Some <em"))
        .stdout(contains("class=").not());

    inkpress(dir.path())
        .args(["export", "--mode", "content", &article])
        .assert()
        .success()
        .stdout(contains(r#"<h1 class="wechat-article-title">Hello</h1>"#));
}

#[test]
fn full_export_writes_a_standalone_page() {
    let dir = TempDir::new().expect("tempdir");
    let article = write(dir.path(), "post.md", "# Page title\n\nbody\n");
    let output = dir.path().join("out/page.html");

    inkpress(dir.path())
        .args(["export", "--mode", "full", "-o"])
        .arg(&output)
        .arg(&article)
        .assert()
        .success()
        .stdout(contains("wrote"));

    let page = fs::read_to_string(&output).expect("read page");
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>Page title</title>"));
}

#[test]
fn destructive_commands_need_confirmation() {
    let dir = TempDir::new().expect("tempdir");
    inkpress(dir.path())
        .args(["images", "clear"])
        .assert()
        .failure()
        .stderr(contains("--yes"));

    inkpress(dir.path())
        .args(["images", "clear", "--yes"])
        .assert()
        .success();
}

#[test]
fn documents_lifecycle() {
    let dir = TempDir::new().expect("tempdir");
    let draft = write(dir.path(), "draft.md", "First **draft**\n");

    let id = stdout_of(inkpress(dir.path()).args([
        "documents", "create", "--name", "Draft", "--file", &draft,
    ]));
    assert!(id.starts_with("doc-"), "{id}");

    inkpress(dir.path())
        .args(["documents", "list"])
        .assert()
        .success()
        .stdout(contains("\"Draft\""));

    inkpress(dir.path())
        .args(["export", "--document", &id])
        .assert()
        .success()
        .stdout(contains("draft</strong>"));

    inkpress(dir.path())
        .args(["documents", "set-template", &id, "template-missing"])
        .assert()
        .failure();

    inkpress(dir.path())
        .args(["documents", "delete", &id])
        .assert()
        .failure();

    inkpress(dir.path())
        .args(["documents", "delete", &id, "--yes"])
        .assert()
        .success()
        .stdout(contains("deleted"));

    inkpress(dir.path())
        .args(["export", "--document", &id])
        .assert()
        .failure();
}

#[test]
fn templates_can_be_added_and_previewed() {
    let dir = TempDir::new().expect("tempdir");
    let css = write(dir.path(), "house.css", "p { color: #123456; }\n");

    let created = stdout_of(inkpress(dir.path()).args([
        "templates", "create", "--name", "House", "--css-file", &css,
    ]));
    let created: serde_json::Value = serde_json::from_str(&created).expect("template json");
    let id = created["id"].as_str().expect("id").to_string();

    inkpress(dir.path())
        .args(["templates", "set-default", &id])
        .assert()
        .success();

    inkpress(dir.path())
        .arg("preview-css")
        .assert()
        .success()
        .stdout(contains(".preview-container .markdown-body p"));
}

#[cfg(unix)]
#[test]
fn copy_pipes_html_to_the_clipboard_program() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().expect("tempdir");
    let script = dir.path().join("fake-clip.sh");
    fs::write(&script, "#!/bin/sh\ncat > \"$1\"\n").expect("write script");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
    let sink = dir.path().join("clipboard.html");
    let article = write(dir.path(), "post.md", "Paste *me*\n");

    inkpress(dir.path())
        .env("INKPRESS__CLIPBOARD__HTML_PROGRAM", &script)
        .env("INKPRESS__CLIPBOARD__HTML_ARGS", &sink)
        .args(["copy", &article])
        .assert()
        .success()
        .stdout(contains("copied"));

    let pasted = fs::read_to_string(&sink).expect("clipboard contents");
    assert!(pasted.starts_with("<section style=\""));
    assert!(pasted.contains("Paste"));
}
