// Integration tests for `cbank upload`, `preview`, `commit` and `cancel`.
// Run with: cargo test -p commentbank-cli --test upload_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const COMMENTS: &str = "\
ID,Comment,ContextLevel,ContextId
1,Well done,10,5
2,Try harder,999,5
3,<b>Units</b> missing,50,7
";

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn db(&self) -> PathBuf {
        self.path("bank.db")
    }

    /// `cbank` confined to this sandbox, acting as user 2.
    fn cbank(&self) -> Command {
        let mut cmd = self.cbank_anonymous();
        cmd.args(["--user", "2"]);
        cmd
    }

    fn cbank_anonymous(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cbank"));
        cmd.env_remove("COMMENTBANK_USER")
            .arg("--config")
            .arg(self.path("settings.json"))
            .arg("--db")
            .arg(self.db())
            .arg("--temp-dir")
            .arg(self.path("tmp"));
        cmd
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("write upload file");
        path
    }

    fn seed(&self) {
        let output = self.cbank().args(["store", "init"]).output().expect("cbank store init");
        assert!(output.status.success(), "store init failed: {}", stderr(&output));

        let conn = rusqlite::Connection::open(self.db()).expect("open db");
        conn.execute("INSERT INTO course (id, shortname) VALUES (7, 'PHY101')", [])
            .expect("seed course");
    }

    fn comment_count(&self) -> i64 {
        let conn = rusqlite::Connection::open(self.db()).expect("open db");
        conn.query_row("SELECT COUNT(*) FROM local_commentbank", [], |row| row.get(0))
            .expect("count comments")
    }

    fn upload_json(&self, file: &Path) -> serde_json::Value {
        let output = self
            .cbank()
            .arg("upload")
            .arg(file)
            .arg("--json")
            .output()
            .expect("cbank upload --json");
        assert!(output.status.success(), "upload failed: {}", stderr(&output));
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("valid JSON")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// upload: preview with resolved contexts
// ---------------------------------------------------------------------------

#[test]
fn upload_previews_resolved_contexts() {
    let sandbox = Sandbox::new();
    sandbox.seed();
    let file = sandbox.write("comments.csv", COMMENTS);

    let json = sandbox.upload_json(&file);

    assert!(json["iid"].as_str().is_some_and(|iid| !iid.is_empty()));
    assert_eq!(json["columns"], serde_json::json!(["id", "comment", "contextlevel", "contextid"]));

    let rows = json["preview"]["rows"].as_array().expect("rows array");
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0]["line"], 2);
    assert_eq!(rows[0]["cells"][2], "System");
    assert_eq!(rows[0]["cells"][3], "N/A");
    assert_eq!(rows[0]["status"], serde_json::json!([]));

    assert_eq!(rows[1]["cells"][2], "999");
    assert_eq!(rows[1]["status"], serde_json::json!(["Incorrect context"]));

    assert_eq!(rows[2]["cells"][2], "Course");
    assert_eq!(rows[2]["cells"][3], "PHY101");

    // Preview never writes comments
    assert_eq!(sandbox.comment_count(), 0);
}

#[test]
fn upload_html_preview_and_iid_on_stderr() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);

    let output = sandbox
        .cbank()
        .arg("upload")
        .arg(&file)
        .args(["--previewrows", "1"])
        .output()
        .expect("cbank upload");
    assert!(output.status.success(), "upload failed: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<table id=\"ucpreview\""));
    assert!(stdout.contains("<th scope=\"col\">Context</th>"));
    assert!(stdout.contains("<td>...</td>"), "second row should be elided");
    assert!(stderr(&output).contains("import id: "));
}

// ---------------------------------------------------------------------------
// commit: every row inserted, upload removed
// ---------------------------------------------------------------------------

#[test]
fn commit_inserts_every_row_once() {
    let sandbox = Sandbox::new();
    sandbox.seed();
    let file = sandbox.write("comments.csv", COMMENTS);
    let iid = sandbox.upload_json(&file)["iid"].as_str().unwrap().to_string();

    let output = sandbox.cbank().args(["commit", &iid]).output().expect("cbank commit");
    assert!(output.status.success(), "commit failed: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<table id=\"ucresults\""));
    assert_eq!(stdout.matches("<span class=\"ucnormal\">Added</span>").count(), 3);
    assert!(stdout.trim_end().ends_with("Comments added: 3"));
    assert_eq!(sandbox.comment_count(), 3);

    let conn = rusqlite::Connection::open(sandbox.db()).unwrap();
    let (text, author): (String, i64) = conn
        .query_row(
            "SELECT commenttext, authoredby FROM local_commentbank ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(text, "Units missing");
    assert_eq!(author, 2);

    // The stored upload is gone after commit
    let again = sandbox.cbank().args(["commit", &iid]).output().unwrap();
    assert_eq!(again.status.code(), Some(5));
    assert_eq!(sandbox.comment_count(), 3);
}

#[test]
fn commit_json_summary() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);
    let iid = sandbox.upload_json(&file)["iid"].as_str().unwrap().to_string();

    let output = sandbox.cbank().args(["commit", &iid, "--json"]).output().unwrap();
    assert!(output.status.success(), "commit failed: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(json["iid"], iid.as_str());
    assert_eq!(json["uploaded"], 3);
}

// ---------------------------------------------------------------------------
// preview / cancel lifecycle
// ---------------------------------------------------------------------------

#[test]
fn preview_again_then_cancel() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);
    let iid = sandbox.upload_json(&file)["iid"].as_str().unwrap().to_string();

    let preview = sandbox.cbank().args(["preview", &iid, "--json"]).output().unwrap();
    assert!(preview.status.success(), "preview failed: {}", stderr(&preview));

    let cancel = sandbox.cbank().args(["cancel", &iid]).output().unwrap();
    assert!(cancel.status.success());

    let after = sandbox.cbank().args(["preview", &iid]).output().unwrap();
    assert_eq!(after.status.code(), Some(5));
    assert_eq!(sandbox.comment_count(), 0);
}

#[test]
fn uploads_are_per_user() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);
    let iid = sandbox.upload_json(&file)["iid"].as_str().unwrap().to_string();

    let output = sandbox
        .cbank_anonymous()
        .args(["--user", "3", "commit", &iid])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ---------------------------------------------------------------------------
// Failures and exit codes
// ---------------------------------------------------------------------------

#[test]
fn too_few_columns_exit_4() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("narrow.csv", "id,comment\n1,hello\n");

    let output = sandbox.cbank().arg("upload").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("not enough columns"));
    assert!(stderr(&output).contains("hint:"));

    let user_dir = sandbox.path("tmp").join("csvimport").join("uploadcomments").join("2");
    let left = fs::read_dir(&user_dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(left, 0, "rejected upload should be removed");
}

#[test]
fn wrong_delimiter_exit_4() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);

    let output = sandbox
        .cbank()
        .arg("upload")
        .arg(&file)
        .args(["--delimiter", "semicolon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn empty_file_exit_3() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("empty.csv", "");

    let output = sandbox.cbank().arg("upload").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unknown_delimiter_is_usage_error() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);

    let output = sandbox
        .cbank()
        .arg("upload")
        .arg(&file)
        .args(["--delimiter", "pipe"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_user_is_usage_error() {
    let sandbox = Sandbox::new();
    let file = sandbox.write("comments.csv", COMMENTS);

    let output = sandbox.cbank_anonymous().arg("upload").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("--user"));
}

#[test]
fn malformed_iid_exit_5() {
    let sandbox = Sandbox::new();
    let output = sandbox.cbank().args(["commit", "not-an-id"]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn settings_file_supplies_user_and_delimiter() {
    let sandbox = Sandbox::new();
    sandbox.write(
        "settings.json",
        "// test settings\n{\n  \"upload.delimiter\": \"semicolon\",\n  \"user.id\": 9\n}\n",
    );
    let file = sandbox.write("semi.csv", "id;comment;contextlevel\n1;Hi;10\n");

    let output = sandbox
        .cbank_anonymous()
        .arg("upload")
        .arg(&file)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "upload failed: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(json["columns"], serde_json::json!(["id", "comment", "contextlevel"]));
    assert!(sandbox.path("tmp").join("csvimport").join("uploadcomments").join("9").exists());
}
