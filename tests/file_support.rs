//! Document input formats: PDF extraction, corrupt PDFs and non-UTF-8 text.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use intellibot::export::render_pdf;
use intellibot_core::models::Message;

fn intellibot_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("intellibot");
    path
}

fn setup_file_support_env() -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("intellibot.toml");
    fs::write(&config_path, "[chunking]\nchunk_size = 200\noverlap = 20\n").unwrap();
    (tmp, config_path)
}

fn run_intellibot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = intellibot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run intellibot: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn file_support_pdf_chunks() {
    let (tmp, config_path) = setup_file_support_env();
    let pdf_path = tmp.path().join("policy.pdf");
    let pdf = render_pdf(&[
        Message::user("What is the refund window?"),
        Message::assistant("Refunds are accepted within thirty days of purchase."),
    ])
    .unwrap();
    fs::write(&pdf_path, pdf).unwrap();

    let (stdout, stderr, success) =
        run_intellibot(&config_path, &["chunks", pdf_path.to_str().unwrap(), "--json"]);
    assert!(success, "chunks failed: stdout={}, stderr={}", stdout, stderr);

    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["document"], "policy.pdf");
    let text: String = json["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap().to_lowercase())
        .collect();
    assert!(text.contains("refund"), "extracted: {}", text);
}

#[test]
fn file_support_corrupt_pdf_is_reported() {
    let (tmp, config_path) = setup_file_support_env();
    let pdf_path = tmp.path().join("broken.pdf");
    fs::write(&pdf_path, b"%PDF-1.4\nthis is not a real pdf body\n%%EOF\n").unwrap();

    let (_, stderr, success) = run_intellibot(&config_path, &["chunks", pdf_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("PDF extraction failed"), "stderr: {}", stderr);
}

#[test]
fn file_support_non_utf8_text_is_reported() {
    let (tmp, config_path) = setup_file_support_env();
    let txt_path = tmp.path().join("latin1.txt");
    fs::write(&txt_path, [0x63, 0x61, 0x66, 0xe9, 0xff]).unwrap();

    let (_, stderr, success) = run_intellibot(&config_path, &["chunks", txt_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("UTF-8"), "stderr: {}", stderr);
}

#[test]
fn file_support_missing_file_is_reported() {
    let (tmp, config_path) = setup_file_support_env();
    let missing = tmp.path().join("nope.txt");

    let (_, stderr, success) = run_intellibot(&config_path, &["chunks", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("nope.txt"), "stderr: {}", stderr);
}
