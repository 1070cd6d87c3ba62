//! Integration tests for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../nfts-core/tests/fixtures");

fn fixture(name: &str) -> PathBuf {
    Path::new(FIXTURES).join(name)
}

fn nfts(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nfts"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run nfts")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn sign_fixture(temp: &TempDir, extra: &[&str]) -> (PathBuf, Output) {
    let output_path = temp.path().join("signed.xml");
    let input = fixture("lote.xml");
    let key = fixture("signer_key.pem");
    let cert = fixture("signer_cert.pem");
    let mut args = vec![
        "sign",
        path_str(&input),
        path_str(&output_path),
        "--key",
        path_str(&key),
        "--cert",
        path_str(&cert),
    ];
    args.extend_from_slice(extra);
    let output = nfts(&args);
    (output_path, output)
}

#[test]
fn test_sign_then_verify_envelope() {
    let temp = TempDir::new().unwrap();
    let (signed, output) = sign_fixture(&temp, &[]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Signed 2 of 2 units"));

    let written = fs::read_to_string(&signed).unwrap();
    assert!(written.contains("<soap:Envelope"));
    assert!(written.contains("<TesteEnvioLoteNFTSRequest"));
    assert!(written.contains("<![CDATA[<?xml"));

    let cert = fixture("signer_cert.pem");
    let output = nfts(&["verify", path_str(&signed), "--cert", path_str(&cert), "--strict"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 valid, 0 invalid, 0 skipped"));
}

#[test]
fn test_verify_json_with_der_certificate() {
    let temp = TempDir::new().unwrap();
    let (signed, output) = sign_fixture(&temp, &["--no-envelope"]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&signed)
        .unwrap()
        .starts_with("<?xml version='1.0' encoding='utf-8'?>\n<PedidoEnvioLoteNFTS"));

    let cert = fixture("signer_cert.der");
    let output = nfts(&["verify", path_str(&signed), "--cert", path_str(&cert), "--json"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["algorithm"], "RSASSA-PKCS1-v1_5 / SHA-1");
    assert_eq!(report["valid"], 2);
    assert_eq!(report["units"][0]["status"], "valid");
    assert_eq!(report["units"][0]["verdict"]["verdict"], "Valid");
}

#[test]
fn test_verify_wrong_certificate_strict_fails() {
    let temp = TempDir::new().unwrap();
    let (signed, _) = sign_fixture(&temp, &[]);
    let other = fixture("other_cert.pem");

    let output = nfts(&["verify", path_str(&signed), "--cert", path_str(&other)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("INVALID"));
    assert!(stdout.contains("3b480478916950d6c07555aaf075d7033f71a769"));
    assert!(stdout.contains("0 valid, 2 invalid"));

    let output = nfts(&["verify", path_str(&signed), "--cert", path_str(&other), "--strict"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: unit 1: signature mismatch (sha-1 "));
    assert!(stderr.contains("Error: unit 2: signature mismatch"));
}

#[test]
fn test_verify_unsigned_input_strict_lists_skipped_units() {
    let input = fixture("lote.xml");
    let cert = fixture("signer_cert.pem");
    let output = nfts(&["verify", path_str(&input), "--cert", path_str(&cert), "--strict"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: unit "));
    assert!(stderr.contains("no <Assinatura> in record unit"));
}

#[test]
fn test_verify_unsigned_input_skips_units() {
    let input = fixture("lote.xml");
    let cert = fixture("signer_cert.pem");
    let output = nfts(&["verify", path_str(&input), "--cert", path_str(&cert)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SKIPPED"));
    assert!(stdout.contains("1 skipped"));
}

#[test]
fn test_canonicalize_single_unit() {
    let input = fixture("lote.xml");
    let output = nfts(&["canonicalize", path_str(&input), "--unit", "1"]);
    assert!(output.status.success());

    let expected = fs::read(fixture("canonical_unit_1.bin")).unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&*String::from_utf8_lossy(&expected)));
    assert!(stdout.starts_with("# NFTS 1 ("));
    assert!(!stdout.contains("# NFTS 2"));

    let output = nfts(&["canonicalize", path_str(&input), "--unit", "3"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: Unit 3 out of range"));
}

#[test]
fn test_canonicalize_json_reports() {
    let input = fixture("lote.xml");
    let output = nfts(&["canonicalize", path_str(&input), "--json"]);
    assert!(output.status.success());
    let units: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(units.as_array().unwrap().len(), 2);
    assert_eq!(units[1]["report"]["status"], "Ambiguous");
}

#[test]
fn test_debug_dirs_compare_equal() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    let (_, output) = sign_fixture(&temp, &["--debug-dir", path_str(&dir_a)]);
    assert!(output.status.success());
    let (_, output) = sign_fixture(&temp, &["--debug-dir", path_str(&dir_b)]);
    assert!(output.status.success());

    assert_eq!(
        fs::read(dir_a.join("canonical_NFTS_1.bin")).unwrap(),
        fs::read(fixture("canonical_unit_1.bin")).unwrap()
    );
    assert_eq!(fs::read(dir_a.join("hash_NFTS_1.bin")).unwrap().len(), 20);

    let output = nfts(&["compare", path_str(&dir_a), path_str(&dir_b)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("EQUAL canonical_NFTS_1.bin"));
    assert!(stdout.contains("Hashes and signatures are identical."));
}

#[test]
fn test_compare_reports_differing_signature() {
    let temp = TempDir::new().unwrap();
    let dir_a = temp.path().join("a");
    let dir_b = temp.path().join("b");
    sign_fixture(&temp, &["--debug-dir", path_str(&dir_a)]);
    sign_fixture(&temp, &["--debug-dir", path_str(&dir_b)]);
    let tampered = dir_b.join("signature_NFTS_2.bin");
    let mut bytes = fs::read(&tampered).unwrap();
    bytes[0] ^= 0xff;
    fs::write(&tampered, bytes).unwrap();

    let output = nfts(&["compare", path_str(&dir_a), path_str(&dir_b), "--unit", "2"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DIFFERENT signature_NFTS_2.bin"));
    assert!(stdout.contains("First difference at byte 0"));
    assert!(stdout.contains("signatures differ"));
}

#[test]
fn test_config_file_and_missing_document_signer() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("nfts.yaml");
    fs::write(
        &config,
        "envelope:\n  operation: EnvioLoteNFTSRequest\n\
         document_signature:\n  enabled: true\n  xmlsec_binary: /nonexistent/xmlsec1\n",
    )
    .unwrap();

    let (signed, output) = sign_fixture(&temp, &["--config", path_str(&config)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("document signature skipped"));
    let written = fs::read_to_string(&signed).unwrap();
    assert!(written.contains("<EnvioLoteNFTSRequest"));
    assert!(!written.contains("ds:Signature"));
}

#[test]
fn test_key_errors_are_fatal() {
    let temp = TempDir::new().unwrap();
    let output_path = temp.path().join("out.xml");
    let input = fixture("lote.xml");
    let key = fixture("signer_key.pem");
    let other = fixture("other_cert.pem");

    let output = nfts(&[
        "sign",
        path_str(&input),
        path_str(&output_path),
        "--key",
        path_str(&key),
        "--cert",
        path_str(&other),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: key mismatch"));
    assert!(!output_path.exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("nfts.yaml");
    fs::write(&config, "profile: nfts-unknown\n").unwrap();
    let input = fixture("lote.xml");
    let output = nfts(&["canonicalize", path_str(&input), "--config", path_str(&config)]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("validation error"));
}
