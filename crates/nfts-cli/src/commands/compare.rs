//! Compare command implementation.

use crate::artifacts::{canonical_file, compare_files, hash_file, signature_file, FileComparison};
use crate::output::print_section;
use std::path::{Path, PathBuf};

pub fn run(dir_a: PathBuf, dir_b: PathBuf, unit: usize) -> Result<(), Box<dyn std::error::Error>> {
    for dir in [&dir_a, &dir_b] {
        if !dir.is_dir() {
            return Err(format!("Not a directory: {}", dir.display()).into());
        }
    }

    println!("{}", "=".repeat(70));
    println!("A: {}", dir_a.display());
    println!("B: {}", dir_b.display());
    println!("{}", "=".repeat(70));
    println!();

    print_section("1. CANONICAL");
    let canonical = compare_artifact(&dir_a, &dir_b, &canonical_file(unit))?;
    println!();

    print_section("2. HASH SHA-1");
    let hash_name = hash_file(unit);
    let hash = compare_artifact(&dir_a, &dir_b, &hash_name)?;
    for (label, dir) in [("A", &dir_a), ("B", &dir_b)] {
        if let Ok(bytes) = std::fs::read(dir.join(&hash_name)) {
            println!("   {} hash (hex): {}", label, hex::encode(bytes));
        }
    }
    println!();

    print_section("3. SIGNATURE");
    let signature = compare_artifact(&dir_a, &dir_b, &signature_file(unit))?;
    println!();

    println!("{}", "=".repeat(70));
    println!("CONCLUSION");
    println!("{}", "=".repeat(70));
    println!("{}", conclusion(&canonical, &hash, &signature));
    Ok(())
}

fn compare_artifact(
    dir_a: &Path,
    dir_b: &Path,
    name: &str,
) -> Result<FileComparison, Box<dyn std::error::Error>> {
    let comparison = compare_files(&dir_a.join(name), &dir_b.join(name))?;
    match &comparison {
        FileComparison::Missing(path) => println!("MISSING {}: {}", name, path.display()),
        FileComparison::Equal { len } => println!("EQUAL {} ({} bytes)", name, len),
        FileComparison::Different {
            len_a,
            len_b,
            offset,
            window_start,
            window_a,
            window_b,
        } => {
            println!("DIFFERENT {}", name);
            println!("   A: {} bytes", len_a);
            println!("   B: {} bytes", len_b);
            println!("   First difference at byte {}", offset);
            println!("   A [{}..]: {}", window_start, window_a);
            println!("   B [{}..]: {}", window_start, window_b);
        }
    }
    Ok(comparison)
}

fn conclusion(
    canonical: &FileComparison,
    hash: &FileComparison,
    signature: &FileComparison,
) -> &'static str {
    match (canonical.is_equal(), hash.is_equal(), signature.is_equal()) {
        (_, true, true) => "Hashes and signatures are identical.",
        (_, true, false) => {
            "Hashes are identical but signatures differ: the canonical form matches, \
             look at the signing operation or the private key."
        }
        (false, false, _) => {
            "Canonical bytes differ: look at canonicalization before hashing or signing."
        }
        (true, false, _) => "Canonical bytes match but hashes differ: look at the hash step.",
    }
}
