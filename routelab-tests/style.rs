//! Style Enforcement Tests
//!
//! Scans the library crates for patterns clippy does not flag on its own.
//!
//! - `panic_free_library` - No `unwrap()`/`expect()` outside test modules
//! - `dead_code_enforcement` - Prevents #[allow(dead_code)] in production code

#[path = "style/panic_free_library.rs"]
mod panic_free_library;

#[path = "style/dead_code_enforcement.rs"]
mod dead_code_enforcement;

use std::fs;
use std::path::{Path, PathBuf};

/// Library source roots checked by the style tests, relative to this crate.
const LIBRARY_ROOTS: [&str; 2] = ["../routelab-core/src", "../routelab-sim/src"];

/// A Rust source file with its inline test module stripped.
struct ProductionSource {
    path: PathBuf,
    code: String,
}

fn collect_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rust_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    Ok(())
}

/// Loads every library file, keeping only the code before `#[cfg(test)]`.
fn production_sources() -> Vec<ProductionSource> {
    let mut files = Vec::new();
    for root in LIBRARY_ROOTS {
        collect_rust_files(Path::new(root), &mut files).unwrap();
    }
    assert!(!files.is_empty(), "no library sources found");

    files
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path).unwrap();
            let code = match content.find("#[cfg(test)]") {
                Some(index) => content[..index].to_string(),
                None => content,
            };
            ProductionSource { path, code }
        })
        .collect()
}
