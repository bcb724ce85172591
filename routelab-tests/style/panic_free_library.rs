//! Library code propagates errors instead of panicking on them.

use super::production_sources;

#[test]
fn test_no_unwrap_or_expect_in_library_code() {
    let mut violations = Vec::new();

    for source in production_sources() {
        for (index, line) in source.code.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") {
                continue;
            }
            if line.contains(".unwrap()") || line.contains(".expect(") {
                violations.push(format!("{}:{}: {}", source.path.display(), index + 1, trimmed));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "unwrap/expect found in library code:\n{}",
        violations.join("\n")
    );
}
