//! Dead Code Enforcement
//!
//! Production code must not silence dead code warnings; unused items are
//! deleted instead.

use super::production_sources;

#[test]
fn test_no_dead_code_allowances() {
    let offenders: Vec<String> = production_sources()
        .into_iter()
        .filter(|source| source.code.contains("allow(dead_code)"))
        .map(|source| source.path.display().to_string())
        .collect();

    assert!(
        offenders.is_empty(),
        "#[allow(dead_code)] found in: {}",
        offenders.join(", ")
    );
}
