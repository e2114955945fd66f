use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ArchilumeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ArchilumeError::process("x")
            .to_string()
            .contains("process error:")
    );
    assert!(ArchilumeError::parse("x").to_string().contains("parse error:"));
    assert!(ArchilumeError::image("x").to_string().contains("image error:"));
}

#[test]
fn not_found_names_the_path() {
    let err = ArchilumeError::not_found("octree", "outputs/octree/scene.oct");
    let msg = err.to_string();
    assert!(msg.starts_with("octree not found:"));
    assert!(msg.contains("scene.oct"));
}

#[test]
fn unknown_preset_lists_valid_names() {
    let err = ArchilumeError::UnknownPreset {
        name: "ultra".to_string(),
        valid: "draft, stand".to_string(),
    };
    assert_eq!(err.to_string(), "unknown preset 'ultra' (valid: draft, stand)");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ArchilumeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
