use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TilingError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TilingError::backend("x")
            .to_string()
            .contains("backend error:")
    );
    assert!(
        TilingError::unknown_frame("grass.png")
            .to_string()
            .contains("unknown frame: the frame id \"grass.png\"")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TilingError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
