use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FlipreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FlipreelError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        FlipreelError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        FlipreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FlipreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
