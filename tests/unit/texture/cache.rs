use super::*;
use crate::texture::base::TexturePixels;

fn sheet_base() -> Rc<BaseTexture> {
    let px = TexturePixels::from_premul_rgba8(128, 128, vec![0; 128 * 128 * 4]).unwrap();
    Rc::new(BaseTexture::new(px))
}

const SHEET: &str = r#"{
    "grass": {
        "frame": {"x": 2, "y": 2, "w": 30, "h": 40},
        "trimmed": true,
        "spriteSourceSize": {"x": 1, "y": 1, "w": 30, "h": 40},
        "sourceSize": {"w": 32, "h": 42}
    },
    "rock": {
        "frame": {"x": 40, "y": 2, "w": 20, "h": 10},
        "rotated": true
    }
}"#;

#[test]
fn trimmed_frame_maps_to_orig_and_trim() {
    let frames: BTreeMap<String, AtlasFrame> = serde_json::from_str(SHEET).unwrap();
    let tex = frames["grass"].to_texture(sheet_base());
    assert_eq!(tex.frame(), Rect::new(2.0, 2.0, 32.0, 42.0));
    assert_eq!(tex.orig(), Size::new(32.0, 42.0));
    assert_eq!(tex.trim(), Some(Rect::new(1.0, 1.0, 31.0, 41.0)));
    assert!(!tex.is_rotated());
}

#[test]
fn rotated_frame_occupies_swapped_region() {
    let frames: BTreeMap<String, AtlasFrame> = serde_json::from_str(SHEET).unwrap();
    let tex = frames["rock"].to_texture(sheet_base());
    assert!(tex.is_rotated());
    assert_eq!(tex.frame(), Rect::new(40.0, 2.0, 50.0, 22.0));
    assert_eq!(tex.orig(), Size::new(20.0, 10.0));
}

#[test]
fn unknown_sheet_keys_are_rejected() {
    let res: Result<AtlasFrame, _> =
        serde_json::from_str(r#"{"frame": {"x": 0, "y": 0, "w": 1, "h": 1}, "pivot": 3}"#);
    assert!(res.is_err());
}

#[test]
fn cache_lookup_of_unknown_id_is_a_hard_error() {
    let frames: BTreeMap<String, AtlasFrame> = serde_json::from_str(SHEET).unwrap();
    let mut cache = TextureCache::new();
    cache.add_sheet(&sheet_base(), &frames);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("grass"));
    assert!(cache.get("grass").is_ok());

    let err = cache.get("sand").unwrap_err();
    assert!(matches!(err, TilingError::UnknownFrame(ref id) if id == "sand"));
}
