use mizan_citations::normalize;
use proptest::prelude::*;

fn scripture_like() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[A-Za-z]{1,8}",
        "[0-9]{1,3}",
        Just("<sup foot_note=12>3</sup>".to_string()),
        Just("<i>".to_string()),
        Just("[i.e. ".to_string()),
        Just("]".to_string()),
        Just("Allāh".to_string()),
        Just("Raḥmān".to_string()),
        Just("ʿĪsā".to_string()),
        "[ \t\n]{1,3}",
        "[,.;:'\"!?()-]",
    ];
    prop::collection::vec(piece, 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in any::<String>()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_markup(text in scripture_like()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_output_is_trimmed_ascii(text in scripture_like()) {
        let out = normalize(&text);
        prop_assert!(out.is_ascii());
        prop_assert_eq!(out.trim(), out.as_str());
        prop_assert!(!out.contains("  "));
        prop_assert!(!out.contains('<'));
    }
}

#[test]
fn normalize_maps_macrons() {
    let out = normalize("Qur'ān");
    assert_eq!(out, "Qur'an");
    assert!(out.chars().all(|c| !unicode_combining(c)));
}

fn unicode_combining(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}
