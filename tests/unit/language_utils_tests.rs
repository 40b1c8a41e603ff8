/*!
 * Tests for language code utilities
 */

use subweave::language_utils::{
    display_name, get_language_name, is_original_target, language_codes_match, normalize_to_part2t,
    ScriptFamily,
};

#[test]
fn test_languageCodesMatch_acrossCodeForms_shouldMatch() {
    assert!(language_codes_match("fr", "fra"));
    assert!(language_codes_match("fre", "FR"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("xx", "xx"));
}

#[test]
fn test_normalizeToPart2t_shouldUseTerminologyForm() {
    assert_eq!(normalize_to_part2t("zh").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
    assert!(normalize_to_part2t("nope").is_err());
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(display_name("klingonese"), "klingonese");
}

#[test]
fn test_isOriginalTarget_shouldIgnoreCaseAndWhitespace() {
    assert!(is_original_target("original"));
    assert!(is_original_target(" Original "));
    assert!(!is_original_target("en"));
}

#[test]
fn test_scriptFamily_budgets_shouldDependOnTargetScript() {
    assert_eq!(ScriptFamily::for_language("ja"), ScriptFamily::Cjk);
    assert_eq!(ScriptFamily::for_language("th"), ScriptFamily::Thai);
    assert_eq!(ScriptFamily::for_language("fr"), ScriptFamily::Latin);
    assert_eq!(ScriptFamily::for_language("??"), ScriptFamily::Latin);

    assert_eq!(ScriptFamily::Latin.max_chars_for(2.0), 34);
    assert_eq!(ScriptFamily::Cjk.max_chars_for(2.0), 26);
    assert_eq!(ScriptFamily::Thai.max_chars_for(2.0), 30);
}
