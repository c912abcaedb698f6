use super::*;

#[test]
fn test_strips_pack_format() {
    let title = normalize("Coca-Cola 6x33cl");
    assert_eq!(title.original, "Coca-Cola 6x33cl");
    assert_eq!(title.normalized, "coca cola");
    assert_eq!(title.tokens, vec!["coca", "cola"]);
}

#[test]
fn test_keeps_protected_terms() {
    let title = normalize("Yaourt bio sans sucre 4x125g");
    assert_eq!(title.normalized, "yaourt bio sans sucre");
    assert!(title.tokens.contains(&"bio".to_string()));
    assert!(title.normalized.contains("sans sucre"));
    assert!(!title.normalized.contains("125"));
}

#[test]
fn test_folds_diacritics_and_ligatures() {
    let title = normalize("Crème Brûlée ŒUFS");
    assert_eq!(title.normalized, "creme brulee oeufs");
}

#[test]
fn test_removes_quantities_and_packaging() {
    assert_eq!(normalize("Eau minérale 1,5L").normalized, "eau minerale");
    assert_eq!(normalize("Lessive liquide flacon 2 L").normalized, "lessive liquide");
    assert_eq!(normalize("Pack de 6 bières").normalized, "bieres");
    assert_eq!(normalize("Oeufs frais x12").normalized, "oeufs frais");
    assert_eq!(normalize("Café moulu 250g").normalized, "cafe moulu");
}

#[test]
fn test_removes_apparel_sizes() {
    assert_eq!(normalize("T-shirt coton XL").normalized, "t shirt coton");
    assert_eq!(normalize("Chaussettes S/M").normalized, "chaussettes");
}

#[test]
fn test_underscores_split_words() {
    assert_eq!(normalize("Chaussettes m_l").normalized, "chaussettes");
    assert_eq!(normalize("jus_orange").normalized, "jus orange");
}

#[test]
fn test_size_between_quantity_parts_is_removed() {
    assert_eq!(normalize("Ketchup 500 xl g").normalized, "ketchup");
    assert_eq!(normalize("Farine 1 s kg").normalized, "farine");
}

#[test]
fn test_tokens_are_distinct_in_order() {
    let title = normalize("Sodas cola cola zero sodas");
    assert_eq!(title.tokens, vec!["sodas", "cola", "zero"]);
}

#[test]
fn test_empty_and_noise_inputs() {
    let empty = normalize("");
    assert_eq!(empty.normalized, "");
    assert!(empty.is_empty());

    let noise = normalize("!!! --- ???");
    assert_eq!(noise.normalized, "");
    assert!(noise.tokens.is_empty());
}

#[test]
fn test_normalize_is_idempotent() {
    let samples = [
        "Coca-Cola 6x33cl",
        "Yaourt bio sans sucre 4x125g",
        "Crème Brûlée ŒUFS",
        "Eau minérale 1,5L",
        "Chocolat noir 70% pur beurre",
        "T-shirt coton XL",
        "Chaussettes m_l",
        "Ketchup 500 xl g",
        "Sans_sucre pack xl de 6",
        "ꙮ҉ ⸘ ☃",
        "",
    ];
    for sample in samples {
        let once = normalize(sample);
        let twice = normalize(&once.normalized);
        assert_eq!(once.normalized, twice.normalized, "input {sample:?}");
        assert_eq!(once.tokens, twice.tokens, "input {sample:?}");
    }
}

#[test]
fn test_tokenize_matches_normalize() {
    assert_eq!(tokenize("JUS D'ORANGE"), vec!["jus", "d", "orange"]);
}
