use scour_core::tokenizer::tokenize;

#[test]
fn it_normalizes_and_stems() {
    let toks = tokenize("Running Runners RUN! ﬁnely ground coffee.");
    // Stemming folds the run variants together
    assert!(toks.contains(&"run".to_string()));
    // NFKC expands the ﬁ ligature before matching
    assert!(toks.iter().any(|w| w.starts_with("fine")));
}

#[test]
fn it_filters_stopwords() {
    let toks = tokenize("The quick brown fox and the lazy dog");
    assert!(!toks.contains(&"the".to_string()));
    assert!(!toks.contains(&"and".to_string()));
}

#[test]
fn positions_follow_term_order() {
    let toks = tokenize("cat sat on a mat");
    // Stopwords vanish; the remaining terms keep their relative order.
    assert_eq!(toks, vec!["cat", "sat", "mat"]);
}

#[test]
fn empty_input_yields_no_terms() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \n\t ").is_empty());
}
