//! Property tests for the tokenizer and resolver.

use plugbot_args::{Coercion, Param, resolve, split, tokenize};
use proptest::prelude::*;

proptest! {
    #[test]
    fn never_panics_and_offsets_are_char_boundaries(text in "\\PC{0,64}") {
        let tokens = tokenize(&text);
        for t in &tokens {
            prop_assert!(text.is_char_boundary(t.start));
            prop_assert!(t.start < text.len() || text.is_empty());
        }
    }

    #[test]
    fn unquoted_words_round_trip(words in prop::collection::vec("[a-zA-Z0-9_!?.]{1,12}", 0..8)) {
        let text = words.join(" ");
        prop_assert_eq!(split(&text), words);
    }

    #[test]
    fn quoted_phrase_is_one_token(phrase in "[a-z ]{0,20}") {
        let text = format!("cmd \"{phrase}\" tail");
        let got = split(&text);
        prop_assert_eq!(got, vec!["cmd".to_owned(), phrase, "tail".to_owned()]);
    }

    #[test]
    fn rest_is_suffix_of_original(prefix in "[a-z]{1,8}", tail in "[a-zA-Z][a-zA-Z ]{0,30}") {
        let text = format!("{prefix} {tail}");
        let tokens = tokenize(&text);
        let params = [Param::required("rest", Coercion::Rest)];
        let args = resolve(&params, &tokens, 1, &text).unwrap();
        prop_assert_eq!(args.str("rest"), Some(tail.as_str()));
    }
}

#[test]
fn integer_parameter_reports_missing_then_bad_value() {
    let params = [Param::required("n", Coercion::Int)];

    let text = "roll";
    let err = resolve(&params, &tokenize(text), 1, text).unwrap_err();
    assert!(err.is_incomplete());

    let text = "roll many";
    let err = resolve(&params, &tokenize(text), 1, text).unwrap_err();
    assert!(!err.is_incomplete());
    assert_eq!(err.param(), "n");
}
