use prefix_regex::{PrefixRegex, PrefixValidator, is_prefix_valid, strip_delimiters, tokenize};
use regex::Regex;
use rstest::rstest;
use std::thread;

const ALPHABET: &str = "abc";

const OPTIONAL_CHAR: &str = "/^te?s[a-zA-Z]$/";
const REPEATED_GROUP: &str = r"/^te(s[a-zA-Z]*){1,2}\d{1,2}$/";
const NESTED_REPEATS: &str = "/^te(st(a.){1,2}(b)?){2,}$/";

fn check(literal: &str, candidate: &str) -> bool {
    let tree = tokenize(strip_delimiters(literal)).unwrap();
    is_prefix_valid(&tree, candidate).unwrap()
}

#[rstest]
#[case(OPTIONAL_CHAR, "reeesm", false)]
#[case(OPTIONAL_CHAR, "te", true)]
#[case(OPTIONAL_CHAR, "ts", true)]
#[case(OPTIONAL_CHAR, "test", true)]
#[case(REPEATED_GROUP, "tertst", false)]
#[case(REPEATED_GROUP, "te12", false)]
#[case(REPEATED_GROUP, "testst", true)]
#[case(REPEATED_GROUP, "testst1", true)]
#[case(REPEATED_GROUP, "tesr43", true)]
#[case(NESTED_REPEATS, "rest", false)]
#[case(NESTED_REPEATS, "testabf", false)]
#[case(NESTED_REPEATS, "t", true)]
#[case(NESTED_REPEATS, "test", true)]
#[case(NESTED_REPEATS, "testa", true)]
#[case(NESTED_REPEATS, "testacagb", true)]
#[case(NESTED_REPEATS, "testacavstanb", true)]
#[case(NESTED_REPEATS, "testacavbstan", true)]
fn validates_candidates(#[case] literal: &str, #[case] candidate: &str, #[case] expected: bool) {
    // when
    let res = check(literal, candidate);

    // then
    assert_eq!(res, expected, "{literal} on '{candidate}'");
}

#[rstest]
#[case(OPTIONAL_CHAR, "tesx")]
#[case(REPEATED_GROUP, "testst1")]
#[case(REPEATED_GROUP, "tesr43")]
#[case(NESTED_REPEATS, "testacagb")]
fn every_prefix_of_a_match_is_valid(#[case] literal: &str, #[case] full_match: &str) {
    // given
    let tree = tokenize(strip_delimiters(literal)).unwrap();

    for (end, _) in full_match.char_indices().skip(1).chain([(full_match.len(), ' ')]) {
        // when
        let prefix = &full_match[..end];
        let res = is_prefix_valid(&tree, prefix).unwrap();

        // then
        assert!(res, "{literal} rejected prefix '{prefix}'");
    }
}

/// Every string over `ALPHABET` with at most `len` chars, shortest first.
fn strings_up_to(len: usize) -> Vec<String> {
    let mut all = vec![String::new()];
    let mut layer = vec![String::new()];
    for _ in 0..len {
        layer = layer
            .iter()
            .flat_map(|s| ALPHABET.chars().map(move |c| format!("{s}{c}")))
            .collect();
        all.extend(layer.iter().cloned());
    }
    all
}

#[rstest]
#[case("ab|ba")]
#[case("a(b|ca)*c")]
#[case("(ab)?c(a|b)")]
#[case("a(b(c)?)+a")]
#[case("(a|bc){2}")]
#[case("(ab)*c")]
#[case("a?b?c")]
#[case("(a(bc)*)+")]
fn verdicts_agree_with_exhaustive_extension(#[case] pattern: &str) {
    // given
    let tree = tokenize(pattern).unwrap();
    let full = Regex::new(&format!("^(?:{pattern})$")).unwrap();
    let extensions = strings_up_to(4);

    for candidate in strings_up_to(4).iter().skip(1) {
        // when
        let res = is_prefix_valid(&tree, candidate.as_str()).unwrap();

        // then
        let expected = extensions
            .iter()
            .any(|tail| full.is_match(&format!("{candidate}{tail}")));
        assert_eq!(res, expected, "{pattern} on '{candidate}'");
    }
}

#[rstest]
#[case(r"[\0-\x1f]", "\u{1}", true)]
#[case(r"[\0-\x1f]", "a", false)]
#[case(r"[\cA]b", "\u{1}b", true)]
#[case(r"[\e]", "e", true)]
#[case(r"[\/]x", "/", true)]
#[case("[^]a", "a", true)]
#[case("[^]a", "ba", true)]
#[case("[^]a", "bb", false)]
#[case("[]a", "a", false)]
fn class_escapes_reach_the_engine_well_formed(
    #[case] pattern: &str,
    #[case] candidate: &str,
    #[case] expected: bool,
) {
    // given
    let tree = tokenize(pattern).unwrap();

    // when
    let res = is_prefix_valid(&tree, candidate);

    // then
    assert_eq!(res, Ok(expected), "{pattern} on {candidate:?}");
}

#[test]
fn missing_candidate_is_invalid() {
    // given
    let tree = tokenize("te?s[a-zA-Z]").unwrap();

    // then
    assert_eq!(is_prefix_valid(&tree, None), Ok(false));
    assert_eq!(is_prefix_valid(&tree, ""), Ok(false));
}

#[test]
fn root_holds_one_element_per_top_level_token() {
    // when
    let tree = tokenize(strip_delimiters("/^tes.i[a-z]g$/")).unwrap();

    // then
    assert_eq!(tree.root().len(), 5);
}

#[test]
fn repetition_limit_bounds_the_search() {
    // given
    let unlimited = PrefixRegex::new("(ab)*c").unwrap();
    let limited = PrefixRegex::new("(ab)*c").unwrap().with_repetition_limit(1);

    // then
    assert_eq!(unlimited.is_prefix_valid("ababa"), Ok(true));
    assert_eq!(limited.is_prefix_valid("aba"), Ok(true));
    assert_eq!(limited.is_prefix_valid("ababa"), Ok(false));
}

#[test]
fn one_tree_serves_many_threads() {
    // given
    let tree = tokenize(strip_delimiters(NESTED_REPEATS)).unwrap();
    let validator = PrefixValidator::new();
    let candidates = [("testacagb", true), ("rest", false), ("testa", true), ("testabf", false)];

    // when
    let verdicts: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = candidates
            .iter()
            .map(|(candidate, _)| {
                let (tree, validator) = (&tree, &validator);
                scope.spawn(move || validator.is_prefix_valid(tree, *candidate).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // then
    let expected: Vec<bool> = candidates.iter().map(|(_, valid)| *valid).collect();
    assert_eq!(verdicts, expected);
}
