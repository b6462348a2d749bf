// Tests for match_prefix, find_first, find_last and find_all
use crate::*;
use pretty_assertions::assert_eq;

fn ranges(pattern: &str, text: &str) -> Vec<(usize, usize)> {
    Pattern::new(pattern)
        .unwrap()
        .find_all(text)
        .iter()
        .map(|m| (m.start(), m.end()))
        .collect()
}

#[test]
fn test_match_prefix_is_partial() {
    let p = Pattern::new("/a+/").unwrap();
    assert_eq!(p.match_prefix("aab").map(|m| m.range()), Some(0..2));
    assert!(p.match_prefix("baa").is_none());
}

#[test]
fn test_find_first_consistent_with_match_prefix() {
    let cases = [
        (r"/\d+/", "abc 123 456"),
        ("/(ab|cd)+e/", "xxcdabe"),
        ("/[a-c]{2}x?/", "zzbcx"),
        ("/o.*?o/", "foo boo"),
    ];
    for (pattern, text) in cases {
        let p = Pattern::new(pattern).unwrap();
        let m = p.find_first(text).unwrap();
        let rebased = p.match_prefix(&text[m.start()..]).unwrap();
        assert_eq!(rebased.range(), 0..m.end() - m.start(), "{}", pattern);
        for (i, _) in text.char_indices().take_while(|&(i, _)| i < m.start()) {
            assert!(p.match_prefix(&text[i..]).is_none(), "{} at {}", pattern, i);
        }
    }
}

#[test]
fn test_find_last_scans_backwards() {
    let p = Pattern::new(r"/\d+/").unwrap();
    assert_eq!(p.find_last("a1b22c333").map(|m| m.range()), Some(8..9));
    assert_eq!(p.find_last("a1b22c").map(|m| m.as_str()), Some("2"));
    assert!(p.find_last("abc").is_none());
}

#[test]
fn test_find_all_non_overlapping() {
    let text = "one two  three";
    let found = ranges(r"/\w+/", text);
    assert_eq!(found, vec![(0, 3), (4, 7), (9, 14)]);

    let p = Pattern::new(r"/\w+/").unwrap();
    let mut offset = 0;
    for &(start, end) in &found {
        let m = p.find_first(&text[offset..]).unwrap();
        assert_eq!((offset + m.start(), offset + m.end()), (start, end));
        offset = end;
    }
    assert!(p.find_first(&text[offset..]).is_none());
}

#[test]
fn test_find_all_empty_matches() {
    assert_eq!(ranges("/x*/", "axxb"), vec![(0, 0), (1, 3), (4, 4)]);
    assert_eq!(ranges("/x*/", ""), vec![(0, 0)]);
    assert_eq!(ranges("/!a/", "aba"), vec![(1, 1), (3, 3)]);
}

#[test]
fn test_find_all_spans_increase() {
    let found = ranges("/a?/", "baaab");
    for pair in found.windows(2) {
        assert!(pair[0].1 <= pair[1].0);
        assert!(pair[0].0 < pair[1].0);
    }
    assert_eq!(found, vec![(0, 0), (1, 2), (2, 3), (3, 4), (5, 5)]);
}

#[test]
fn test_multibyte_spans() {
    let text = "caféé!";
    let m = Pattern::new("/é+/").unwrap().find_first(text).unwrap();
    assert_eq!(m.range(), 3..7);
    assert_eq!(m.as_str(), "éé");
    assert_eq!(ranges("/./", "é€"), vec![(0, 2), (2, 5)]);
}

#[test]
fn test_negation_is_zero_width() {
    let p = Pattern::new("/!x./").unwrap();
    let m = p.find_first("xxab").unwrap();
    assert_eq!(m.range(), 2..3);
    assert_eq!(ranges("/q!u/", "quiz qat"), vec![(5, 6)]);
}

#[test]
fn test_repeated_calls_are_deterministic() {
    let p = Pattern::new(r"/@<a>(\w+)\s+@<b>(\w*)/").unwrap();
    let text = "first second third";
    let once = p.find_all(text);
    for _ in 0..3 {
        assert_eq!(p.find_all(text), once);
    }
}
