// Tests for replacement templates
use crate::*;

#[test]
fn test_replace_with_captures() {
    let p = Pattern::new(r"/@<k>(\w+)=@<v>(\w+)/").unwrap();
    let (out, n) = p.replace_all("a=1, b=2", "@<v>=@<k>").unwrap();
    assert_eq!(out, "1=a, 2=b");
    assert_eq!(n, 2);

    let (out, n) = p.replacen("a=1, b=2", 1, "@<v>=@<k>").unwrap();
    assert_eq!(out, "1=a, b=2");
    assert_eq!(n, 1);

    let (out, n) = p.replacen("a=1", 0, "x").unwrap();
    assert_eq!(out, "a=1");
    assert_eq!(n, 0);
}

#[test]
fn test_replace_whole_match_and_at_sign() {
    let p = Pattern::new(r"/\d+/").unwrap();
    let (out, n) = p.replace_all("a1b22", "[@<complete>]").unwrap();
    assert_eq!(out, "a[1]b[22]");
    assert_eq!(n, 2);

    let (out, _) = p.replace_all("7", "@@<complete>").unwrap();
    assert_eq!(out, "@<complete>");
}

#[test]
fn test_replace_missing_capture_is_empty() {
    let p = Pattern::new("/(@<a>(x)|@<b>(y))/").unwrap();
    let (out, _) = p.replace_all("xy", "<@<a>|@<b>>").unwrap();
    assert_eq!(out, "<x|><|y>");
}

#[test]
fn test_replace_empty_matches() {
    let p = Pattern::new("/x*/").unwrap();
    let (out, n) = p.replace_all("axxb", "-").unwrap();
    assert_eq!(out, "-a-b-");
    assert_eq!(n, 3);
}

#[test]
fn test_replace_plain_literal() {
    let p = Pattern::new("/cat/").unwrap();
    let (out, n) = p.replace_all("cat concat", "dog").unwrap();
    assert_eq!(out, "dog condog");
    assert_eq!(n, 2);
}

#[test]
fn test_template_errors() {
    let p = Pattern::new("/z/").unwrap();
    assert_eq!(
        p.replace_all("abc", "@x"),
        Err(TemplateError::InvalidEscape { position: 0 })
    );
    assert_eq!(
        p.replace_all("abc", "ok @<name"),
        Err(TemplateError::UnterminatedName { position: 3 })
    );
}

#[test]
fn test_replace_multibyte() {
    let p = Pattern::new("/é/i").unwrap();
    let (out, n) = p.replace_all("Éclair, café", "e").unwrap();
    assert_eq!(out, "eclair, cafe");
    assert_eq!(n, 2);
}
