// End-to-end segmentation through the `Segmenter` handle, with dictionaries
// and rules loaded from files.

use std::path::PathBuf;

use libcws::{AttrFilter, Charset, Config, CwsError, DictMode, DictSpec, MultiMode, Segmenter, Token};
use libcws_core::{write_indexed, DictEntry};

const DICT: &str = "\
# word tf idf attr
中国 12 5.5 ns
中国人 6 7 n
人民 9 4 n
人民银行 2 8.5 nt
银行 8 4.5 n
北京 10 6 ns
大学 9 4 n
北京大学 5 9 nt
发展 7 3 v
经济 7 3.5 n
的 50 0.1 u
人 30 1.5 n
";

const RULES: &str = r#"
nostats = ["的"]

[[rule]]
name = "surname"
kind = "prefix"
attr = "nr"
weight = 5.0
words = ["王", "李"]
max = 2

[[rule]]
name = "year"
kind = "suffix"
attr = "t"
words = ["年"]
join_attrs = ["m"]
max = 1
"#;

fn temp_file(name: &str, ext: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("libcws_it_{}_{}.{}", name, std::process::id(), ext));
    std::fs::write(&path, content).unwrap();
    path
}

fn segmenter(name: &str) -> Segmenter {
    let dict = temp_file(name, "txt", DICT);
    let rules = temp_file(&format!("{}_rules", name), "toml", RULES);
    let mut seg = Segmenter::new();
    seg.add_dict(&dict, DictMode::text()).unwrap();
    seg.set_rule(&rules).unwrap();
    seg
}

fn all_tokens(seg: &mut Segmenter) -> Vec<Token> {
    let mut out = Vec::new();
    while let Some(batch) = seg.next_batch().unwrap() {
        assert!(!batch.is_empty());
        out.extend(batch);
    }
    out
}

fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

#[test]
fn longest_match_and_reconstruction() {
    let mut seg = segmenter("basic");
    let text = "中国人民银行在北京大学，发展经济。";
    seg.submit_text(text).unwrap();
    let tokens = all_tokens(&mut seg);
    assert_eq!(
        texts(&tokens),
        vec!["中国人", "民", "银行", "在", "北京大学", "，", "发展", "经济", "。"]
    );
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, text);
    for t in &tokens {
        assert_eq!(&text[t.offset..t.offset + t.len], t.text);
    }
}

#[test]
fn plain_dictionary_segments_exactly() {
    let dict = temp_file("plain", "txt", "中国\n人民\n很好\n");
    let mut seg = Segmenter::new();
    seg.add_dict(&dict, DictMode::text()).unwrap();
    seg.submit_text("中国人民很好").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["中国", "人民", "很好"]);
}

#[test]
fn symbol_query_needs_punctuation() {
    let mut seg = segmenter("symbols");
    let symbols: AttrFilter = "w".parse().unwrap();
    seg.submit_text("中国人民").unwrap();
    assert!(!seg.has_words(&symbols).unwrap());
    seg.submit_text("中国，人民").unwrap();
    assert!(seg.has_words(&symbols).unwrap());
    assert_eq!(texts(&seg.words(&symbols).unwrap()), vec!["，"]);
}

#[test]
fn set_dict_drops_previous_words() {
    let first = temp_file("replace_a", "txt", "中国 5 5 ns\n");
    let second = temp_file("replace_b", "txt", "人民 5 5 n\n");
    let mut seg = Segmenter::new();
    seg.set_dict(&first, DictMode::text()).unwrap();
    seg.submit_text("中国人民").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["中国", "人", "民"]);

    seg.set_dict(&second, DictMode::text()).unwrap();
    seg.submit_text("中国人民").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["中", "国", "人民"]);
    assert_eq!(seg.dictionary().len(), 1);
}

#[test]
fn indexed_dictionary_can_be_opened_repeatedly() {
    let path = std::env::temp_dir().join(format!("libcws_it_shared_{}.xdb", std::process::id()));
    write_indexed(
        &path,
        vec![
            DictEntry::new("中国", "ns", 5.0, 5.0),
            DictEntry::new("人民", "n", 5.0, 4.0),
        ],
    )
    .unwrap();

    let mut a = Segmenter::new();
    a.set_dict(&path, DictMode::indexed()).unwrap();
    a.set_dict(&path, DictMode::indexed()).unwrap();
    a.add_dict(&path, DictMode::indexed()).unwrap();
    assert_eq!(a.dictionary().len(), 2);

    let mut b = Segmenter::new();
    b.add_dict(&path, DictMode::indexed()).unwrap();

    let mut cfg = Config::default();
    cfg.dictionaries.push(DictSpec::new(path.clone()));
    let mut c = Segmenter::from_config(cfg).unwrap();

    for seg in [&mut a, &mut b, &mut c] {
        seg.submit_text("中国人民").unwrap();
        assert_eq!(texts(&all_tokens(seg)), vec!["中国", "人民"]);
    }
}

#[test]
fn resubmission_is_idempotent() {
    let mut seg = segmenter("idem");
    let text = "王小明在2024年去了北京。";
    seg.submit_text(text).unwrap();
    let first = all_tokens(&mut seg);
    seg.submit_text(text).unwrap();
    let second = all_tokens(&mut seg);
    assert_eq!(first, second);
    seg.rewind().unwrap();
    assert_eq!(all_tokens(&mut seg), first);
}

#[test]
fn rules_build_names_and_years() {
    let mut seg = segmenter("rules");
    seg.submit_text("王小明在2024年去了北京").unwrap();
    let tokens = all_tokens(&mut seg);
    assert_eq!(texts(&tokens), vec!["王小明", "在", "2024年", "去", "了", "北京"]);
    assert_eq!(tokens[0].attr, "nr");
    assert_eq!(tokens[0].weight, 5.0);
    assert_eq!(tokens[2].attr, "t");
}

#[test]
fn year_suffix_skips_dictionary_numerals() {
    let mut seg = segmenter("numerals");
    let extra = temp_file("numerals_extra", "txt", "二十 3 2 m\n");
    seg.add_dict(&extra, DictMode::text()).unwrap();
    seg.submit_text("二十年").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["二十", "年"]);
    seg.submit_text("2024年").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["2024年"]);
}

#[test]
fn short_mode_is_a_superset() {
    let mut seg = segmenter("short");
    let text = "北京大学的人民银行";
    seg.submit_text(text).unwrap();
    let plain = all_tokens(&mut seg);

    seg.set_multi(MultiMode::from_bits(MultiMode::SHORT).unwrap()).unwrap();
    seg.submit_text(text).unwrap();
    let short = all_tokens(&mut seg);
    for t in &plain {
        assert!(short.contains(t), "missing {:?}", t.text);
    }
    let s = texts(&short);
    assert!(s.contains(&"北京") && s.contains(&"大学"));
    assert!(s.contains(&"人民") && s.contains(&"银行"));
    // ordered by offset, longer span first
    for pair in short.windows(2) {
        assert!(pair[0].offset < pair[1].offset || (pair[0].offset == pair[1].offset && pair[0].len > pair[1].len));
    }
}

#[test]
fn ignore_punctuation_and_filters() {
    let mut seg = segmenter("ignore");
    seg.set_ignore(true).unwrap();
    seg.submit_text("北京，发展！经济").unwrap();
    let tokens = all_tokens(&mut seg);
    assert!(tokens.iter().all(|t| !t.is_symbol()));

    let nouns: AttrFilter = "n,ns".parse().unwrap();
    let others: AttrFilter = "~n,ns".parse().unwrap();
    let a = seg.words(&nouns).unwrap();
    let b = seg.words(&others).unwrap();
    assert_eq!(a.len() + b.len(), tokens.len());
    assert!(seg.has_words(&"v".parse().unwrap()).unwrap());
    assert!(!seg.has_words(&"nr".parse().unwrap()).unwrap());
}

#[test]
fn tops_ranking() {
    let mut seg = segmenter("tops");
    seg.submit_text("经济的发展，经济的增长，北京的经济").unwrap();
    let top = seg.tops(Some(3), &AttrFilter::any()).unwrap();
    assert_eq!(top[0].word, "经济");
    assert_eq!(top[0].times, 3);
    assert!(top.iter().all(|w| w.word != "的"));
    for pair in top.windows(2) {
        assert!(pair[0].weight >= pair[1].weight);
    }
    let verbs = seg.tops(None, &"v".parse().unwrap()).unwrap();
    assert_eq!(verbs.len(), 1);
    assert_eq!(verbs[0].word, "发展");
}

#[test]
fn empty_text_yields_no_batches() {
    let mut seg = segmenter("empty");
    seg.submit_text("").unwrap();
    assert!(seg.next_batch().unwrap().is_none());
    assert!(seg.tops(None, &AttrFilter::any()).unwrap().is_empty());
}

#[test]
fn gbk_bytes_report_gbk_offsets() {
    let mut seg = segmenter("gbk");
    seg.set_charset("gbk").unwrap();
    // "北京a" in GBK
    let bytes = [0xB1, 0xB1, 0xBE, 0xA9, b'a'];
    seg.submit_bytes(&bytes).unwrap();
    let tokens = all_tokens(&mut seg);
    assert_eq!(texts(&tokens), vec!["北京", "a"]);
    assert_eq!((tokens[1].offset, tokens[1].len), (4, 1));

    assert!(matches!(seg.submit_bytes(&[0xff, 0xff, 0xff]), Err(CwsError::Decode(_))));
    assert_eq!(seg.charset(), Charset::Gbk);
}

#[test]
fn gbk_rejects_characters_outside_gbk() {
    let mut seg = segmenter("gbk_strict");
    seg.set_charset("gbk").unwrap();
    seg.submit_text("北京").unwrap();

    // four-byte GB18030 sequence for U+0080
    let bytes = [0x81, 0x30, 0x81, 0x30, b'a'];
    assert!(matches!(seg.submit_bytes(&bytes), Err(CwsError::Decode(_))));
    assert!(matches!(seg.submit_text("\u{80}a"), Err(CwsError::Decode(_))));
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["北京"]);
}

#[test]
fn failed_loads_keep_configuration() {
    let mut seg = segmenter("failed");
    let missing = std::env::temp_dir().join(format!("libcws_it_missing_{}.xdb", std::process::id()));
    assert!(matches!(seg.set_dict(&missing, DictMode::indexed()), Err(CwsError::Load { .. })));
    assert!(seg.set_rule(&missing).is_err());
    seg.submit_text("王小明").unwrap();
    assert_eq!(texts(&all_tokens(&mut seg)), vec!["王小明"]);
}
