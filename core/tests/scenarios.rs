// core/tests/scenarios.rs
//
// End-to-end lookups through the public API:
// - shared keys across dictionaries of different priority
// - exact-only collection for short segments
// - prefix expansion with depth penalty
// - whitespace segmentation
// - fuzzy variants and their penalty
// - filter mode auto-commit

use std::sync::Arc;

use webime_core::{
    segment, Config, DictionaryKind, DictionaryRegistry, DictionarySpec, Engine, ImeEngine,
    InlineJson, InputMode, KeyEvent,
};

fn registry(dicts: &[(&str, i32, &str)]) -> DictionaryRegistry {
    let mut reg = DictionaryRegistry::new();
    for (id, priority, json) in dicts {
        reg.register(DictionarySpec::new(*id, *priority, Arc::new(InlineJson::new(*json))));
    }
    reg
}

fn engine(dicts: &[(&str, i32, &str)], config: &Config) -> Engine {
    let outcome = registry(dicts).build_index();
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    let mut engine = Engine::new(config).unwrap();
    engine.install_index(outcome.index);
    engine
}

#[test]
fn test_shared_key_appears_once_at_higher_priority() {
    let e = engine(
        &[("x", 100, r#"{"ni": "你"}"#), ("y", 10, r#"{"ni": "你"}"#)],
        &Config::default(),
    );
    let got = e.lookup("ni");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].surface, "你");
    assert_eq!(got[0].weight, 10_000.0 + 100.0);
}

#[test]
fn test_short_segment_is_exact_only() {
    let e = engine(
        &[("base", 50, r#"{"ni": "你", "nihao": "你好"}"#)],
        &Config::default(),
    );
    let surfaces: Vec<String> = e.lookup("ni").into_iter().map(|c| c.surface).collect();
    assert_eq!(surfaces, vec!["你".to_string()]);
}

#[test]
fn test_three_letter_segment_expands_to_descendants() {
    let e = engine(
        &[("base", 50, r#"{"ni": "你", "nihao": "你好"}"#)],
        &Config::default(),
    );
    let got = e.lookup("nih");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].surface, "你好");
    // "nihao" is two chars deeper than "nih"
    assert_eq!(got[0].weight, 1_000.0 - 2.0 * 100.0 + 50.0);
}

#[test]
fn test_whitespace_buffer_segments_on_last_token() {
    let s = segment("ni hao", |_| false);
    assert_eq!(s.active, "hao");
    assert_eq!(s.preceding, "ni ");
}

#[test]
fn test_fuzzy_initial_pair() {
    let config = Config {
        fuzzy: vec!["s=sh".into()],
        ..Config::default()
    };
    let e = engine(&[("base", 10, r#"{"si": "四", "shi": "是"}"#)], &config);

    let variants: Vec<String> = e.rules().expand("si").into_iter().map(|v| v.text).collect();
    assert_eq!(variants, vec!["si".to_string(), "shi".to_string()]);

    let got = e.lookup("si");
    assert_eq!(got[0].surface, "四");
    assert_eq!(got[1].surface, "是");
    assert_eq!(got[0].weight - got[1].weight, config.fuzzy_penalty);
}

#[test]
fn test_filter_auto_commits_single_match() {
    let e = engine(
        &[(
            "base",
            10,
            r#"{"ping": [
                {"char": "苹", "en": "apple"},
                {"char": "平", "en": "average"},
                {"char": "瓶", "en": "bottle"}
            ]}"#,
        )],
        &Config::default(),
    );
    let mut ime = ImeEngine::new(e, 10);
    ime.type_text("ping");
    ime.process_key(KeyEvent::Shift);
    assert_eq!(ime.render().mode, InputMode::Filter);

    ime.process_key(KeyEvent::Char('a'));
    assert_eq!(ime.render().page.len(), 2);
    assert!(!ime.context().has_commit());

    ime.process_key(KeyEvent::Char('p'));
    assert_eq!(ime.take_commit(), "苹");
    assert_eq!(ime.render().mode, InputMode::Normal);
    assert!(!ime.session().is_active());
}

#[test]
fn test_punctuation_dictionary_segment() {
    let mut reg = registry(&[("base", 100, r#"{"hao": "好"}"#)]);
    reg.register(
        DictionarySpec::new("punct", 40, Arc::new(InlineJson::new(r#"{",": ["，", "、"]}"#)))
            .with_kind(DictionaryKind::Punctuation),
    );
    let mut e = Engine::new(&Config::default()).unwrap();
    e.install_index(reg.build_index().index);
    let mut ime = ImeEngine::new(e, 10);

    ime.type_text("hao");
    ime.process_key(KeyEvent::Space);
    ime.type_text(",");
    assert_eq!(ime.render().active_segment, ",");
    ime.process_key(KeyEvent::Number(2));
    assert_eq!(ime.take_commit(), "好、");
}
