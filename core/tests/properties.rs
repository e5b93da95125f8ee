// core/tests/properties.rs
//
// Properties that must hold for any input:
// - segmentation reconstructs the buffer
// - fuzzy closure is idempotent
// - ranking is deterministic and free of duplicate surfaces
// - higher-priority dictionaries never rank below lower ones

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use webime_core::{
    segment, Config, DictionaryRegistry, DictionarySpec, Engine, FuzzyRuleSet, InlineJson,
};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next() as usize) % items.len()]
    }
}

const ALPHABET: &[char] = &['n', 'i', 'H', 'a', 'o', '\'', ' ', '\t', ',', '。', '你', '!', '<'];

#[test]
fn test_segmentation_round_trip_random_buffers() {
    let mut rng = Lcg(7);
    let punct = |c: char| matches!(c, ',' | '<' | '。');
    for _ in 0..5_000 {
        let len = (rng.next() % 24) as usize;
        let buffer: String = (0..len).map(|_| *rng.pick(ALPHABET)).collect();
        let s = segment(&buffer, punct);
        assert_eq!(format!("{}{}", s.preceding, s.active), buffer);
        assert_eq!(segment(&buffer, punct), s, "not pure for {:?}", buffer);
    }
}

#[test]
fn test_fuzzy_closure_applied_twice_is_unchanged() {
    let rules = FuzzyRuleSet::from_specs(
        &["z=zh", "c=ch", "s=sh", "l=n", "f=h", "final:an=ang", "final:en=eng", "final:in=ing"],
        64,
    )
    .unwrap();
    let seeds = ["zan", "shang", "lin", "fen", "hua", "ceng", "n", "zhuang", "x"];
    for seed in seeds {
        let once: BTreeSet<String> = rules.expand(seed).into_iter().map(|v| v.text).collect();
        let twice: BTreeSet<String> = once
            .iter()
            .flat_map(|v| rules.expand(v))
            .map(|v| v.text)
            .collect();
        assert_eq!(once, twice, "closure of {}", seed);
        assert!(once.contains(seed));
    }
}

fn sample_registry() -> DictionaryRegistry {
    let mut reg = DictionaryRegistry::new();
    reg.register(DictionarySpec::new(
        "common",
        100,
        Arc::new(InlineJson::new(
            r#"{
                "shi": ["是", "时", "十"],
                "shijian": {"char": "时间", "en": "time"},
                "shijie": {"char": "世界", "en": "world"},
                "si": ["四", "死"],
                "sijian": "四间"
            }"#,
        )),
    ));
    reg.register(DictionarySpec::new(
        "extra",
        10,
        Arc::new(InlineJson::new(
            r#"{
                "shi": ["是", "市"],
                "shijie": "视界",
                "sijie": "四街"
            }"#,
        )),
    ));
    reg
}

#[test]
fn test_ranking_is_deterministic_across_rebuilds() {
    let config = Config {
        fuzzy: vec!["s=sh".into()],
        ..Config::default()
    };
    let mut results = Vec::new();
    for _ in 0..3 {
        let mut e = Engine::new(&config).unwrap();
        e.install_index(sample_registry().build_index().index);
        for seg in ["shi", "sij", "shijie", "si"] {
            let first = e.lookup(seg);
            e.clear_cache();
            assert_eq!(e.lookup(seg), first, "segment {}", seg);
            results.push(first);
        }
    }
    assert_eq!(results[0..4], results[4..8]);
    assert_eq!(results[4..8], results[8..12]);
}

#[test]
fn test_no_duplicate_surfaces() {
    let config = Config {
        fuzzy: vec!["s=sh".into()],
        ..Config::default()
    };
    let mut e = Engine::new(&config).unwrap();
    e.install_index(sample_registry().build_index().index);
    for seg in ["shi", "si", "sij", "shij"] {
        let got = e.lookup(seg);
        let unique: HashSet<&str> = got.iter().map(|c| c.surface.as_str()).collect();
        assert_eq!(unique.len(), got.len(), "segment {}", seg);
    }
}

#[test]
fn test_higher_priority_dictionary_ranks_first() {
    let mut reg = DictionaryRegistry::new();
    reg.register(DictionarySpec::new("low", 10, Arc::new(InlineJson::new(r#"{"ma": "马"}"#))));
    reg.register(DictionarySpec::new("high", 90, Arc::new(InlineJson::new(r#"{"ma": "妈"}"#))));
    let mut e = Engine::new(&Config::default()).unwrap();
    e.install_index(reg.build_index().index);
    let got = e.lookup("ma");
    assert_eq!(got[0].surface, "妈");
    assert!(got[0].weight > got[1].weight);

    // swapping priorities swaps the order
    reg.set_priority("low", 95);
    e.install_index(reg.build_index().index);
    assert_eq!(e.lookup("ma")[0].surface, "马");
}
