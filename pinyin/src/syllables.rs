//! Pinyin syllable table and a greedy splitter.
//!
//! The composer uses the split to find word boundaries inside an unbroken
//! segment such as `"nihaoshijie"`.

use phf::phf_set;

/// Longest syllable in the table ("chuang", "shuang", "zhuang").
pub const MAX_SYLLABLE_LEN: usize = 6;

/// All standard pinyin syllables (without tone markers). `v` stands for `ü`.
pub static PINYIN_SYLLABLES: phf::Set<&'static str> = phf_set! {
    "a", "ai", "an", "ang", "ao", "ba", "bai", "ban", "bang", "bao", "bei", "ben", "beng", "bi",
    "bian", "biao", "bie", "bin", "bing", "bo", "bu", "ca", "cai", "can", "cang", "cao", "ce",
    "cen", "ceng", "cha", "chai", "chan", "chang", "chao", "che", "chen", "cheng", "chi",
    "chong", "chou", "chu", "chuai", "chuan", "chuang", "chui", "chun", "chuo", "ci", "cong",
    "cou", "cu", "cuan", "cui", "cun", "cuo", "da", "dai", "dan", "dang", "dao", "de", "dei",
    "deng", "di", "dia", "dian", "diao", "die", "ding", "diu", "dong", "dou", "du", "duan",
    "dui", "dun", "duo", "e", "ei", "en", "er", "fa", "fan", "fang", "fei", "fen", "feng", "fo",
    "fou", "fu", "ga", "gai", "gan", "gang", "gao", "ge", "gei", "gen", "geng", "gong", "gou",
    "gu", "gua", "guai", "guan", "guang", "gui", "gun", "guo", "ha", "hai", "han", "hang",
    "hao", "he", "hei", "hen", "heng", "hong", "hou", "hu", "hua", "huai", "huan", "huang",
    "hui", "hun", "huo", "ji", "jia", "jian", "jiang", "jiao", "jie", "jin", "jing", "jiong",
    "jiu", "ju", "juan", "jue", "jun", "ka", "kai", "kan", "kang", "kao", "ke", "ken", "keng",
    "kong", "kou", "ku", "kua", "kuai", "kuan", "kuang", "kui", "kun", "kuo", "la", "lai",
    "lan", "lang", "lao", "le", "lei", "leng", "li", "lia", "lian", "liang", "liao", "lie",
    "lin", "ling", "liu", "lo", "long", "lou", "lu", "luan", "lun", "luo", "lv", "lve", "ma",
    "mai", "man", "mang", "mao", "me", "mei", "men", "meng", "mi", "mian", "miao", "mie", "min",
    "ming", "miu", "mo", "mou", "mu", "na", "nai", "nan", "nang", "nao", "ne", "nei", "nen",
    "neng", "ng", "ni", "nian", "niang", "niao", "nie", "nin", "ning", "niu", "nong", "nou",
    "nu", "nuan", "nuo", "nv", "nve", "o", "ou", "pa", "pai", "pan", "pang", "pao", "pei",
    "pen", "peng", "pi", "pian", "piao", "pie", "pin", "ping", "po", "pou", "pu", "qi", "qia",
    "qian", "qiang", "qiao", "qie", "qin", "qing", "qiong", "qiu", "qu", "quan", "que", "qun",
    "ran", "rang", "rao", "re", "ren", "reng", "ri", "rong", "rou", "ru", "ruan", "rui", "run",
    "ruo", "sa", "sai", "san", "sang", "sao", "se", "sen", "seng", "sha", "shai", "shan",
    "shang", "shao", "she", "shei", "shen", "sheng", "shi", "shou", "shu", "shua", "shuai",
    "shuan", "shuang", "shui", "shun", "shuo", "si", "song", "sou", "su", "suan", "sui", "sun",
    "suo", "ta", "tai", "tan", "tang", "tao", "te", "teng", "ti", "tian", "tiao", "tie", "ting",
    "tong", "tou", "tu", "tuan", "tui", "tun", "tuo", "wa", "wai", "wan", "wang", "wei", "wen",
    "weng", "wo", "wu", "xi", "xia", "xian", "xiang", "xiao", "xie", "xin", "xing", "xiong",
    "xiu", "xu", "xuan", "xue", "xun", "ya", "yan", "yang", "yao", "ye", "yi", "yin", "ying",
    "yo", "yong", "you", "yu", "yuan", "yue", "yun", "za", "zai", "zan", "zang", "zao", "ze",
    "zei", "zen", "zeng", "zha", "zhai", "zhan", "zhang", "zhao", "zhe", "zhen", "zheng", "zhi",
    "zhong", "zhou", "zhu", "zhua", "zhuai", "zhuan", "zhuang", "zhui", "zhun", "zhuo", "zi",
    "zong", "zou", "zu", "zuan", "zui", "zun", "zuo",
};

pub fn is_syllable(s: &str) -> bool {
    PINYIN_SYLLABLES.contains(s)
}

/// Split `input` into syllables by greedy longest match.
///
/// Apostrophes force a boundary and are dropped. A character that starts no
/// syllable becomes a piece of its own, so the pieces always cover the input.
///
/// ```
/// use webime_pinyin::split_syllables;
///
/// assert_eq!(split_syllables("nihaoshijie"), vec!["ni", "hao", "shi", "jie"]);
/// assert_eq!(split_syllables("xi'an"), vec!["xi", "an"]);
/// ```
pub fn split_syllables(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    for part in input.split('\'').filter(|p| !p.is_empty()) {
        let chars: Vec<char> = part.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let longest = (1..=MAX_SYLLABLE_LEN.min(chars.len() - i))
                .rev()
                .map(|len| chars[i..i + len].iter().collect::<String>())
                .find(|cand| is_syllable(&cand.to_lowercase()));
            match longest {
                Some(s) => {
                    i += s.chars().count();
                    out.push(s);
                }
                None => {
                    out.push(chars[i].to_string());
                    i += 1;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        assert!(is_syllable("zhuang"));
        assert!(is_syllable("lve"));
        assert!(!is_syllable("zhx"));
        assert_eq!(PINYIN_SYLLABLES.iter().map(|s| s.len()).max(), Some(MAX_SYLLABLE_LEN));
    }

    #[test]
    fn greedy_split() {
        assert_eq!(split_syllables("zhongguo"), vec!["zhong", "guo"]);
        assert_eq!(split_syllables("tiananmen"), vec!["tian", "an", "men"]);
        assert_eq!(split_syllables("NiHao"), vec!["Ni", "Hao"]);
    }

    #[test]
    fn unknown_chars_become_single_pieces() {
        assert_eq!(split_syllables("ni1hao"), vec!["ni", "1", "hao"]);
        assert!(split_syllables("").is_empty());
        assert!(split_syllables("''").is_empty());
    }
}
