//! 领域门控：判断输入是否属于健康话题
//!
//! 纯函数、无状态，可并发调用。小写化后先按主题词表匹配，再试少量句式正则。
//! 词表按主题分组存放在规则表里，顺序与判定结果无关（任一命中即为 true）。

use std::sync::OnceLock;

use regex::Regex;

/// 领域门控拒绝时返回的固定文案（调用方可能按原文匹配，不要修改）
pub const REFUSAL_MESSAGE: &str = "I can only provide guidance on health and wellness topics. Please ask me about natural remedies, nutrition, fitness, or other health concerns.";

/// 一组主题词
#[derive(Debug)]
pub struct VocabularyGroup {
    pub theme: &'static str,
    pub terms: &'static [&'static str],
}

/// 健康领域词表
///
/// 每个词条是正则片段，只在词首匹配（`digest` 命中 digestion，`pain` 不命中 Spain）；
/// 容易出现在其它单词里的短词写成带 `\b` 的整词形式。
pub static HEALTH_VOCABULARY: &[VocabularyGroup] = &[
    VocabularyGroup {
        theme: "general",
        terms: &[
            "health", "wellness", "wellbeing", "well-being", "symptom", r"pain(s|ful)?\b",
            r"(aches?|achy)\b", "sick", "unwell", "illness", "disease", r"body\b", "tired",
            "fatigue", "exhaust", "fever", "sore", "swelling", "inflammation",
        ],
    },
    VocabularyGroup {
        theme: "digestive",
        terms: &[
            "stomach", "digest", "bloat", r"gas(sy)?\b", "nausea", "constipat", "diarrhea",
            "heartburn", "reflux", "indigestion", "bowel", r"guts?\b",
        ],
    },
    VocabularyGroup {
        theme: "head_neuro",
        terms: &["headache", "migraine", "dizz", "vertigo", "brain fog", "nerve"],
    },
    VocabularyGroup {
        theme: "skin_hair",
        terms: &[
            "skin", "acne", "eczema", "psoriasis", r"rash(es)?\b", r"itch(y|ing|es)?\b", "dandruff",
            "hair loss", "wrinkle",
        ],
    },
    VocabularyGroup {
        theme: "respiratory_immune",
        terms: &[
            "cough", r"colds?\b", r"flu\b", "congestion", "sinus", "sore throat", "asthma",
            "allerg", "immune", "breath",
        ],
    },
    VocabularyGroup {
        theme: "cardio_metabolic",
        terms: &[
            "blood pressure", "cholesterol", "heart", "diabet", "blood sugar", "weight",
            "metabolism", "circulation",
        ],
    },
    VocabularyGroup {
        theme: "infection",
        terms: &["infection", "virus", "bacteria", "fungal", "wound"],
    },
    VocabularyGroup {
        theme: "nutrition_lifestyle",
        terms: &[
            "nutrition", "diet", "vitamin", "mineral", "protein", "supplement", "fitness",
            "exercise", "workout", "hydrat", "sleep", "insomnia", "energy", "detox",
        ],
    },
    VocabularyGroup {
        theme: "mental_cognitive",
        terms: &["stress", "anxiety", "anxious", "depress", "mood", "focus", "memory", "panic", "burnout"],
    },
    VocabularyGroup {
        theme: "reproductive_hormonal",
        terms: &["menstrua", "period cramp", r"pms\b", "menopause", "hormone", "fertility", "pregnan", "libido", "thyroid"],
    },
    VocabularyGroup {
        theme: "muscle_joint",
        terms: &["joint", "arthritis", "muscle", "back pain", "cramp", "stiff"],
    },
    VocabularyGroup {
        theme: "treatment_intent",
        terms: &[
            "remedy", "remedies", "herbal", "herb", "natural cure", "treatment", "heal",
            "relief", "relieve", "medicin", "tea for", "essential oil", "tincture", "holistic",
        ],
    },
];

/// 句式正则（只在词表未命中时尝试）
const HEALTH_PATTERNS: &[&str] = &[
    r"\bfeel(ing)?\s+(bad|sick|unwell|ill|awful|terrible)\b",
    r"\btrouble\s+(sleep|digest|breath)",
    r"\bproblems?\s+with\s+(my\s+)?(stomach|head|back|joint)",
    r"\bneed\s+(help|a\s+remedy|remedy|treatment|something)\s+for\b",
];

/// 每个主题一条 `\b(?:t1|t2|...)` 正则
fn compiled_vocabulary() -> &'static [(&'static str, Regex)] {
    static VOCABULARY: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    VOCABULARY.get_or_init(|| {
        HEALTH_VOCABULARY
            .iter()
            .filter_map(|g| {
                Regex::new(&format!(r"\b(?:{})", g.terms.join("|")))
                    .ok()
                    .map(|re| (g.theme, re))
            })
            .collect()
    })
}

fn compiled_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        HEALTH_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// 健康话题分类器
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthTopicClassifier;

impl HealthTopicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 输入是否属于健康领域
    pub fn classify(&self, text: &str) -> bool {
        self.matched_theme(text).is_some()
    }

    /// 命中的主题（日志用）：词表主题名，句式命中时为 "phrase"
    pub fn matched_theme(&self, text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        if lower.trim().is_empty() {
            return None;
        }
        if let Some((theme, _)) = compiled_vocabulary().iter().find(|(_, re)| re.is_match(&lower)) {
            return Some(theme);
        }
        compiled_patterns()
            .iter()
            .any(|re| re.is_match(&lower))
            .then_some("phrase")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headache_and_tired_is_health() {
        let classifier = HealthTopicClassifier::new();
        assert!(classifier.classify("I have a headache and feel tired"));
    }

    #[test]
    fn test_weather_is_not_health() {
        let classifier = HealthTopicClassifier::new();
        assert!(!classifier.classify("what's the weather tomorrow"));
        assert!(!classifier.classify("recommend a good movie"));
        assert!(!classifier.classify("   "));
    }

    #[test]
    fn test_phrase_patterns() {
        let classifier = HealthTopicClassifier::new();
        assert_eq!(classifier.matched_theme("I feel bad today"), Some("phrase"));
        assert_eq!(classifier.matched_theme("I have trouble sleeping"), Some("nutrition_lifestyle"));
        assert_eq!(classifier.matched_theme("problems with my back lately"), Some("phrase"));
        assert_eq!(classifier.matched_theme("I need something for this"), Some("phrase"));
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = HealthTopicClassifier::new();
        assert!(classifier.classify("BLOATING after dinner"));
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = HealthTopicClassifier::new();
        for input in ["stomach ache", "what's the weather tomorrow", "feeling unwell"] {
            assert_eq!(classifier.classify(input), classifier.classify(input));
        }
    }

    #[test]
    fn test_short_terms_do_not_match_inside_other_words() {
        let classifier = HealthTopicClassifier::new();
        for input in [
            "we reached the summit",
            "planning a trip to Spain",
            "clean the gutter this weekend",
            "can anybody help",
            "the server crashed again",
            "switch the kitchen lights",
            "what influenced the Renaissance",
        ] {
            assert!(!classifier.classify(input), "{input}");
        }
    }

    #[test]
    fn test_short_terms_match_as_words() {
        let classifier = HealthTopicClassifier::new();
        assert_eq!(classifier.matched_theme("sharp pain in my side"), Some("general"));
        assert_eq!(classifier.matched_theme("my knees ache"), Some("general"));
        assert_eq!(classifier.matched_theme("gut feels off"), Some("digestive"));
        assert_eq!(classifier.matched_theme("itchy red patches"), Some("skin_hair"));
        assert_eq!(classifier.matched_theme("caught the flu"), Some("respiratory_immune"));
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(compiled_patterns().len(), HEALTH_PATTERNS.len());
        assert_eq!(compiled_vocabulary().len(), HEALTH_VOCABULARY.len());
    }
}
