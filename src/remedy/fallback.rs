//! 确定性兜底生成器
//!
//! 纯函数、无 I/O：小写化 concern 后按顺序匹配规则表，第一条命中的规则胜出（顺序即唯一的优先级），
//! 都不命中时返回「综合养护」模板。每个模板都是完整填充的静态数据，按构造即满足输出契约。
//! 规则之间的关键词可以重叠（如 stomach 同时属于消化类与通用健康词），调整顺序属于可观察的行为变更。

use serde_json::{Map, Value};

use crate::remedy::{Confidence, GeneratedRemedy, NaturalRemedy, Recommendation, SymptomAnalysisResult};

/// 兜底症状分析的固定置信度
pub const FALLBACK_CONFIDENCE: f64 = 75.0;

/// 规则谓词
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// 包含任一关键词
    Any(&'static [&'static str]),
    /// 每一组都至少包含一个关键词
    AllOf(&'static [&'static [&'static str]]),
}

impl Matcher {
    pub fn matches(&self, concern_lower: &str) -> bool {
        match self {
            Matcher::Any(words) => words.iter().any(|w| concern_lower.contains(w)),
            Matcher::AllOf(groups) => groups
                .iter()
                .all(|words| words.iter().any(|w| concern_lower.contains(w))),
        }
    }
}

/// 一条兜底规则：谓词 + 模板
#[derive(Debug)]
pub struct FallbackRule<T: 'static> {
    pub name: &'static str,
    pub matcher: Matcher,
    pub template: &'static T,
}

/// 按顺序返回第一条命中的规则
pub fn select_rule<'a, T>(rules: &'a [FallbackRule<T>], concern: &str) -> Option<&'a FallbackRule<T>> {
    let lower = concern.to_lowercase();
    rules.iter().find(|r| r.matcher.matches(&lower))
}

const HEADACHE: &[&str] = &["headache", "migraine"];
const FATIGUE: &[&str] = &["tired", "fatigue", "exhaust", "low energy", "no energy"];
const DIGESTIVE: &[&str] = &["bloat", "gas", "digest", "stomach", "nausea", "constipat"];
const STRESS: &[&str] = &["stress", "anxiety", "anxious", "overwhelm", "panic"];
const SLEEP: &[&str] = &["sleep", "insomnia"];
const RESPIRATORY: &[&str] = &["cold", "flu", "cough", "sore throat", "congestion", "sinus"];
const PAIN: &[&str] = &["joint", "arthritis", "inflammation", "muscle", "back pain"];
const SKIN: &[&str] = &["skin", "acne", "eczema", "rash", "itch"];

const HEADACHE_AND_FATIGUE: Matcher = Matcher::AllOf(&[HEADACHE, FATIGUE]);

// ---------------------------------------------------------------------------
// 疗法模板
// ---------------------------------------------------------------------------

/// 疗法模板（静态数据）
#[derive(Debug)]
pub struct RemedyTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub ingredients: &'static [&'static str],
    pub benefits: &'static [&'static str],
    pub instructions: &'static str,
    pub form: &'static str,
    pub dosage: &'static str,
    pub duration: &'static str,
    pub safety: &'static str,
    pub scientific_basis: &'static str,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RemedyTemplate {
    pub fn build(&self) -> GeneratedRemedy {
        GeneratedRemedy {
            name: self.name.to_string(),
            description: Some(Some(self.description.to_string())),
            ingredients: strings(self.ingredients),
            benefits: Some(Some(strings(self.benefits))),
            instructions: self.instructions.to_string(),
            form: Some(Some(self.form.to_string())),
            dosage: Some(Some(self.dosage.to_string())),
            duration: Some(Some(self.duration.to_string())),
            safety: Some(Some(self.safety.to_string())),
            scientific_basis: Some(Some(self.scientific_basis.to_string())),
            ai_source: None,
            database_remedies: None,
            extra: Map::new(),
        }
    }
}

static HEADACHE_FATIGUE_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Energizing Headache Relief Tea",
    description: "A warming ginger and peppermint infusion with rosemary to ease tension headaches while gently lifting energy.",
    ingredients: &[
        "1 inch fresh ginger root, sliced",
        "1 tsp dried peppermint leaves",
        "1/2 tsp dried rosemary",
        "1 tsp raw honey",
        "1 slice fresh lemon",
    ],
    benefits: &[
        "Eases tension-type head pain",
        "Supports circulation and alertness",
        "Encourages hydration",
    ],
    instructions: "Simmer the ginger in 2 cups of water for 10 minutes. Remove from heat, add peppermint and rosemary, cover and steep for 5 minutes. Strain, stir in honey and lemon, and sip slowly while resting in a quiet, dim room.",
    form: "tea",
    dosage: "1 cup up to 3 times daily",
    duration: "Use as needed for up to 1 week",
    safety: "Avoid rosemary in large amounts during pregnancy. Seek medical care for sudden, severe or persistent headaches.",
    scientific_basis: "Ginger has shown effects comparable to common analgesics in migraine studies; peppermint and rosemary support circulation and alertness.",
};

static HEADACHE_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Peppermint Lavender Headache Relief",
    description: "A calming tea and temple rub combination for tension headaches.",
    ingredients: &[
        "1 tsp dried peppermint leaves",
        "1 tsp dried lavender buds",
        "2 drops peppermint essential oil",
        "1 tsp carrier oil (coconut or almond)",
    ],
    benefits: &["Relaxes tense muscles", "Cooling, soothing sensation", "Promotes calm"],
    instructions: "Steep peppermint and lavender in 1 cup of hot water for 7 minutes, strain and drink. Mix the essential oil with the carrier oil and massage a small amount onto the temples and back of the neck, avoiding the eyes.",
    form: "tea and topical rub",
    dosage: "1 cup of tea up to 3 times daily; apply rub as needed",
    duration: "As needed",
    safety: "Do not ingest essential oils. Patch-test the rub first. Seek care for headaches with fever, stiff neck or vision changes.",
    scientific_basis: "Topical peppermint oil has been shown in controlled trials to reduce tension headache intensity.",
};

static DIGESTIVE_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Ginger Fennel Digestive Tea",
    description: "A carminative blend to relieve bloating, gas and sluggish digestion after meals.",
    ingredients: &[
        "1 tsp fennel seeds, lightly crushed",
        "1 inch fresh ginger root, sliced",
        "1 tsp dried peppermint leaves",
    ],
    benefits: &["Reduces bloating and gas", "Soothes the stomach", "Supports healthy digestion"],
    instructions: "Add fennel and ginger to 1.5 cups of boiling water and simmer for 5 minutes. Remove from heat, add peppermint, cover and steep for 5 minutes. Strain and drink warm after meals.",
    form: "tea",
    dosage: "1 cup after meals, up to 3 times daily",
    duration: "Up to 2 weeks",
    safety: "Skip peppermint if you have acid reflux. Consult a doctor if symptoms persist or include severe pain.",
    scientific_basis: "Fennel and ginger have carminative and prokinetic effects; peppermint relaxes smooth muscle of the gut.",
};

static STRESS_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Calming Chamomile Lemon Balm Tea",
    description: "A gentle nervine blend to take the edge off stress and anxious feelings.",
    ingredients: &[
        "1 tbsp dried chamomile flowers",
        "1 tsp dried lemon balm",
        "1/2 tsp dried lavender buds",
        "1 tsp raw honey (optional)",
    ],
    benefits: &["Promotes relaxation", "Eases nervous tension", "Supports a steady mood"],
    instructions: "Pour 1 cup of just-boiled water over the herbs, cover and steep for 10 minutes. Strain, add honey if desired, and drink slowly while taking a few deep breaths.",
    form: "tea",
    dosage: "1 cup 2-3 times daily",
    duration: "Up to 4 weeks",
    safety: "Avoid chamomile if allergic to ragweed. May add to the effect of sedative medications.",
    scientific_basis: "Chamomile extract has shown modest benefit in generalized anxiety trials; lemon balm has calming effects in small studies.",
};

static SLEEP_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Valerian Passionflower Sleep Blend",
    description: "An evening infusion to help you wind down and fall asleep more easily.",
    ingredients: &[
        "1 tsp dried valerian root",
        "1 tsp dried passionflower",
        "1 tsp dried chamomile flowers",
    ],
    benefits: &["Shortens time to fall asleep", "Promotes restful sleep", "Quiets a busy mind"],
    instructions: "Simmer valerian root in 1.5 cups of water for 10 minutes. Remove from heat, add passionflower and chamomile, cover and steep for 5 minutes. Strain and drink 30-60 minutes before bed.",
    form: "tea",
    dosage: "1 cup in the evening",
    duration: "2-4 weeks, then take a week off",
    safety: "Do not combine with alcohol or sleep medication. Avoid during pregnancy. May cause morning grogginess.",
    scientific_basis: "Valerian and passionflower modulate GABA activity; several trials report improved subjective sleep quality.",
};

static FATIGUE_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Adaptogenic Energy Tonic",
    description: "A nourishing morning tonic to support steady energy without a caffeine crash.",
    ingredients: &[
        "1/2 tsp ashwagandha powder",
        "1 cup warm milk or plant milk",
        "1/4 tsp ground cinnamon",
        "1 tsp raw honey",
    ],
    benefits: &["Supports steady energy", "Helps the body adapt to stress", "Warming and nourishing"],
    instructions: "Warm the milk gently without boiling. Whisk in ashwagandha and cinnamon until smooth, then stir in honey. Drink in the morning alongside a balanced breakfast.",
    form: "tonic drink",
    dosage: "1 cup daily",
    duration: "4-8 weeks",
    safety: "Avoid ashwagandha during pregnancy or with thyroid medication unless approved by a doctor. Persistent fatigue should be medically evaluated.",
    scientific_basis: "Ashwagandha has shown reductions in perceived stress and fatigue in randomized trials.",
};

static RESPIRATORY_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Honey Ginger Lemon Immune Tonic",
    description: "A soothing warm drink for colds, coughs and sore throats.",
    ingredients: &[
        "1 inch fresh ginger root, grated",
        "Juice of 1/2 lemon",
        "1 tbsp raw honey",
        "1 pinch ground cinnamon",
    ],
    benefits: &["Soothes sore throat", "Calms coughing", "Supports immune response"],
    instructions: "Steep the grated ginger in 1 cup of hot water for 10 minutes. Strain, let cool slightly, then stir in lemon juice, honey and cinnamon. Sip slowly while warm.",
    form: "warm drink",
    dosage: "1 cup 3-4 times daily",
    duration: "Until symptoms resolve, up to 10 days",
    safety: "Never give honey to children under 1 year. Seek care for high fever, shortness of breath or symptoms lasting more than 10 days.",
    scientific_basis: "Honey has been shown to reduce cough frequency in upper respiratory infections; ginger has anti-inflammatory activity.",
};

static PAIN_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Turmeric Golden Milk",
    description: "An anti-inflammatory warm drink for achy joints and muscles.",
    ingredients: &[
        "1 tsp ground turmeric",
        "1 pinch black pepper",
        "1/2 tsp ground ginger",
        "1 cup milk or plant milk",
        "1 tsp raw honey",
    ],
    benefits: &["Eases joint stiffness", "Supports a healthy inflammatory response", "Aids recovery"],
    instructions: "Warm the milk in a small pan. Whisk in turmeric, ginger and black pepper and simmer gently for 5 minutes. Remove from heat, stir in honey and drink warm.",
    form: "warm drink",
    dosage: "1 cup daily",
    duration: "4-8 weeks",
    safety: "Turmeric may interact with blood thinners and is not advised with gallbladder problems. Seek care for swelling, redness or injury-related pain.",
    scientific_basis: "Curcumin from turmeric has shown benefit comparable to NSAIDs for knee osteoarthritis pain; piperine improves absorption.",
};

static SKIN_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "Soothing Aloe Calendula Skin Gel",
    description: "A cooling topical gel for irritated, itchy or blemish-prone skin.",
    ingredients: &[
        "2 tbsp pure aloe vera gel",
        "1 tsp calendula-infused oil",
        "2 drops tea tree essential oil",
    ],
    benefits: &["Calms redness and itching", "Supports skin healing", "Gently antimicrobial"],
    instructions: "Mix aloe gel and calendula oil in a clean bowl, then stir in the tea tree oil. Apply a thin layer to clean skin twice daily. Store in the refrigerator for up to 1 week.",
    form: "topical gel",
    dosage: "Apply twice daily",
    duration: "Up to 2 weeks",
    safety: "Patch-test on a small area first. Do not apply to broken or infected skin. Stop if irritation worsens.",
    scientific_basis: "Aloe vera and calendula support wound healing; tea tree oil has shown benefit for mild acne in controlled trials.",
};

/// 都不命中时的默认模板
pub static GENERAL_WELLNESS_REMEDY: RemedyTemplate = RemedyTemplate {
    name: "General Wellness Herbal Tonic",
    description: "A balanced daily tonic to support overall health and resilience.",
    ingredients: &[
        "1 tsp dried nettle leaf",
        "1 inch fresh ginger root, sliced",
        "1 tsp dried lemon balm",
        "1 tsp raw honey",
    ],
    benefits: &["Supports general vitality", "Provides minerals", "Gently calming"],
    instructions: "Simmer the ginger in 2 cups of water for 5 minutes. Remove from heat, add nettle and lemon balm, cover and steep for 10 minutes. Strain, add honey and drink warm or cool.",
    form: "tea",
    dosage: "1-2 cups daily",
    duration: "Ongoing, with a 1 week break each month",
    safety: "Consult a healthcare provider before use if pregnant, nursing, or taking medication.",
    scientific_basis: "Nettle is rich in minerals; ginger and lemon balm have documented digestive and calming properties.",
};

/// 疗法兜底规则表（顺序即优先级）
pub static REMEDY_RULES: &[FallbackRule<RemedyTemplate>] = &[
    FallbackRule { name: "headache_fatigue", matcher: HEADACHE_AND_FATIGUE, template: &HEADACHE_FATIGUE_REMEDY },
    FallbackRule { name: "headache", matcher: Matcher::Any(HEADACHE), template: &HEADACHE_REMEDY },
    FallbackRule { name: "digestive", matcher: Matcher::Any(DIGESTIVE), template: &DIGESTIVE_REMEDY },
    FallbackRule { name: "stress", matcher: Matcher::Any(STRESS), template: &STRESS_REMEDY },
    FallbackRule { name: "sleep", matcher: Matcher::Any(SLEEP), template: &SLEEP_REMEDY },
    FallbackRule { name: "fatigue", matcher: Matcher::Any(FATIGUE), template: &FATIGUE_REMEDY },
    FallbackRule { name: "respiratory", matcher: Matcher::Any(RESPIRATORY), template: &RESPIRATORY_REMEDY },
    FallbackRule { name: "pain", matcher: Matcher::Any(PAIN), template: &PAIN_REMEDY },
    FallbackRule { name: "skin", matcher: Matcher::Any(SKIN), template: &SKIN_REMEDY },
];

/// 疗法兜底：命中规则的模板或默认模板；有偏好时在 description 末尾注明
pub fn remedy_fallback(concern: &str, preferences: Option<&str>) -> GeneratedRemedy {
    let template = select_rule(REMEDY_RULES, concern)
        .map(|r| r.template)
        .unwrap_or(&GENERAL_WELLNESS_REMEDY);
    let mut remedy = template.build();
    if let Some(prefs) = preferences.map(str::trim).filter(|p| !p.is_empty()) {
        let description = remedy
            .description
            .get_or_insert(None)
            .get_or_insert_with(String::new);
        description.push_str(&format!(
            " Preferences noted: {prefs}. Swap any ingredient that conflicts with them."
        ));
    }
    remedy
}

// ---------------------------------------------------------------------------
// 症状分析模板
// ---------------------------------------------------------------------------

/// (suggestion, how_to, why_it_works, confidence)
type RecommendationRow = (&'static str, &'static str, &'static str, &'static str);
/// (remedy_name, dosage, preparation, scientific_basis)
type NaturalRemedyRow = (&'static str, &'static str, &'static str, &'static str);

/// 症状分析模板（静态数据）
#[derive(Debug)]
pub struct SymptomTemplate {
    pub primary_concern: &'static str,
    pub understanding: &'static str,
    pub likely_conditions: &'static [&'static str],
    pub root_causes: &'static [&'static str],
    pub science_explanation: &'static str,
    pub recommendations: &'static [RecommendationRow],
    pub natural_remedies: &'static [NaturalRemedyRow],
    /// 疗程阶段：(键, 内容)
    pub healing_protocol: &'static [(&'static str, &'static str)],
    pub prevention_strategy: &'static str,
    pub warning_signs: &'static str,
}

impl SymptomTemplate {
    pub fn build(&self) -> SymptomAnalysisResult {
        SymptomAnalysisResult {
            primary_concern: self.primary_concern.to_string(),
            understanding: Some(Some(self.understanding.to_string())),
            likely_conditions: strings(self.likely_conditions),
            root_causes: strings(self.root_causes),
            science_explanation: Some(Some(self.science_explanation.to_string())),
            recommendations: self
                .recommendations
                .iter()
                .map(|(suggestion, how_to, why, confidence)| Recommendation {
                    suggestion: suggestion.to_string(),
                    how_to: how_to.to_string(),
                    why_it_works: Some(Some(why.to_string())),
                    confidence: Confidence::label(confidence),
                })
                .collect(),
            natural_remedies: self
                .natural_remedies
                .iter()
                .map(|(name, dosage, preparation, basis)| NaturalRemedy {
                    remedy_name: name.to_string(),
                    dosage: dosage.to_string(),
                    preparation: preparation.to_string(),
                    scientific_basis: Some(Some(basis.to_string())),
                })
                .collect(),
            healing_protocol: Some(Some(
                self.healing_protocol
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect(),
            )),
            prevention_strategy: Some(Some(self.prevention_strategy.to_string())),
            warning_signs: Some(Some(self.warning_signs.to_string())),
            confidence_level: FALLBACK_CONFIDENCE,
            ai_source: String::new(),
            database_remedies: None,
            extra: Map::new(),
        }
    }
}

static HEADACHE_FATIGUE_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Headache with fatigue",
    understanding: "Head pain together with tiredness often points to dehydration, poor sleep, skipped meals or accumulated stress rather than a single cause.",
    likely_conditions: &["Tension-type headache", "Dehydration", "Sleep deprivation", "Eye strain"],
    root_causes: &["Insufficient fluid intake", "Irregular or short sleep", "Prolonged screen time", "Low blood sugar from skipped meals"],
    science_explanation: "Mild dehydration reduces blood volume and can trigger head pain, while sleep debt lowers pain thresholds and drains energy; both reinforce each other.",
    recommendations: &[
        ("Rehydrate steadily", "Drink 2 large glasses of water now, then a glass every hour for the rest of the day.", "Restoring fluid volume often relieves dehydration headaches within an hour.", "high"),
        ("Take a screen and rest break", "Spend 20 minutes away from screens in a dim, quiet room.", "Reduces eye strain and muscle tension that feed tension headaches.", "medium"),
        ("Eat a balanced snack", "Have protein with complex carbohydrates, e.g. nuts with fruit.", "Stabilizes blood sugar, which supports energy and reduces headache triggers.", "medium"),
    ],
    natural_remedies: &[
        ("Ginger peppermint tea", "1 cup up to 3 times daily", "Steep fresh ginger and peppermint in hot water for 10 minutes.", "Ginger has shown effects comparable to common analgesics in migraine studies."),
        ("Peppermint oil temple rub", "Apply as needed", "Dilute 2 drops in 1 tsp carrier oil and massage onto temples.", "Topical peppermint oil reduced tension headache intensity in controlled trials."),
    ],
    healing_protocol: &[
        ("immediate", "Hydrate, rest your eyes and eat a balanced snack."),
        ("short_term", "Keep consistent sleep and meal times for the next week."),
        ("long_term", "Track headaches and energy levels to identify personal triggers."),
    ],
    prevention_strategy: "Keep a water bottle nearby, protect 7-9 hours of sleep, take regular screen breaks and avoid skipping meals.",
    warning_signs: "Seek urgent care for a sudden severe headache, headache with fever or stiff neck, confusion, weakness, or vision changes.",
};

static HEADACHE_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Headache",
    understanding: "Most recurring headaches are tension-type or migraine and are influenced by stress, posture, sleep and hydration.",
    likely_conditions: &["Tension-type headache", "Migraine", "Dehydration headache"],
    root_causes: &["Muscle tension in neck and shoulders", "Stress", "Dehydration", "Irregular sleep"],
    science_explanation: "Tight pericranial muscles and sensitized pain pathways drive tension headaches; migraines involve neurovascular changes often set off by triggers.",
    recommendations: &[
        ("Hydrate", "Drink a large glass of water and keep sipping through the day.", "Dehydration is a common and easily corrected trigger.", "high"),
        ("Release neck tension", "Do gentle neck stretches and apply warmth to the shoulders for 10 minutes.", "Relaxing tight muscles reduces referred head pain.", "medium"),
    ],
    natural_remedies: &[
        ("Peppermint oil", "Apply diluted to temples as needed", "Mix 2 drops with 1 tsp carrier oil.", "Shown to reduce tension headache intensity in trials."),
        ("Feverfew", "As directed on a standardized product", "Take daily as a preventive.", "Some trials show fewer migraine days with regular use."),
    ],
    healing_protocol: &[
        ("immediate", "Hydrate, stretch and rest in a dim room."),
        ("short_term", "Keep a headache diary for two weeks."),
        ("long_term", "Address recurring triggers such as posture and sleep."),
    ],
    prevention_strategy: "Regular sleep, hydration, posture breaks and stress management reduce headache frequency.",
    warning_signs: "Seek urgent care for the worst headache of your life, headache after head injury, or with fever, stiff neck, confusion or weakness.",
};

static DIGESTIVE_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Digestive discomfort",
    understanding: "Bloating and stomach discomfort after eating usually reflect how and what you eat, gut motility, and gas production by gut bacteria.",
    likely_conditions: &["Functional bloating", "Indigestion (dyspepsia)", "Food intolerance", "Irritable bowel syndrome"],
    root_causes: &["Eating quickly or swallowing air", "Fermentable foods (FODMAPs)", "Low fiber or sudden fiber increase", "Stress affecting the gut"],
    science_explanation: "Gut bacteria ferment some carbohydrates into gas, and sensitive gut nerves can make normal amounts of gas feel uncomfortable.",
    recommendations: &[
        ("Slow down at meals", "Chew thoroughly, eat smaller portions and avoid talking while eating.", "Reduces swallowed air and eases the digestive load.", "high"),
        ("Walk after eating", "Take a gentle 10-15 minute walk after meals.", "Movement stimulates gut motility and helps gas pass.", "medium"),
        ("Track trigger foods", "Note meals and symptoms for two weeks.", "Identifies intolerances such as lactose or specific FODMAPs.", "medium"),
    ],
    natural_remedies: &[
        ("Fennel ginger tea", "1 cup after meals", "Simmer crushed fennel seeds and ginger for 5 minutes.", "Both have carminative and prokinetic effects."),
        ("Peppermint oil capsules", "As directed on an enteric-coated product", "Take before meals.", "Shown to relieve IBS-related bloating in trials."),
    ],
    healing_protocol: &[
        ("immediate", "Sip warm fennel or ginger tea and take a short walk."),
        ("short_term", "Eat smaller meals and reduce carbonated drinks for two weeks."),
        ("long_term", "Build fiber gradually and identify personal trigger foods."),
    ],
    prevention_strategy: "Eat slowly, keep meals moderate, stay active, and introduce fiber gradually.",
    warning_signs: "See a doctor for unintended weight loss, blood in stool, persistent vomiting, severe abdominal pain, or difficulty swallowing.",
};

static STRESS_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Stress and anxiety",
    understanding: "Ongoing stress keeps the body's alarm system switched on, which can show up as worry, tension, poor sleep and fatigue.",
    likely_conditions: &["Acute stress response", "Generalized anxiety", "Burnout"],
    root_causes: &["Sustained workload or life pressure", "Poor sleep", "Limited recovery time", "Caffeine or stimulant use"],
    science_explanation: "Chronic activation of the HPA axis raises cortisol and sympathetic tone, affecting mood, sleep and digestion.",
    recommendations: &[
        ("Practice slow breathing", "Breathe in for 4 seconds and out for 6 seconds, for 5 minutes twice daily.", "Slow exhalation activates the parasympathetic nervous system.", "high"),
        ("Move daily", "Take a 20-30 minute brisk walk outdoors.", "Exercise lowers stress hormones and improves mood.", "high"),
    ],
    natural_remedies: &[
        ("Chamomile tea", "1 cup 2-3 times daily", "Steep 1 tbsp dried flowers for 10 minutes.", "Chamomile extract eased generalized anxiety symptoms in trials."),
        ("Lemon balm", "1 cup tea or as directed", "Steep 1 tsp dried leaf for 10 minutes.", "Small studies show calming and mood benefits."),
    ],
    healing_protocol: &[
        ("immediate", "Pause for 5 minutes of slow breathing."),
        ("short_term", "Schedule daily movement and a wind-down routine."),
        ("long_term", "Review workload and boundaries; consider counseling."),
    ],
    prevention_strategy: "Protect sleep, limit caffeine, keep regular exercise and build in daily recovery time.",
    warning_signs: "Seek help promptly for panic attacks that do not settle, thoughts of self-harm, or anxiety that stops you from functioning.",
};

static SLEEP_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Sleep difficulty",
    understanding: "Trouble falling or staying asleep is commonly driven by irregular schedules, evening light exposure, stress and stimulants.",
    likely_conditions: &["Insomnia", "Circadian rhythm disruption", "Stress-related sleep disturbance"],
    root_causes: &["Irregular sleep schedule", "Screen light at night", "Late caffeine", "Racing thoughts"],
    science_explanation: "Evening light suppresses melatonin, and an aroused nervous system delays sleep onset.",
    recommendations: &[
        ("Keep a fixed wake time", "Get up at the same time every day, including weekends.", "Anchors the circadian rhythm and builds sleep pressure.", "high"),
        ("Dim screens before bed", "Stop screens 60 minutes before bed and dim the lights.", "Protects natural melatonin release.", "medium"),
    ],
    natural_remedies: &[
        ("Valerian root tea", "1 cup in the evening", "Simmer 1 tsp root for 10 minutes.", "Trials report improved subjective sleep quality."),
        ("Magnesium glycinate", "200-400 mg in the evening", "Take with water after dinner.", "Magnesium supports relaxation and sleep regulation."),
    ],
    healing_protocol: &[
        ("immediate", "Set a consistent wake time starting tomorrow."),
        ("short_term", "Build a 30 minute wind-down routine for two weeks."),
        ("long_term", "Consider CBT-I if sleep problems persist."),
    ],
    prevention_strategy: "Regular schedule, morning daylight, no caffeine after noon, and a cool dark bedroom.",
    warning_signs: "See a doctor for loud snoring with breathing pauses, severe daytime sleepiness, or insomnia lasting more than 3 months.",
};

static FATIGUE_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Fatigue",
    understanding: "Persistent tiredness usually has several contributors, such as sleep quality, nutrition, activity levels and stress.",
    likely_conditions: &["Lifestyle-related fatigue", "Sleep insufficiency", "Iron deficiency", "Stress-related exhaustion"],
    root_causes: &["Short or poor quality sleep", "Low iron or B12 intake", "Sedentary routine", "Chronic stress"],
    science_explanation: "Energy production depends on oxygen delivery and micronutrients; deficits or poor recovery reduce cellular energy output.",
    recommendations: &[
        ("Prioritize sleep", "Aim for 7-9 hours with consistent bed and wake times.", "Sleep is the main driver of daytime energy.", "high"),
        ("Add light activity", "Start with a 15 minute daily walk.", "Regular movement improves energy and mitochondrial function.", "medium"),
    ],
    natural_remedies: &[
        ("Ashwagandha", "300-600 mg daily", "Take standardized extract with food.", "Reduced perceived stress and fatigue in randomized trials."),
        ("Iron-rich foods", "Daily with meals", "Combine leafy greens or legumes with vitamin C.", "Corrects a common cause of fatigue."),
    ],
    healing_protocol: &[
        ("immediate", "Hydrate and take a short daylight walk."),
        ("short_term", "Stabilize sleep and meals for two weeks."),
        ("long_term", "Ask a doctor about blood tests if fatigue continues."),
    ],
    prevention_strategy: "Balanced meals, regular sleep, daily movement and stress management.",
    warning_signs: "See a doctor for fatigue with weight loss, fever, shortness of breath, or fatigue lasting more than a few weeks.",
};

static RESPIRATORY_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Cold or flu symptoms",
    understanding: "Cough, congestion and sore throat are usually caused by common viral infections that resolve within 7-10 days.",
    likely_conditions: &["Common cold", "Influenza", "Viral pharyngitis", "Sinusitis"],
    root_causes: &["Viral infection", "Reduced immune resilience from poor sleep or stress", "Dry indoor air"],
    science_explanation: "The immune response to viruses produces inflammation and mucus, which cause most of the symptoms you feel.",
    recommendations: &[
        ("Rest and hydrate", "Drink warm fluids throughout the day and sleep as much as you can.", "Supports immune function and thins mucus.", "high"),
        ("Humidify the air", "Use a humidifier or breathe steam from a bowl of hot water.", "Moist air soothes airways and loosens congestion.", "medium"),
    ],
    natural_remedies: &[
        ("Honey ginger lemon drink", "1 cup 3-4 times daily", "Steep grated ginger, add lemon and honey.", "Honey reduced cough frequency in clinical studies."),
        ("Salt water gargle", "3 times daily", "Dissolve 1/2 tsp salt in a cup of warm water.", "Reduces throat irritation and swelling."),
    ],
    healing_protocol: &[
        ("immediate", "Rest, fluids and warm honey drinks."),
        ("short_term", "Continue supportive care until symptoms ease."),
        ("long_term", "Support immunity with sleep, nutrition and activity."),
    ],
    prevention_strategy: "Wash hands often, sleep well, eat a varied diet and stay active.",
    warning_signs: "Seek care for difficulty breathing, chest pain, fever above 39.5°C (103°F), or symptoms lasting over 10 days.",
};

static PAIN_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Joint or muscle pain",
    understanding: "Aches in joints and muscles often stem from overuse, inactivity, posture or low-grade inflammation.",
    likely_conditions: &["Muscle strain", "Osteoarthritis", "Tendinopathy", "Inflammatory joint pain"],
    root_causes: &["Repetitive strain", "Prolonged sitting", "Excess body weight on joints", "Inflammatory diet"],
    science_explanation: "Inflammatory mediators sensitize pain receptors, while weak supporting muscles increase load on joints.",
    recommendations: &[
        ("Keep gently active", "Do low-impact movement like walking or swimming for 20 minutes daily.", "Movement nourishes cartilage and maintains mobility.", "high"),
        ("Use heat or cold", "Apply heat for stiffness or cold for acute swelling, 15 minutes at a time.", "Modulates blood flow and pain signaling.", "medium"),
    ],
    natural_remedies: &[
        ("Turmeric with black pepper", "500-1000 mg curcumin daily", "Take with food and black pepper.", "Curcumin eased knee osteoarthritis pain in trials."),
        ("Ginger", "1-2 g daily", "Fresh in tea or as supplement.", "Has anti-inflammatory effects on muscle soreness."),
    ],
    healing_protocol: &[
        ("immediate", "Rest the area and apply heat or cold."),
        ("short_term", "Add gentle stretching and mobility work."),
        ("long_term", "Strengthen supporting muscles and manage weight."),
    ],
    prevention_strategy: "Regular strength and mobility work, ergonomic posture and an anti-inflammatory diet.",
    warning_signs: "See a doctor for joint swelling with fever, severe pain after injury, numbness, or pain that wakes you at night.",
};

static SKIN_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "Skin irritation",
    understanding: "Itching, rashes and breakouts often reflect a disrupted skin barrier, irritants, allergies or hormonal changes.",
    likely_conditions: &["Contact dermatitis", "Eczema", "Acne", "Dry skin"],
    root_causes: &["Harsh soaps or fragrances", "Allergens", "Dry air", "Hormonal fluctuations"],
    science_explanation: "A damaged skin barrier loses moisture and lets irritants in, triggering inflammation and itch.",
    recommendations: &[
        ("Simplify skincare", "Use a fragrance-free gentle cleanser and moisturizer only.", "Removes likely irritants and lets the barrier recover.", "high"),
        ("Moisturize after bathing", "Apply moisturizer within 3 minutes of washing.", "Locks in hydration and reduces itch.", "medium"),
    ],
    natural_remedies: &[
        ("Aloe vera gel", "Apply twice daily", "Use pure gel on clean skin.", "Supports skin healing and cools inflammation."),
        ("Colloidal oatmeal bath", "10-15 minutes, a few times weekly", "Add finely ground oats to lukewarm bath water.", "Reduces itch and supports barrier repair."),
    ],
    healing_protocol: &[
        ("immediate", "Stop new products and soothe with aloe or oatmeal."),
        ("short_term", "Use a minimal fragrance-free routine for two weeks."),
        ("long_term", "Identify triggers and maintain barrier care."),
    ],
    prevention_strategy: "Gentle cleansing, daily moisturizer, sun protection and avoiding known irritants.",
    warning_signs: "See a doctor for spreading redness, warmth, pus, fever, or a rash with swelling of the face or lips.",
};

/// 都不命中时的默认症状分析
pub static GENERAL_WELLNESS_ANALYSIS: SymptomTemplate = SymptomTemplate {
    primary_concern: "General wellness",
    understanding: "Your description does not point to one specific pattern, so these suggestions focus on the foundations of health.",
    likely_conditions: &["Lifestyle-related imbalance", "Stress-related symptoms"],
    root_causes: &["Irregular sleep", "Nutrition gaps", "Low activity", "Ongoing stress"],
    science_explanation: "Sleep, nutrition, movement and stress regulation each influence immune, hormonal and nervous system balance.",
    recommendations: &[
        ("Stabilize daily rhythms", "Keep consistent sleep and meal times.", "Regular rhythms support hormone balance and energy.", "medium"),
        ("Eat whole foods", "Fill half your plate with vegetables at each meal.", "Provides fiber, vitamins and minerals for overall health.", "medium"),
        ("Move every day", "Aim for 30 minutes of moderate activity.", "Improves mood, sleep and cardiovascular health.", "high"),
    ],
    natural_remedies: &[
        ("Nettle and ginger tea", "1-2 cups daily", "Steep dried nettle with fresh ginger for 10 minutes.", "Nettle is rich in minerals; ginger supports digestion."),
        ("Chamomile tea", "1 cup in the evening", "Steep 1 tbsp dried flowers for 10 minutes.", "Mildly calming and supports sleep."),
    ],
    healing_protocol: &[
        ("immediate", "Hydrate and take a short walk."),
        ("short_term", "Build consistent sleep, meals and movement over two weeks."),
        ("long_term", "Schedule a routine check-up with your healthcare provider."),
    ],
    prevention_strategy: "Sleep 7-9 hours, eat a varied whole-food diet, stay active and manage stress.",
    warning_signs: "See a healthcare provider if symptoms persist, worsen, or include fever, unexplained weight loss, or severe pain.",
};

/// 症状分析兜底规则表（顺序即优先级，与疗法规则表保持相同的主题顺序）
pub static SYMPTOM_RULES: &[FallbackRule<SymptomTemplate>] = &[
    FallbackRule { name: "headache_fatigue", matcher: HEADACHE_AND_FATIGUE, template: &HEADACHE_FATIGUE_ANALYSIS },
    FallbackRule { name: "headache", matcher: Matcher::Any(HEADACHE), template: &HEADACHE_ANALYSIS },
    FallbackRule { name: "digestive", matcher: Matcher::Any(DIGESTIVE), template: &DIGESTIVE_ANALYSIS },
    FallbackRule { name: "stress", matcher: Matcher::Any(STRESS), template: &STRESS_ANALYSIS },
    FallbackRule { name: "sleep", matcher: Matcher::Any(SLEEP), template: &SLEEP_ANALYSIS },
    FallbackRule { name: "fatigue", matcher: Matcher::Any(FATIGUE), template: &FATIGUE_ANALYSIS },
    FallbackRule { name: "respiratory", matcher: Matcher::Any(RESPIRATORY), template: &RESPIRATORY_ANALYSIS },
    FallbackRule { name: "pain", matcher: Matcher::Any(PAIN), template: &PAIN_ANALYSIS },
    FallbackRule { name: "skin", matcher: Matcher::Any(SKIN), template: &SKIN_ANALYSIS },
];

/// 症状分析兜底；问诊没有偏好参数，preferences 不参与模板选择
pub fn symptom_fallback(concern: &str, _preferences: Option<&str>) -> SymptomAnalysisResult {
    select_rule(SYMPTOM_RULES, concern)
        .map(|r| r.template)
        .unwrap_or(&GENERAL_WELLNESS_ANALYSIS)
        .build()
}

/// 命中的规则名（日志用）；都不命中时为 "general_wellness"
pub fn matched_rule_name(concern: &str) -> &'static str {
    select_rule(REMEDY_RULES, concern)
        .map(|r| r.name)
        .unwrap_or("general_wellness")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remedy::Contract;

    #[test]
    fn test_scenario_headache_and_tired_uses_combined_template() {
        let remedy = remedy_fallback("I have a headache and feel tired", None);
        assert_eq!(remedy.name, HEADACHE_FATIGUE_REMEDY.name);
        assert!(remedy.ingredients.len() >= 3);
        assert!(!remedy.instructions.is_empty());
    }

    #[test]
    fn test_first_matching_rule_wins() {
        // "stomach" 与 "stress" 同时出现时，消化类排在前面
        assert_eq!(matched_rule_name("stress makes my stomach hurt"), "digestive");
        // 只有 headache 时不会命中组合规则
        assert_eq!(matched_rule_name("Headache since this morning"), "headache");
        assert_eq!(matched_rule_name("constantly TIRED"), "fatigue");
    }

    #[test]
    fn test_default_template_when_nothing_matches() {
        let remedy = remedy_fallback("I want to feel healthier overall", None);
        assert_eq!(remedy.name, GENERAL_WELLNESS_REMEDY.name);
        assert_eq!(matched_rule_name("I want to feel healthier overall"), "general_wellness");
    }

    #[test]
    fn test_every_template_is_valid_by_construction() {
        for rule in REMEDY_RULES {
            assert!(rule.template.build().validate().is_ok(), "{}", rule.name);
        }
        assert!(GENERAL_WELLNESS_REMEDY.build().validate().is_ok());
        for rule in SYMPTOM_RULES {
            let mut analysis = rule.template.build();
            analysis.ai_source = "Pattern Analysis".into();
            assert!(analysis.validate().is_ok(), "{}", rule.name);
            assert_eq!(analysis.confidence_level, FALLBACK_CONFIDENCE);
        }
        assert!(GENERAL_WELLNESS_ANALYSIS.build().validate().is_ok());
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = remedy_fallback("bloating after meals", Some("no dairy"));
        let b = remedy_fallback("bloating after meals", Some("no dairy"));
        assert_eq!(a, b);
        assert_eq!(
            symptom_fallback("cough and congestion", None),
            symptom_fallback("cough and congestion", None)
        );
    }

    #[test]
    fn test_preferences_noted_in_description() {
        let remedy = remedy_fallback("bloating", Some("  vegan  "));
        assert!(remedy.description.flatten().unwrap().ends_with(
            "Preferences noted: vegan. Swap any ingredient that conflicts with them."
        ));
        let plain = remedy_fallback("bloating", Some("   "));
        assert_eq!(plain.description.flatten().as_deref(), Some(DIGESTIVE_REMEDY.description));
    }

    #[test]
    fn test_symptom_fallback_matches_theme() {
        let analysis = symptom_fallback("my stomach is bloated after eating", None);
        assert_eq!(analysis.primary_concern, "Digestive discomfort");
        assert!(!analysis.likely_conditions.is_empty());
    }
}
