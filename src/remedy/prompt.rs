//! Prompt 构建：把请求组装成 Provider 可用的消息序列
//!
//! System 消息要求只输出 JSON；结构约束由各 Provider 通过 schema 提示单独传递。

use crate::remedy::{Message, RemedyRequest, SymptomQuery};

const REMEDY_SYSTEM_PROMPT: &str = "You are a natural health assistant that creates safe, practical home remedies. \
Respond with a single JSON object only, no prose and no markdown. \
Fill `name`, `ingredients` (at least one) and `instructions`; add description, benefits, form, dosage, duration, safety and scientific_basis when you can. \
Prefer common, food-grade ingredients and always include relevant safety notes.";

const SYMPTOM_SYSTEM_PROMPT: &str = "You are a natural health assistant that analyses symptoms and suggests evidence-informed lifestyle and herbal support. \
You do not diagnose. Respond with a single JSON object only, no prose and no markdown. \
`likely_conditions` and `recommendations` must not be empty, `root_causes` and `natural_remedies` are always present (use [] when unsure), \
`confidence_level` is a number from 0 to 100, \
and `warning_signs` should say when to see a doctor.";

/// 疗法生成的消息序列
pub fn remedy_messages(request: &RemedyRequest) -> Vec<Message> {
    let mut user = format!("Health concern: {}", request.health_concern.trim());
    if let Some(prefs) = request
        .preferences
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        user.push_str(&format!("\nPreferences: {prefs}"));
    }
    vec![Message::system(REMEDY_SYSTEM_PROMPT), Message::user(user)]
}

/// 症状分析的消息序列：system + 截断后的历史 + 最新一条 User 消息
pub fn symptom_messages(query: &SymptomQuery, max_history_turns: usize) -> Vec<Message> {
    let mut messages = vec![Message::system(SYMPTOM_SYSTEM_PROMPT)];
    messages.extend(query.history_window(max_history_turns));
    messages.push(Message::user(format!(
        "Symptoms: {}",
        query.latest_concern().trim()
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remedy::Role;

    #[test]
    fn test_remedy_messages_include_preferences() {
        let req = RemedyRequest::new("bloating").with_preferences("vegan");
        let messages = remedy_messages(&req);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Health concern: bloating\nPreferences: vegan");
    }

    #[test]
    fn test_symptom_messages_window_history() {
        let query = SymptomQuery::new(vec![
            Message::user("I get headaches"),
            Message::assistant("How often?"),
            Message::user("old turn"),
            Message::assistant("noted"),
            Message::user("Every afternoon, with tiredness"),
        ]);
        let messages = symptom_messages(&query, 1);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "old turn");
        assert_eq!(
            messages.last().map(|m| m.content.as_str()),
            Some("Symptoms: Every afternoon, with tiredness")
        );
    }
}
