//! Rule-based prompt intent classification.
//!
//! Positive keyword groups are matched first, then negations are applied on
//! top, so "optimize battery but not data" keeps battery and drops data.

use lazy_static::lazy_static;
use std::time::Duration;

use super::constraint_extractor::{detect_activity, Constraints};
use super::external_classifier::ExternalClassifier;
use super::rules::RuleSet;
use crate::models::{Activity, ActionableType, PromptClassification};

/// Effect of a positive keyword group.
#[derive(Debug, Clone, Copy)]
struct KeywordGroup {
    battery: bool,
    data: bool,
    focus: &'static [ActionableType],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Negated {
    Battery,
    Data,
}

lazy_static! {
    static ref KEYWORD_GROUPS: RuleSet<KeywordGroup> = RuleSet::from_table([
        (
            r"\b(battery|batteries|power|charge|charging)\b",
            KeywordGroup {
                battery: true,
                data: false,
                focus: ActionableType::battery_focus(),
            },
        ),
        (
            r"\b(data|network|internet|wifi|wi-fi)\b",
            KeywordGroup {
                battery: false,
                data: true,
                focus: ActionableType::data_focus(),
            },
        ),
        (
            r"\bbackground\b",
            KeywordGroup {
                battery: true,
                data: true,
                focus: &[ActionableType::RestrictBackground],
            },
        ),
        (
            r"\bkill\b",
            KeywordGroup {
                battery: false,
                data: false,
                focus: &[ActionableType::KillApp],
            },
        ),
        (
            r"\bperformance\b",
            KeywordGroup {
                battery: false,
                data: false,
                focus: &[ActionableType::SetStandbyBucket, ActionableType::CategorizeApp],
            },
        ),
    ])
    .unwrap();
    static ref GENERIC_TERMS: RuleSet<()> = RuleSet::from_table([(
        r"\b(optimi[sz]e|optimi[sz]ing|save|saving|reduce|conserve|extend|improve|last longer|limit)\b",
        (),
    )])
    .unwrap();
    static ref NEGATIONS: RuleSet<Negated> = RuleSet::from_table([
        (r"\b(don'?t|do not)\s+(optimi[sz]e|save|worry about|care about|touch)\s+(the\s+|my\s+)?(battery|power)\b", Negated::Battery),
        (r"\bnot\s+(optimi[sz]ing|saving|worrying about|caring about)\s+(the\s+|my\s+)?(battery|power)\b", Negated::Battery),
        (r"\bno\s+(battery|power)\s+(optimi[sz]ation|saving|savings)\b", Negated::Battery),
        (r"\bignore\s+(the\s+|my\s+)?(battery|power)\b", Negated::Battery),
        (r"\bwithout\s+(battery|power)\s+(optimi[sz]ation|saving|savings)\b", Negated::Battery),
        (r"\bbut\s+(not|no)\s+(the\s+|my\s+)?(battery|power)\b", Negated::Battery),
        (r"\b(don'?t|do not)\s+(optimi[sz]e|save|worry about|care about|touch)\s+(the\s+|my\s+)?(data|network)\b", Negated::Data),
        (r"\bnot\s+(optimi[sz]ing|saving|worrying about|caring about)\s+(the\s+|my\s+)?(data|network)\b", Negated::Data),
        (r"\bno\s+(data|network)\s+(optimi[sz]ation|saving|savings)\b", Negated::Data),
        (r"\bignore\s+(the\s+|my\s+)?(data|network)\b", Negated::Data),
        (r"\bwithout\s+(data|network)\s+(optimi[sz]ation|saving|savings)\b", Negated::Data),
        (r"\bbut\s+(not|no)\s+(the\s+|my\s+)?(data|network)\b", Negated::Data),
    ])
    .unwrap();
    static ref OPTIMIZATION_VERBS: RuleSet<()> = RuleSet::from_table([(
        r"\b(optimi[sz]e|save|reduce|conserve|limit|minimi[sz]e|decrease|cut down|lower|extend|improve|restrict)\b",
        (),
    )])
    .unwrap();
    static ref INFORMATION_LEADS: RuleSet<()> = RuleSet::from_table([(
        r"^\s*(show me|tell me|what is|what are|what's|which is|which are|how much|how many|list|display|report)\b",
        (),
    )])
    .unwrap();
    static ref INFORMATION_KEYWORDS: RuleSet<()> = RuleSet::from_table(
        ["which", "what", "top", "most", "list", "show", "usage", "consuming", "draining"]
            .map(|word| (format!(r"\b{}\b", word), ())),
    )
    .unwrap();
    static ref YES_NO_LEADS: RuleSet<()> =
        RuleSet::from_table([(r"\b(can i|will i|could i|is it possible to)\b", ())]).unwrap();
}

/// Battery-only markers used when goals must be re-derived from focus hints.
const BATTERY_MARKERS: &[ActionableType] = &[
    ActionableType::ManageWakeLocks,
    ActionableType::ThrottleCpuUsage,
    ActionableType::EnableBatterySaver,
    ActionableType::OptimizeBattery,
];

/// Data-only markers used when goals must be re-derived from focus hints.
const DATA_MARKERS: &[ActionableType] = &[
    ActionableType::RestrictBackgroundData,
    ActionableType::EnableDataSaver,
];

/// Classify a prompt with the rule tables only.
pub fn classify(prompt: &str) -> PromptClassification {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return PromptClassification::optimize_everything();
    }

    let mut result = PromptClassification::irrelevant();
    let mut matched_group = false;
    for group in KEYWORD_GROUPS.matches(prompt) {
        matched_group = true;
        result.optimize_battery |= group.battery;
        result.optimize_data |= group.data;
        result.add_focus(group.focus);
    }

    if !matched_group {
        if GENERIC_TERMS.any(prompt) {
            let mut generic = PromptClassification::optimize_everything();
            apply_negations(&mut generic, prompt);
            return ensure_goals(generic, prompt);
        }
        tracing::debug!(prompt = %prompt, "Prompt not relevant to optimization");
        return result;
    }

    result.is_relevant = true;
    apply_negations(&mut result, prompt);
    ensure_goals(result, prompt)
}

fn negations(prompt: &str) -> (bool, bool) {
    let mut battery = false;
    let mut data = false;
    for negated in NEGATIONS.matches(prompt) {
        match negated {
            Negated::Battery => battery = true,
            Negated::Data => data = true,
        }
    }
    (battery, data)
}

fn apply_negations(result: &mut PromptClassification, prompt: &str) {
    let (battery, data) = negations(prompt);
    if battery {
        result.optimize_battery = false;
        result.remove_focus(ActionableType::battery_focus());
    }
    if data {
        result.optimize_data = false;
        result.remove_focus(ActionableType::data_focus());
    }
}

/// A relevant prompt always ends up with at least one goal.
fn ensure_goals(mut result: PromptClassification, prompt: &str) -> PromptClassification {
    if result.optimize_battery || result.optimize_data {
        tracing::debug!(classification = ?result, "Classified prompt");
        return result;
    }

    derive_goals_from_focus(&mut result);
    if !result.optimize_battery && !result.optimize_data {
        let (battery_negated, data_negated) = negations(prompt);
        if battery_negated && data_negated {
            result.optimize_battery = true;
            result.optimize_data = true;
        } else {
            result.optimize_battery = !battery_negated;
            result.optimize_data = !data_negated;
        }
    }

    tracing::debug!(classification = ?result, "Classified prompt");
    result
}

fn derive_goals_from_focus(result: &mut PromptClassification) {
    result.optimize_battery = result
        .actionable_focus
        .iter()
        .any(|t| BATTERY_MARKERS.contains(t));
    result.optimize_data = result
        .actionable_focus
        .iter()
        .any(|t| DATA_MARKERS.contains(t));
}

/// Carry extracted constraints into the classification.
pub fn apply_constraints(
    mut classification: PromptClassification,
    constraints: &Constraints,
) -> PromptClassification {
    classification.protected_apps = constraints.named_apps.iter().cloned().collect();
    classification.time_constraint_minutes = constraints.time_minutes();
    classification
}

/// Whether the prompt asks for information rather than optimization.
pub fn is_information_request(prompt: &str) -> bool {
    let prompt = prompt.trim();
    if prompt.is_empty() || OPTIMIZATION_VERBS.any(prompt) {
        return false;
    }
    if INFORMATION_LEADS.any(prompt) {
        return true;
    }
    INFORMATION_KEYWORDS.matches(prompt).count() >= 2
}

/// Activity of a feasibility question such as "can I stream Netflix for 2 hours".
pub fn yes_no_activity(prompt: &str) -> Option<Activity> {
    if !YES_NO_LEADS.any(prompt) {
        return None;
    }
    detect_activity(prompt).filter(|activity| *activity != Activity::General)
}

pub fn is_yes_no_question(prompt: &str) -> bool {
    yes_no_activity(prompt).is_some()
}

/// Where the final classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Rules,
    External,
    Fallback,
}

impl ClassificationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationSource::Rules => "rules",
            ClassificationSource::External => "external",
            ClassificationSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule classification with the external classifier as a last resort.
///
/// The external call is bounded by `timeout`; any failure or contradictory
/// answer degrades to the rule result, which is irrelevant at that point.
pub async fn classify_with_fallback(
    prompt: &str,
    external: Option<&dyn ExternalClassifier>,
    timeout: Duration,
) -> (PromptClassification, ClassificationSource) {
    let rules = classify(prompt);
    if rules.is_relevant || prompt.trim().is_empty() {
        return (rules, ClassificationSource::Rules);
    }
    let Some(external) = external else {
        return (rules, ClassificationSource::Rules);
    };

    let answer = match tokio::time::timeout(timeout, external.classify(prompt)).await {
        Ok(Ok(answer)) => answer,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "External classifier failed, using rule result");
            return (rules, ClassificationSource::Fallback);
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "External classifier timed out, using rule result"
            );
            return (rules, ClassificationSource::Fallback);
        }
    };

    let mut answer = answer.normalized();
    if answer.is_relevant && !answer.optimize_battery && !answer.optimize_data {
        derive_goals_from_focus(&mut answer);
        if !answer.optimize_battery && !answer.optimize_data {
            tracing::warn!(
                "External classifier marked prompt relevant without goals, using rule result"
            );
            return (rules, ClassificationSource::Fallback);
        }
    }

    tracing::debug!(classification = ?answer, "External classification accepted");
    (answer, ClassificationSource::External)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::external_classifier::MockExternalClassifier;

    #[test]
    fn test_empty_prompt_optimizes_everything() {
        for prompt in ["", "   "] {
            let c = classify(prompt);
            assert!(c.is_relevant);
            assert!(c.optimize_battery && c.optimize_data);
        }
    }

    #[test]
    fn test_battery_keywords() {
        let c = classify("My battery is dying");
        assert!(c.is_relevant);
        assert!(c.optimize_battery);
        assert!(!c.optimize_data);
        assert!(c.actionable_focus.contains(&ActionableType::ManageWakeLocks));
        assert!(c.actionable_focus.contains(&ActionableType::ThrottleCpuUsage));
    }

    #[test]
    fn test_data_keywords() {
        let c = classify("Reduce my internet usage");
        assert!(c.optimize_data);
        assert!(!c.optimize_battery);
        assert!(c.actionable_focus.contains(&ActionableType::RestrictBackgroundData));
    }

    #[test]
    fn test_background_sets_both_goals() {
        let c = classify("stop background activity");
        assert!(c.optimize_battery && c.optimize_data);
        assert!(c.actionable_focus.contains(&ActionableType::RestrictBackground));
    }

    #[test]
    fn test_negation_but_not_data() {
        let c = classify("optimize battery but not data");
        assert!(c.optimize_battery);
        assert!(!c.optimize_data);
        assert!(!c.actionable_focus.contains(&ActionableType::RestrictBackgroundData));
    }

    #[test]
    fn test_negation_ignore_battery() {
        let c = classify("save data, ignore battery");
        assert!(c.optimize_data);
        assert!(!c.optimize_battery);
        assert!(!c.actionable_focus.contains(&ActionableType::ManageWakeLocks));
    }

    #[test]
    fn test_negation_only_keeps_other_goal() {
        let c = classify("don't optimize battery");
        assert!(c.is_relevant);
        assert!(!c.optimize_battery);
        assert!(c.optimize_data);
    }

    #[test]
    fn test_focus_only_groups_derive_goals() {
        let c = classify("kill whatever hurts performance");
        assert!(c.is_relevant);
        assert!(c.optimize_battery && c.optimize_data);
        assert!(c.actionable_focus.contains(&ActionableType::KillApp));
        assert!(c.actionable_focus.contains(&ActionableType::CategorizeApp));
    }

    #[test]
    fn test_generic_terms() {
        let c = classify("help me make it last longer");
        assert!(c.is_relevant);
        assert!(c.optimize_battery && c.optimize_data);
    }

    #[test]
    fn test_irrelevant_prompt() {
        let c = classify("What's the weather like tomorrow?");
        assert!(!c.is_relevant);
        assert!(!c.optimize_battery && !c.optimize_data);
        assert!(c.actionable_focus.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        for prompt in ["optimize battery but not data", "Which apps use the most data?", ""] {
            assert_eq!(classify(prompt), classify(prompt));
        }
    }

    #[test]
    fn test_information_request() {
        assert!(is_information_request("Which apps are draining my battery?"));
        assert!(is_information_request("Show me the top data consumers"));
        assert!(is_information_request("what's using the most data"));
        assert!(!is_information_request("Save battery"));
        assert!(!is_information_request("reduce the apps draining my battery"));
        assert!(!is_information_request(""));
    }

    #[test]
    fn test_yes_no_question() {
        assert_eq!(
            yes_no_activity("Can I stream Netflix for 2 hours?"),
            Some(Activity::Netflix)
        );
        assert!(is_yes_no_question("Will I be able to play games for 3 hours"));
        assert!(!is_yes_no_question("Can I save battery?"));
        assert!(!is_yes_no_question("stream netflix"));
    }

    #[test]
    fn test_apply_constraints() {
        let constraints = Constraints {
            time_hours: Some(2),
            named_apps: ["com.whatsapp".to_string()].into(),
            ..Default::default()
        };
        let c = apply_constraints(classify("save battery"), &constraints);
        assert_eq!(c.time_constraint_minutes, Some(120));
        assert_eq!(c.protected_apps, vec!["com.whatsapp".to_string()]);
    }

    #[tokio::test]
    async fn test_fallback_skipped_for_relevant_prompt() {
        let external = MockExternalClassifier::failing();
        let (c, source) =
            classify_with_fallback("save battery", Some(&external), Duration::from_millis(50)).await;
        assert!(c.optimize_battery);
        assert_eq!(source, ClassificationSource::Rules);
    }

    #[tokio::test]
    async fn test_fallback_uses_external_answer() {
        let mut answer = PromptClassification::irrelevant();
        answer.is_relevant = true;
        answer.optimize_data = true;
        let external = MockExternalClassifier::returning(answer);
        let (c, source) =
            classify_with_fallback("my phone is slow", Some(&external), Duration::from_millis(50))
                .await;
        assert_eq!(source, ClassificationSource::External);
        assert!(c.is_relevant && c.optimize_data);
    }

    #[tokio::test]
    async fn test_fallback_on_failure() {
        let external = MockExternalClassifier::failing();
        let (c, source) =
            classify_with_fallback("my phone is slow", Some(&external), Duration::from_millis(50))
                .await;
        assert_eq!(source, ClassificationSource::Fallback);
        assert!(!c.is_relevant);
    }

    #[tokio::test]
    async fn test_fallback_on_timeout() {
        let external = MockExternalClassifier::returning(PromptClassification::optimize_everything())
            .with_delay(Duration::from_millis(200));
        let (c, source) =
            classify_with_fallback("my phone is slow", Some(&external), Duration::from_millis(10))
                .await;
        assert_eq!(source, ClassificationSource::Fallback);
        assert!(!c.is_relevant);
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_answer() {
        let mut answer = PromptClassification::irrelevant();
        answer.is_relevant = true;
        let external = MockExternalClassifier::returning(answer);
        let (c, source) =
            classify_with_fallback("my phone is slow", Some(&external), Duration::from_millis(50))
                .await;
        assert_eq!(source, ClassificationSource::Fallback);
        assert!(!c.is_relevant && !c.optimize_battery);
    }
}
