//! Prompt classification models.

use serde::{Deserialize, Serialize};

use super::actionable::ActionableType;

/// Intent derived from a free-text prompt. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptClassification {
    pub optimize_battery: bool,
    pub optimize_data: bool,
    pub is_relevant: bool,
    /// Actionable categories hinted at by the prompt, in first-seen order
    pub actionable_focus: Vec<ActionableType>,
    /// Packages the prompt explicitly asks to keep working
    #[serde(default)]
    pub protected_apps: Vec<String>,
    #[serde(default)]
    pub time_constraint_minutes: Option<u32>,
}

impl PromptClassification {
    /// Classification of a prompt that has nothing to do with optimization.
    pub fn irrelevant() -> Self {
        Self {
            optimize_battery: false,
            optimize_data: false,
            is_relevant: false,
            actionable_focus: Vec::new(),
            protected_apps: Vec::new(),
            time_constraint_minutes: None,
        }
    }

    /// Classification used for an empty prompt: optimize everything.
    pub fn optimize_everything() -> Self {
        let mut classification = Self {
            optimize_battery: true,
            optimize_data: true,
            is_relevant: true,
            ..Self::irrelevant()
        };
        classification.add_focus(ActionableType::battery_focus());
        classification.add_focus(ActionableType::data_focus());
        classification
    }

    /// Append focus hints, skipping ones already present.
    pub fn add_focus(&mut self, types: &[ActionableType]) {
        for t in types {
            if !self.actionable_focus.contains(t) {
                self.actionable_focus.push(*t);
            }
        }
    }

    pub fn remove_focus(&mut self, types: &[ActionableType]) {
        self.actionable_focus.retain(|t| !types.contains(t));
    }

    /// Enforce the relevance invariant: an irrelevant classification carries
    /// no goals and no focus hints.
    pub fn normalized(self) -> Self {
        if self.is_relevant {
            self
        } else {
            Self {
                protected_apps: self.protected_apps,
                time_constraint_minutes: self.time_constraint_minutes,
                ..Self::irrelevant()
            }
        }
    }
}

/// Activity named in a feasibility question ("can I stream ...").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    YouTube,
    Netflix,
    VideoStreaming,
    Gaming,
    Navigation,
    Calls,
    Browsing,
    Messaging,
    General,
}

impl Activity {
    /// Verb phrase used in answer templates.
    pub fn phrase(self) -> &'static str {
        match self {
            Activity::YouTube => "watch YouTube",
            Activity::Netflix => "stream Netflix",
            Activity::VideoStreaming => "stream video",
            Activity::Gaming => "play games",
            Activity::Navigation => "use navigation",
            Activity::Calls => "make calls",
            Activity::Browsing => "browse the web",
            Activity::Messaging => "use messaging apps",
            Activity::General => "use your phone",
        }
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activity::YouTube => write!(f, "youtube"),
            Activity::Netflix => write!(f, "netflix"),
            Activity::VideoStreaming => write!(f, "video_streaming"),
            Activity::Gaming => write!(f, "gaming"),
            Activity::Navigation => write!(f, "navigation"),
            Activity::Calls => write!(f, "calls"),
            Activity::Browsing => write!(f, "browsing"),
            Activity::Messaging => write!(f, "messaging"),
            Activity::General => write!(f, "general"),
        }
    }
}
