//! Widget options. Every struct deserializes with `#[serde(default)]`, so any
//! partial document merges over the built-in defaults and the result is always
//! fully populated.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::domain::{ModelCatalog, ModelEntry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialStatus {
    #[default]
    Active,
    Sleep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub models: ModelCatalog,
    pub initial_status: InitialStatus,
    pub status: StatusOptions,
    pub tips: TipsOptions,
    pub stage: StageOptions,
    pub mobile: MobileOptions,
    /// Global style hooks applied to the widget root.
    pub style: BTreeMap<String, String>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            models: ModelCatalog::new(vec![ModelEntry::new(
                "Potion Maker",
                "models/potion-maker/index.json",
            )]),
            initial_status: InitialStatus::Active,
            status: StatusOptions::default(),
            tips: TipsOptions::default(),
            stage: StageOptions::default(),
            mobile: MobileOptions::default(),
            style: BTreeMap::new(),
        }
    }
}

impl WidgetOptions {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusOptions {
    pub rest: String,
    pub loading: String,
    pub switching: String,
    pub load_error: String,
    pub color: String,
    pub error_color: String,
    pub style: BTreeMap<String, String>,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            rest: "Resting. Click to wake me up.".into(),
            loading: "Loading...".into(),
            switching: "Changing outfit...".into(),
            load_error: "Failed to load the model. Click to retry.".into(),
            color: "#fa0".into(),
            error_color: "#f44".into(),
            style: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipsOptions {
    pub transition_ms: u64,
    pub notify_priority: i32,
    pub idle: IdleOptions,
    pub messages: MessageOptions,
    pub style: BTreeMap<String, String>,
}

impl TipsOptions {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

impl Default for TipsOptions {
    fn default() -> Self {
        Self {
            transition_ms: 500,
            notify_priority: 3,
            idle: IdleOptions::default(),
            messages: MessageOptions::default(),
            style: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleOptions {
    pub interval_ms: u64,
    pub duration_ms: u64,
    pub priority: i32,
    pub messages: Vec<String>,
    /// Endpoint returning `{"hitokoto": "...", "from": "..."}`.
    pub word_of_the_day: Option<String>,
}

impl IdleOptions {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            interval_ms: 20_000,
            duration_ms: 6_000,
            priority: 1,
            messages: vec![
                "Been a while since you scrolled. Still there?".into(),
                "Don't forget to drink some water.".into(),
                "I can change outfits. Try the menu!".into(),
                "Reading something interesting?".into(),
            ],
            word_of_the_day: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRule {
    /// Inclusive hour range such as `"6-9"`; `"23-4"` wraps past midnight.
    pub hours: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonRule {
    /// `MM/DD` start date, inclusive.
    pub start: String,
    /// `MM/DD` end date, inclusive.
    pub end: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageOptions {
    pub welcome: Vec<HourRule>,
    pub welcome_duration_ms: u64,
    pub welcome_priority: i32,
    pub seasons: Vec<SeasonRule>,
    pub copy: Vec<String>,
    pub copy_duration_ms: u64,
    pub return_visit: String,
    pub no_clothes: String,
}

impl MessageOptions {
    pub fn welcome_duration(&self) -> Duration {
        Duration::from_millis(self.welcome_duration_ms)
    }

    pub fn copy_duration(&self) -> Duration {
        Duration::from_millis(self.copy_duration_ms)
    }
}

impl Default for MessageOptions {
    fn default() -> Self {
        let rule = |hours: &str, text: &str| HourRule {
            hours: hours.into(),
            text: text.into(),
        };
        Self {
            welcome: vec![
                rule("5-7", "Good morning! The early bird gets the worm."),
                rule("8-11", "Morning! Time to get some work done."),
                rule("12-13", "Lunch time already? Go grab something to eat."),
                rule("14-17", "Afternoons are sleepy. Stretch a little!"),
                rule("18-19", "The sunset is lovely this time of day."),
                rule("20-21", "Good evening. How was your day?"),
                rule("22-23", "It's getting late. Rest soon, okay?"),
                rule("0-4", "Still awake? Staying up this late is bad for you."),
            ],
            welcome_duration_ms: 7_000,
            welcome_priority: 4,
            seasons: vec![
                SeasonRule {
                    start: "01/01".into(),
                    end: "01/03".into(),
                    text: "Happy new year!".into(),
                },
                SeasonRule {
                    start: "12/24".into(),
                    end: "12/25".into(),
                    text: "Merry Christmas!".into(),
                },
            ],
            copy: vec!["What did you just copy? Remember to credit the source!".into()],
            copy_duration_ms: 6_000,
            return_visit: "Welcome back!".into(),
            no_clothes: "I don't have any other outfits yet.".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageOptions {
    pub transition_ms: u64,
    pub width: u32,
    pub height: u32,
    pub style: BTreeMap<String, String>,
}

impl StageOptions {
    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            transition_ms: 1_000,
            width: 300,
            height: 300,
            style: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileOptions {
    /// Show the model on mobile-class viewports.
    pub display: bool,
    pub breakpoint: u32,
}

impl Default for MobileOptions {
    fn default() -> Self {
        Self {
            display: false,
            breakpoint: 768,
        }
    }
}
