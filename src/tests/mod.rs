//! Scenario tests driving `StationApp` through a simulated page.
//!
//! `FakeHost` applies effects the way the browser runtime does, but timers run
//! on a virtual clock and network requests wait until the test answers them.

mod race_flow;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::StationApp;
use crate::config::StationConfig;
use crate::effect::{DrawOp, Effect, Effects, TimerId};
use crate::message::{Message, PageLoad};
use crate::model::{Control, FieldValue, RaceCommand, RaceId};
use crate::push::PushEvent;
use crate::storage::MemoryStore;

/// A request the controller is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub url: String,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    period_ms: u64,
    due_ms: u64,
}

pub struct FakeHost {
    pub app: StationApp<MemoryStore>,
    now_ms: u64,
    intervals: HashMap<TimerId, Interval>,
    timeouts: HashMap<TimerId, u64>,

    pub fetches: Vec<PendingFetch>,
    pub posts: Vec<RaceCommand>,

    pub image_src: String,
    pub preview_frames: usize,
    pub enabled: HashMap<Control, bool>,
    pub slider_max: u32,
    pub slider_value: u32,
    pub race_selector: String,
    pub race_label: String,
    pub cage_label: String,
    pub changed_fields: BTreeSet<String>,
    pub field_values: BTreeMap<String, FieldValue>,
    pub form_unsaved: bool,
    pub unload_guard: bool,
    pub canvas: Vec<DrawOp>,
    pub delete_target: Option<RaceId>,
}

impl FakeHost {
    pub fn new(config: StationConfig) -> Self {
        Self::with_store(config, MemoryStore::new())
    }

    pub fn with_store(config: StationConfig, store: MemoryStore) -> Self {
        Self {
            app: StationApp::new(config, store),
            now_ms: 1_000,
            intervals: HashMap::new(),
            timeouts: HashMap::new(),
            fetches: Vec::new(),
            posts: Vec::new(),
            image_src: String::new(),
            preview_frames: 0,
            enabled: HashMap::new(),
            slider_max: 0,
            slider_value: 0,
            race_selector: String::new(),
            race_label: String::new(),
            cage_label: String::new(),
            changed_fields: BTreeSet::new(),
            field_values: BTreeMap::new(),
            form_unsaved: false,
            unload_guard: false,
            canvas: Vec::new(),
            delete_target: None,
        }
    }

    /// Host with default configuration, already loaded with the given query.
    pub fn loaded(query: &str) -> Self {
        let mut host = Self::new(StationConfig::default());
        host.load(query, BTreeMap::new());
        host
    }

    pub fn load(&mut self, query: &str, form: BTreeMap<String, FieldValue>) -> Effects {
        self.field_values = form.clone();
        self.send(Message::Loaded(PageLoad {
            query: query.to_string(),
            form,
        }))
    }

    /// Feed one message and apply the resulting effects.
    pub fn send(&mut self, message: Message) -> Effects {
        let effects = self.app.update(message);
        for effect in &effects {
            self.apply(effect);
        }
        effects
    }

    pub fn push_race(&mut self, raw: &str) -> Effects {
        self.send(Message::Push {
            event: PushEvent::Race(raw.to_string()),
        })
    }

    pub fn select(&mut self, value: &str) -> Effects {
        self.send(Message::RaceSelected {
            value: value.to_string(),
        })
    }

    /// Answer the oldest pending image count request.
    pub fn answer_fetch(&mut self, status: u16, body: &str) -> Effects {
        let fetch = self.fetches.remove(0);
        self.answer(fetch, status, body)
    }

    pub fn answer(&mut self, fetch: PendingFetch, status: u16, body: &str) -> Effects {
        self.send(Message::ImageCountLoaded {
            generation: fetch.generation,
            status,
            body: body.to_string(),
        })
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.enabled.get(&control).copied().unwrap_or(false)
    }

    /// Enablement of (ready, selector, slider, stop) as shown on the page.
    pub fn controls(&self) -> (bool, bool, bool, bool) {
        (
            self.is_enabled(Control::ReadyButton),
            self.is_enabled(Control::RaceSelect),
            self.is_enabled(Control::Slider),
            self.is_enabled(Control::StopButton),
        )
    }

    pub fn running_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.timeouts.len()
    }

    /// Run the virtual clock forward, firing every timer that falls due.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        loop {
            let next_interval = self
                .intervals
                .iter()
                .map(|(id, i)| (i.due_ms, *id))
                .filter(|(due, _)| *due <= target)
                .min_by_key(|(due, id)| (*due, id.seq));
            let next_timeout = self
                .timeouts
                .iter()
                .map(|(id, due)| (*due, *id))
                .filter(|(due, _)| *due <= target)
                .min_by_key(|(due, id)| (*due, id.seq));

            match (next_interval, next_timeout) {
                (Some((due, timer)), timeout) if timeout.is_none_or(|(t, _)| due <= t) => {
                    self.now_ms = due;
                    if let Some(interval) = self.intervals.get_mut(&timer) {
                        interval.due_ms += interval.period_ms;
                    }
                    self.send(Message::PreviewTick {
                        timer,
                        timestamp_ms: due,
                    });
                }
                (_, Some((due, timer))) => {
                    self.now_ms = due;
                    self.timeouts.remove(&timer);
                    self.send(Message::TrainingSettled { timer });
                }
                _ => break,
            }
        }
        self.now_ms = target;
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::SetImageSource { src } => {
                if src.starts_with("/camera?") {
                    self.preview_frames += 1;
                }
                self.image_src = src.clone();
            }
            Effect::SetControlEnabled { control, enabled } => {
                self.enabled.insert(*control, *enabled);
            }
            Effect::SetSliderBounds { max, value } => {
                self.slider_max = *max;
                self.slider_value = *value;
            }
            Effect::SetSliderValue { value } => self.slider_value = *value,
            Effect::FocusSlider | Effect::PreventDefault => {}
            Effect::SetRaceSelector { value } => self.race_selector = value.clone(),

            Effect::StartInterval { timer, period } => {
                let period_ms = period.as_millis() as u64;
                self.intervals.insert(
                    *timer,
                    Interval {
                        period_ms,
                        due_ms: self.now_ms + period_ms,
                    },
                );
            }
            Effect::CancelInterval { timer } => {
                self.intervals.remove(timer);
            }
            Effect::ScheduleTimeout { timer, delay } => {
                self.timeouts
                    .insert(*timer, self.now_ms + delay.as_millis() as u64);
            }
            Effect::CancelTimeout { timer } => {
                self.timeouts.remove(timer);
            }

            Effect::FetchImageCount { url, generation } => self.fetches.push(PendingFetch {
                url: url.clone(),
                generation: *generation,
            }),
            Effect::PostRaceCommand { command, .. } => self.posts.push(*command),

            Effect::SetRaceStatusLabel { text } => self.race_label = text.clone(),
            Effect::SetCageStatusLabel { text } => self.cage_label = text.clone(),
            Effect::SetFieldChanged { name, changed } => {
                if *changed {
                    self.changed_fields.insert(name.clone());
                } else {
                    self.changed_fields.remove(name);
                }
            }
            Effect::SetFieldValue { name, value } => {
                self.field_values.insert(name.clone(), value.clone());
            }
            Effect::SetFormUnsaved { unsaved } => self.form_unsaved = *unsaved,
            Effect::InstallUnloadGuard => self.unload_guard = true,
            Effect::RemoveUnloadGuard => self.unload_guard = false,

            Effect::Draw { op: DrawOp::Clear } => self.canvas.clear(),
            Effect::Draw { op } => self.canvas.push(*op),
            Effect::SetDeleteTarget { race } => self.delete_target = race.clone(),
        }
    }
}
