use super::FakeHost;
use crate::config::{PreviewMode, StationConfig};
use crate::effect::Effect;
use crate::message::Message;
use crate::model::{RaceCommand, RaceId};
use crate::push::PushEvent;

const READY: &str = "🟢 Redo";
const NOT_READY: &str = "🟡 Inte redo";
const IN_PROGRESS: &str = "🔴 Pågår";

fn key(host: &mut FakeHost, key: &str) -> Vec<Effect> {
    host.send(Message::KeyPressed {
        key: key.to_string(),
        slider_focused: false,
    })
}

fn host_with_race(count: &str) -> FakeHost {
    let mut host = FakeHost::loaded("");
    host.select("race7");
    host.answer_fetch(200, count);
    host
}

#[test]
fn test_load_starts_preview_with_default_controls() {
    let host = FakeHost::loaded("");
    assert_eq!(host.controls(), (true, true, true, false));
    assert_eq!(host.race_selector, "preview");
    assert_eq!(host.running_intervals(), 1);
    assert!(host.unload_guard);
    assert_eq!(host.delete_target, None);
}

#[test]
fn test_entering_preview_twice_keeps_one_timer() {
    let mut host = FakeHost::loaded("");
    host.select("preview");
    host.select("preview");
    assert_eq!(host.running_intervals(), 1);

    host.advance(2000);
    assert_eq!(host.preview_frames, 4);
    assert_eq!(host.image_src, "/camera?3000");
}

#[test]
fn test_selecting_race_shows_first_image_and_bounds() {
    let mut host = FakeHost::loaded("");
    host.select("race7");

    assert_eq!(host.running_intervals(), 0);
    assert_eq!(host.image_src, "/static/race/race7/image_0001.jpg");
    assert_eq!(host.fetches.len(), 1);
    assert_eq!(host.fetches[0].url, "/image_count?race=race7");
    assert_eq!(host.delete_target, RaceId::new("race7"));

    host.answer_fetch(200, "12");
    assert_eq!(host.slider_max, 12);
    assert_eq!(host.slider_value, 1);
    assert_eq!(host.image_src, "/static/race/race7/image_0001.jpg");

    host.advance(2000);
    assert_eq!(host.preview_frames, 0);
}

#[test]
fn test_navigate_and_back_restores_path() {
    let mut host = host_with_race("12");
    let original = host.image_src.clone();

    host.send(Message::SliderInput { value: 5 });
    assert_eq!(host.image_src, "/static/race/race7/image_0005.jpg");
    assert_eq!(host.slider_value, 5);
    assert!(host.is_enabled(crate::model::Control::Slider));

    host.send(Message::SliderInput { value: 1 });
    assert_eq!(host.image_src, original);
}

#[test]
fn test_slider_input_is_clamped() {
    let mut host = host_with_race("12");
    host.send(Message::SliderInput { value: 40 });
    assert_eq!(host.image_src, "/static/race/race7/image_0012.jpg");
    host.send(Message::SliderInput { value: -3 });
    assert_eq!(host.image_src, "/static/race/race7/image_0001.jpg");
}

#[test]
fn test_arrow_keys_step_and_clamp() {
    let mut host = host_with_race("3");

    let effects = key(&mut host, "ArrowRight");
    assert!(effects.contains(&Effect::PreventDefault));
    assert_eq!(host.image_src, "/static/race/race7/image_0002.jpg");

    key(&mut host, "ArrowRight");
    key(&mut host, "ArrowRight");
    assert_eq!(host.image_src, "/static/race/race7/image_0003.jpg");

    for _ in 0..5 {
        key(&mut host, "ArrowLeft");
    }
    assert_eq!(host.image_src, "/static/race/race7/image_0001.jpg");
}

#[test]
fn test_arrow_keys_ignored_while_slider_focused_or_disabled() {
    let mut host = host_with_race("12");

    let effects = host.send(Message::KeyPressed {
        key: "ArrowRight".to_string(),
        slider_focused: true,
    });
    assert!(effects.is_empty());
    assert_eq!(host.slider_value, 1);

    host.push_race(READY);
    let effects = key(&mut host, "ArrowRight");
    assert!(effects.is_empty());
    assert_eq!(host.slider_value, 1);
}

#[test]
fn test_other_keys_are_not_consumed() {
    let mut host = host_with_race("12");
    assert!(key(&mut host, "Enter").is_empty());
}

#[test]
fn test_repeated_status_applies_once() {
    for status in [READY, IN_PROGRESS, NOT_READY, "🟣 Okänd"] {
        let mut host = FakeHost::loaded("");
        let first = host.push_race(status);
        assert!(!first.is_empty(), "{status} should apply");
        let controls = host.controls();
        let image = host.image_src.clone();

        for _ in 0..3 {
            assert!(host.push_race(status).is_empty(), "{status} repeated");
        }
        assert_eq!(host.controls(), controls);
        assert_eq!(host.image_src, image);
        assert_eq!(host.race_label, status);
    }
}

#[test]
fn test_not_ready_resets_from_every_prior_state() {
    for prior in [None, Some(READY), Some(IN_PROGRESS), Some(NOT_READY)] {
        let mut host = host_with_race("12");
        host.send(Message::SliderInput { value: 4 });
        if let Some(prior) = prior {
            host.push_race(prior);
        }

        host.push_race(NOT_READY);

        assert_eq!(host.controls(), (true, true, true, false), "after {prior:?}");
        assert_eq!(host.race_selector, "preview");
        assert_eq!(host.slider_max, 1);
        assert_eq!(host.slider_value, 1);
        assert_eq!(host.running_intervals(), 1);
        assert_eq!(host.delete_target, None);
        assert!(!host.app.guard().has_unsaved_changes());
        assert!(host.app.race_control().expected().is_none());
    }
}

#[test]
fn test_in_progress_locks_controls_from_every_prior_state() {
    for prior in [None, Some(READY), Some(IN_PROGRESS), Some(NOT_READY)] {
        let mut host = host_with_race("12");
        if let Some(prior) = prior {
            host.push_race(prior);
        }

        host.push_race(IN_PROGRESS);

        assert_eq!(host.controls(), (false, false, false, true), "after {prior:?}");
        assert_eq!(host.image_src, "/static/active_race.png");
        assert_eq!(host.running_intervals(), 0);
    }
}

#[test]
fn test_ready_stops_preview() {
    let mut host = FakeHost::loaded("");
    host.push_race(READY);
    assert_eq!(host.controls(), (false, false, false, true));
    assert_eq!(host.running_intervals(), 0);
    host.advance(5000);
    assert_eq!(host.preview_frames, 0);
}

#[test]
fn test_unknown_status_is_restrictive() {
    let mut host = FakeHost::loaded("");
    host.push_race("🟣 Något nytt");
    assert_eq!(host.controls(), (false, false, false, true));
    assert_eq!(host.race_label, "🟣 Något nytt");
}

#[test]
fn test_cage_status_only_updates_label() {
    let mut host = FakeHost::loaded("");
    let controls = host.controls();
    host.send(Message::Push {
        event: PushEvent::Cage("🔓 Öppen".to_string()),
    });
    assert_eq!(host.cage_label, "🔓 Öppen");
    assert_eq!(host.controls(), controls);
    assert_eq!(host.running_intervals(), 1);
}

#[test]
fn test_start_is_gated_by_ready_button() {
    let mut host = FakeHost::loaded("");

    host.send(Message::StopRequested);
    assert!(host.posts.is_empty());

    host.send(Message::StartRequested);
    assert_eq!(host.posts, vec![RaceCommand::Start]);
    assert_eq!(host.image_src, "/static/ready_for_race.png");
    assert_eq!(host.running_intervals(), 0);
    assert!(host.app.race_control().expected().is_some());

    host.push_race(READY);
    assert!(host.app.race_control().expected().is_none());

    host.send(Message::StartRequested);
    assert_eq!(host.posts, vec![RaceCommand::Start]);

    host.send(Message::StopRequested);
    assert_eq!(host.posts, vec![RaceCommand::Start, RaceCommand::Stop]);
}

#[test]
fn test_failed_start_keeps_optimistic_display() {
    let mut host = FakeHost::loaded("");
    host.send(Message::StartRequested);
    let effects = host.send(Message::CommandSettled {
        command: RaceCommand::Start,
        status: None,
    });
    assert!(effects.is_empty());
    assert_eq!(host.image_src, "/static/ready_for_race.png");
}

#[test]
fn test_selector_locked_during_race() {
    let mut host = FakeHost::loaded("");
    host.push_race(IN_PROGRESS);
    assert!(host.select("race7").is_empty());
    assert!(host.fetches.is_empty());
}

#[test]
fn test_training_loop_restarts_after_reset() {
    let mut host = FakeHost::loaded("?training=true");
    assert!(host.app.training().is_enabled());
    assert_eq!(host.pending_timeouts(), 1);

    host.advance(999);
    assert!(host.posts.is_empty());
    host.advance(1);
    assert_eq!(host.posts, vec![RaceCommand::Start]);

    host.push_race(READY);
    host.push_race(IN_PROGRESS);
    assert_eq!(host.pending_timeouts(), 0);

    host.push_race(NOT_READY);
    assert_eq!(host.pending_timeouts(), 1);
    host.advance(1000);
    assert_eq!(host.posts, vec![RaceCommand::Start, RaceCommand::Start]);
}

#[test]
fn test_manual_start_cancels_training_timeout() {
    let mut host = FakeHost::loaded("?training=true");
    host.advance(500);
    host.send(Message::StartRequested);
    assert_eq!(host.pending_timeouts(), 0);

    host.advance(2000);
    assert_eq!(host.posts, vec![RaceCommand::Start]);
}

#[test]
fn test_no_training_without_flag() {
    let mut host = FakeHost::loaded("?training=false");
    assert_eq!(host.pending_timeouts(), 0);
    host.advance(5000);
    assert!(host.posts.is_empty());
}

#[test]
fn test_stale_count_does_not_override_newer_selection() {
    let mut host = FakeHost::loaded("");
    host.select("race7");
    host.select("race8");
    let older = host.fetches.remove(0);
    let newer = host.fetches.remove(0);

    host.answer(newer, 200, "12");
    host.answer(older, 200, "40");

    assert_eq!(host.slider_max, 12);
    assert_eq!(host.image_src, "/static/race/race8/image_0001.jpg");
}

#[test]
fn test_count_arriving_after_reset_is_dropped() {
    let mut host = FakeHost::loaded("");
    host.select("race7");
    host.push_race(NOT_READY);
    host.answer_fetch(200, "12");
    assert_eq!(host.slider_max, 1);
}

#[test]
fn test_failed_count_keeps_bounds() {
    let mut host = host_with_race("12");
    host.select("race8");
    assert_eq!(host.slider_max, 1);
    host.answer_fetch(500, "");
    assert_eq!(host.slider_max, 1);

    host.select("race9");
    host.answer_fetch(200, "many");
    assert_eq!(host.slider_max, 1);
    key(&mut host, "ArrowRight");
    assert_eq!(host.image_src, "/static/race/race9/image_0001.jpg");
}

#[test]
fn test_navigation_before_count_stays_in_new_race() {
    let mut host = host_with_race("50");
    host.send(Message::SliderInput { value: 30 });

    host.select("race8");
    assert_eq!((host.slider_value, host.slider_max), (1, 1));
    assert_eq!(host.image_src, "/static/race/race8/image_0001.jpg");

    for _ in 0..10 {
        key(&mut host, "ArrowRight");
    }
    host.send(Message::SliderInput { value: 30 });
    assert_eq!(host.image_src, "/static/race/race8/image_0001.jpg");

    host.answer_fetch(200, "5");
    assert_eq!((host.slider_value, host.slider_max), (1, 5));
    assert_eq!(host.image_src, "/static/race/race8/image_0001.jpg");

    for _ in 0..10 {
        key(&mut host, "ArrowRight");
    }
    assert_eq!(host.image_src, "/static/race/race8/image_0005.jpg");
    assert_eq!(host.slider_value, 5);
}

#[test]
fn test_stream_preview_sets_source_once() {
    let mut config = StationConfig::default();
    config.preview.mode = PreviewMode::Stream;
    let mut host = FakeHost::new(config);
    host.load("", Default::default());

    assert_eq!(host.image_src, "/video_stream");
    assert_eq!(host.running_intervals(), 0);
    host.advance(2000);
    assert_eq!(host.preview_frames, 0);
}

#[test]
fn test_preview_selection_clears_delete_target() {
    let mut host = FakeHost::loaded("");
    host.select("race7");
    assert!(host.delete_target.is_some());
    host.select("preview");
    assert_eq!(host.delete_target, None);
    assert_eq!(host.running_intervals(), 1);
}
