//! Browser runtime for the station page.
//!
//! Looks up the page elements once, subscribes every event explicitly, and turns
//! DOM events, timer callbacks, fetch completions and push frames into messages.
//! Effects returned by the controller are applied here through `web_sys`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    BeforeUnloadEvent, CanvasRenderingContext2d, CloseEvent, Document, Element, Event, EventTarget,
    Headers, HtmlButtonElement, HtmlCanvasElement, HtmlElement, HtmlFormElement, HtmlImageElement,
    HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent, MessageEvent,
    MouseEvent, Request, RequestInit, Response, WebSocket, Window,
};

use crate::StationApp;
use crate::config::StationConfig;
use crate::constants::{MARKER_SIZE, dom};
use crate::effect::{DrawOp, Effect, Effects, TimerId};
use crate::message::{Message, PageLoad};
use crate::model::{Control, FieldValue, Point};
use crate::push::{self, CONNECT_PACKET, PONG_PACKET, PushFrame};
use crate::storage::{KeyValueStore, LocalStorage, MemoryStore, StorageError};

thread_local! {
    /// The running controller. Only touched from event callbacks, never re-entrantly.
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Trace).is_err() {
        web_sys::console::log_1(&"Logger already initialized".into());
    }

    let store = PageStore::open();
    let config = StationConfig::load_from_store(&store).unwrap_or_default();
    log::set_max_level(config.log_level.to_level_filter());

    if let Err(e) = boot(config, store) {
        log::error!("❌ Station controller failed to start: {:?}", e);
    }
}

/// Durable store backing the calibration line. Falls back to memory when
/// localStorage is blocked.
enum PageStore {
    Local(LocalStorage),
    Memory(MemoryStore),
}

impl PageStore {
    fn open() -> Self {
        match LocalStorage::open() {
            Ok(storage) => Self::Local(storage),
            Err(e) => {
                log::warn!("{}; calibration will not persist", e);
                Self::Memory(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for PageStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Local(store) => store.get_item(key),
            Self::Memory(store) => store.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(store) => store.set_item(key, value),
            Self::Memory(store) => store.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Local(store) => store.remove_item(key),
            Self::Memory(store) => store.remove_item(key),
        }
    }
}

/// Handles to the page elements the controller drives.
#[derive(Clone)]
struct Page {
    window: Window,
    document: Document,
    image: HtmlImageElement,
    slider: HtmlInputElement,
    race_select: HtmlSelectElement,
    ready_button: HtmlButtonElement,
    stop_button: HtmlButtonElement,
    race_status: HtmlElement,
    cage_status: HtmlElement,
    form: Option<HtmlFormElement>,
    canvas: Option<(HtmlCanvasElement, CanvasRenderingContext2d)>,
    calibrate_button: Option<HtmlElement>,
    delete_button: Option<HtmlButtonElement>,
    delete_input: Option<HtmlInputElement>,
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element #{} has an unexpected type", id)))
}

fn optional_element<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    match element(document, id) {
        Ok(el) => Some(el),
        Err(e) => {
            log::debug!("{:?}", e);
            None
        }
    }
}

impl Page {
    fn bind(window: Window) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let canvas = match optional_element::<HtmlCanvasElement>(&document, dom::CANVAS) {
            Some(canvas) => {
                let context = canvas
                    .get_context("2d")?
                    .ok_or_else(|| JsValue::from_str("Canvas has no 2d context"))?
                    .dyn_into::<CanvasRenderingContext2d>()?;
                Some((canvas, context))
            }
            None => None,
        };

        Ok(Self {
            image: element(&document, dom::IMAGE)?,
            slider: element(&document, dom::SLIDER)?,
            race_select: element(&document, dom::RACE_SELECT)?,
            ready_button: element(&document, dom::READY_BUTTON)?,
            stop_button: element(&document, dom::STOP_BUTTON)?,
            race_status: element(&document, dom::RACE_STATUS)?,
            cage_status: element(&document, dom::CAGE_STATUS)?,
            form: optional_element(&document, dom::SETTINGS_FORM),
            canvas,
            calibrate_button: optional_element(&document, dom::CALIBRATE_BUTTON),
            delete_button: optional_element(&document, dom::DELETE_RACE_BUTTON),
            delete_input: optional_element(&document, dom::DELETE_RACE_INPUT),
            document,
            window,
        })
    }

    fn slider_focused(&self) -> bool {
        self.document
            .active_element()
            .map(|el| el.id() == dom::SLIDER)
            .unwrap_or(false)
    }

    fn field(&self, name: &str) -> Option<Element> {
        let form = self.form.as_ref()?;
        form.query_selector(&format!("[name=\"{}\"]", name))
            .ok()
            .flatten()
    }
}

/// Read a named form control. Unchecked radio buttons have no value.
fn field_value(element: &Element) -> Option<(String, FieldValue)> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        let name = input.name();
        if name.is_empty() {
            return None;
        }
        return match input.type_().as_str() {
            "checkbox" => Some((name, FieldValue::Checkbox(input.checked()))),
            "radio" if !input.checked() => None,
            _ => Some((name, FieldValue::Text(input.value()))),
        };
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some((select.name(), FieldValue::Text(select.value())));
    }
    if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        return Some((area.name(), FieldValue::Text(area.value())));
    }
    None
}

fn set_field_value(element: &Element, value: &FieldValue) {
    match (element.dyn_ref::<HtmlInputElement>(), value) {
        (Some(input), FieldValue::Checkbox(checked)) => input.set_checked(*checked),
        (Some(input), FieldValue::Text(text)) => input.set_value(text),
        (None, FieldValue::Text(text)) => {
            if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
                select.set_value(text);
            } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
                area.set_value(text);
            }
        }
        (None, FieldValue::Checkbox(_)) => {}
    }
}

fn capture_form(form: Option<&HtmlFormElement>) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();
    let Some(form) = form else {
        return fields;
    };
    let Ok(nodes) = form.query_selector_all("[name]") else {
        return fields;
    };
    for i in 0..nodes.length() {
        let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        if let Some((name, value)) = field_value(&element) {
            fields.insert(name, value);
        }
    }
    fields
}

/// A running interval and the callback it invokes.
struct ActiveInterval {
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

struct Runtime {
    app: StationApp<PageStore>,
    page: Page,
    intervals: HashMap<TimerId, ActiveInterval>,
    timeouts: HashMap<TimerId, i32>,
    unload_guard: Closure<dyn FnMut(BeforeUnloadEvent)>,
    /// Held for the page lifetime; the socket is driven by its own callbacks.
    _socket: Option<WebSocket>,
}

fn millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Feed a message to the controller and apply its effects.
///
/// Returns true when the effects asked to suppress the browser default.
fn dispatch(message: Message) -> bool {
    RUNTIME.with(|slot| {
        let Ok(mut slot) = slot.try_borrow_mut() else {
            log::error!("Re-entrant dispatch dropped: {:?}", message);
            return false;
        };
        let Some(runtime) = slot.as_mut() else {
            log::warn!("Controller not running, dropped {:?}", message);
            return false;
        };
        let effects = runtime.app.update(message);
        runtime.apply(effects)
    })
}

fn should_intercept_unload() -> bool {
    RUNTIME.with(|slot| match slot.try_borrow() {
        Ok(runtime) => runtime
            .as_ref()
            .map(|rt| rt.app.should_intercept_unload())
            .unwrap_or(false),
        Err(_) => false,
    })
}

impl Runtime {
    fn apply(&mut self, effects: Effects) -> bool {
        let mut prevent_default = false;
        for effect in effects {
            if let Err(e) = self.apply_one(effect, &mut prevent_default) {
                log::error!("❌ Failed to apply effect: {:?}", e);
            }
        }
        prevent_default
    }

    fn apply_one(&mut self, effect: Effect, prevent_default: &mut bool) -> Result<(), JsValue> {
        let page = &self.page;
        match effect {
            Effect::SetImageSource { src } => page.image.set_src(&src),
            Effect::SetControlEnabled { control, enabled } => match control {
                Control::ReadyButton => page.ready_button.set_disabled(!enabled),
                Control::RaceSelect => page.race_select.set_disabled(!enabled),
                Control::Slider => page.slider.set_disabled(!enabled),
                Control::StopButton => page.stop_button.set_disabled(!enabled),
            },
            Effect::SetSliderBounds { max, value } => {
                page.slider.set_max(&max.to_string());
                page.slider.set_value(&value.to_string());
            }
            Effect::SetSliderValue { value } => page.slider.set_value(&value.to_string()),
            Effect::FocusSlider => page.slider.focus()?,
            Effect::SetRaceSelector { value } => page.race_select.set_value(&value),
            Effect::PreventDefault => *prevent_default = true,

            Effect::StartInterval { timer, period } => {
                let callback = Closure::<dyn FnMut()>::new(move || {
                    dispatch(Message::PreviewTick {
                        timer,
                        timestamp_ms: now_ms(),
                    });
                });
                let handle = page
                    .window
                    .set_interval_with_callback_and_timeout_and_arguments_0(
                        callback.as_ref().unchecked_ref(),
                        millis(period),
                    )?;
                self.intervals.insert(
                    timer,
                    ActiveInterval {
                        handle,
                        _callback: callback,
                    },
                );
            }
            Effect::CancelInterval { timer } => {
                if let Some(interval) = self.intervals.remove(&timer) {
                    page.window.clear_interval_with_handle(interval.handle);
                }
            }
            Effect::ScheduleTimeout { timer, delay } => {
                let callback = Closure::once_into_js(move || {
                    dispatch(Message::TrainingSettled { timer });
                });
                let handle = page
                    .window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(
                        callback.unchecked_ref(),
                        millis(delay),
                    )?;
                self.timeouts.insert(timer, handle);
            }
            Effect::CancelTimeout { timer } => {
                if let Some(handle) = self.timeouts.remove(&timer) {
                    page.window.clear_timeout_with_handle(handle);
                }
            }

            Effect::FetchImageCount { url, generation } => {
                spawn_local(async move {
                    let (status, body) = match fetch_text(&url).await {
                        Ok(response) => response,
                        Err(e) => {
                            log::error!("❌ Image count request failed: {:?}", e);
                            (0, String::new())
                        }
                    };
                    dispatch(Message::ImageCountLoaded {
                        generation,
                        status,
                        body,
                    });
                });
            }
            Effect::PostRaceCommand { command, url, body } => {
                spawn_local(async move {
                    let status = match post_json(&url, &body).await {
                        Ok(status) => Some(status),
                        Err(e) => {
                            log::debug!("POST {} failed: {:?}", url, e);
                            None
                        }
                    };
                    dispatch(Message::CommandSettled { command, status });
                });
            }

            Effect::SetRaceStatusLabel { text } => page.race_status.set_inner_text(&text),
            Effect::SetCageStatusLabel { text } => page.cage_status.set_inner_text(&text),

            Effect::SetFieldChanged { name, changed } => {
                if let Some(field) = page.field(&name) {
                    field
                        .class_list()
                        .toggle_with_force(dom::CHANGED_CLASS, changed)?;
                }
            }
            Effect::SetFieldValue { name, value } => {
                if let Some(field) = page.field(&name) {
                    set_field_value(&field, &value);
                }
            }
            Effect::SetFormUnsaved { unsaved } => {
                if let Some(form) = &page.form {
                    form.class_list()
                        .toggle_with_force(dom::UNSAVED_CLASS, unsaved)?;
                }
            }
            Effect::InstallUnloadGuard => page.window.add_event_listener_with_callback(
                "beforeunload",
                self.unload_guard.as_ref().unchecked_ref(),
            )?,
            Effect::RemoveUnloadGuard => page.window.remove_event_listener_with_callback(
                "beforeunload",
                self.unload_guard.as_ref().unchecked_ref(),
            )?,

            Effect::Draw { op } => {
                if let Some((canvas, ctx)) = &page.canvas {
                    draw(canvas, ctx, op);
                }
            }
            Effect::SetDeleteTarget { race } => {
                if let Some(button) = &page.delete_button {
                    button.set_disabled(race.is_none());
                }
                if let Some(input) = &page.delete_input {
                    input.set_value(race.as_ref().map(|r| r.as_str()).unwrap_or(""));
                }
            }
        }
        Ok(())
    }
}

fn draw(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d, op: DrawOp) {
    match op {
        DrawOp::Clear => ctx.clear_rect(
            0.0,
            0.0,
            f64::from(canvas.width()),
            f64::from(canvas.height()),
        ),
        DrawOp::Marker(p) => ctx.fill_rect(
            p.x - MARKER_SIZE / 2.0,
            p.y - MARKER_SIZE / 2.0,
            MARKER_SIZE,
            MARKER_SIZE,
        ),
        DrawOp::Segment(from, to) => {
            ctx.begin_path();
            ctx.move_to(from.x, from.y);
            ctx.line_to(to.x, to.y);
            ctx.stroke();
        }
    }
}

async fn fetch_text(url: &str) -> Result<(u16, String), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    let status = response.status();
    let body = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .unwrap_or_default();
    Ok((status, body))
}

async fn post_json(url: &str, body: &str) -> Result<u16, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(url, &init)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    Ok(response.status())
}

/// Subscribe a closure to an event and keep it alive for the page lifetime.
fn listen<T>(target: &EventTarget, event: &str, closure: Closure<T>) -> Result<(), JsValue>
where
    T: ?Sized + WasmClosure,
{
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn subscribe(page: &Page) -> Result<(), JsValue> {
    let slider_page = page.clone();
    let on_key = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let consumed = dispatch(Message::KeyPressed {
            key: event.key(),
            slider_focused: slider_page.slider_focused(),
        });
        if consumed {
            event.prevent_default();
        }
    });
    listen(&page.document, "keydown", on_key)?;

    let slider = page.slider.clone();
    listen(&page.slider, "input", Closure::<dyn FnMut(Event)>::new(move |_: Event| {
        match slider.value().trim().parse::<i64>() {
            Ok(value) => {
                dispatch(Message::SliderInput { value });
            }
            Err(e) => log::warn!("Unreadable slider value {:?}: {}", slider.value(), e),
        }
    }))?;

    let select = page.race_select.clone();
    listen(&page.race_select, "change", Closure::<dyn FnMut(Event)>::new(move |_: Event| {
        dispatch(Message::RaceSelected {
            value: select.value(),
        });
    }))?;

    listen(&page.ready_button, "click", Closure::<dyn FnMut(Event)>::new(|_: Event| {
        dispatch(Message::StartRequested);
    }))?;
    listen(&page.stop_button, "click", Closure::<dyn FnMut(Event)>::new(|_: Event| {
        dispatch(Message::StopRequested);
    }))?;

    if let Some(form) = &page.form {
        listen(form, "change", Closure::<dyn FnMut(Event)>::new(|event: Event| {
            let field = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| field_value(&el));
            if let Some((name, value)) = field {
                dispatch(Message::FieldChanged { name, value });
            }
        }))?;
        listen(form, "submit", Closure::<dyn FnMut(Event)>::new(|_: Event| {
            dispatch(Message::FormSubmitted);
        }))?;
    }

    if let Some(button) = &page.calibrate_button {
        listen(button, "click", Closure::<dyn FnMut(Event)>::new(|_: Event| {
            dispatch(Message::CalibrationModeToggled { active: true });
        }))?;
    }

    if let Some((canvas, _)) = &page.canvas {
        let surface = canvas.clone();
        listen(canvas, "click", Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let rect = surface.get_bounding_client_rect();
            let point = Point::new(
                f64::from(event.client_x()) - rect.left(),
                f64::from(event.client_y()) - rect.top(),
            );
            dispatch(Message::CanvasClicked { point });
        }))?;
    }

    Ok(())
}

fn push_url(window: &Window, path: &str) -> Result<String, JsValue> {
    let location = window.location();
    let scheme = if location.protocol()? == "https:" {
        "wss"
    } else {
        "ws"
    };
    Ok(format!("{}://{}{}", scheme, location.host()?, path))
}

fn connect_push(url: &str) -> Result<WebSocket, JsValue> {
    let socket = WebSocket::new(url)?;

    let sender = socket.clone();
    let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        let Some(text) = event.data().as_string() else {
            log::debug!("Ignoring binary push frame");
            return;
        };
        match push::decode_frame(&text) {
            Ok(PushFrame::Event(event)) => {
                dispatch(Message::Push { event });
            }
            Ok(PushFrame::Open) => {
                if let Err(e) = sender.send_with_str(CONNECT_PACKET) {
                    log::warn!("Push connect failed: {:?}", e);
                }
            }
            Ok(PushFrame::Ping) => {
                if let Err(e) = sender.send_with_str(PONG_PACKET) {
                    log::warn!("Push pong failed: {:?}", e);
                }
            }
            Ok(PushFrame::Ignored) => {}
            Err(e) => log::warn!("⚠️  {}", e),
        }
    });
    socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    let onclose = Closure::<dyn FnMut(CloseEvent)>::new(|event: CloseEvent| {
        log::warn!("📡 Push channel closed (code {})", event.code());
    });
    socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    log::info!("📡 Push channel connecting to {}", url);
    Ok(socket)
}

fn boot(config: StationConfig, store: PageStore) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let page = Page::bind(window.clone())?;
    subscribe(&page)?;

    let push_path = config.endpoints.push_socket.clone();
    let load = PageLoad {
        query: window.location().search()?,
        form: capture_form(page.form.as_ref()),
    };

    let unload_guard =
        Closure::<dyn FnMut(BeforeUnloadEvent)>::new(|event: BeforeUnloadEvent| {
            if should_intercept_unload() {
                event.prevent_default();
                event.set_return_value("unsaved");
            }
        });

    let runtime = Runtime {
        app: StationApp::new(config, store),
        page,
        intervals: HashMap::new(),
        timeouts: HashMap::new(),
        unload_guard,
        _socket: None,
    };
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));

    dispatch(Message::Loaded(load));

    let socket = connect_push(&push_url(&window, &push_path)?)?;
    RUNTIME.with(|slot| {
        if let Some(runtime) = slot.borrow_mut().as_mut() {
            runtime._socket = Some(socket);
        }
    });
    Ok(())
}
