use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, HtmlElement, PositionOptions};
use yew::prelude::*;

use super::{camera_controls::CameraControls, settings_modal::SettingsModal, stats_panel::StatsPanel};
use crate::config::{
    DEFAULT_GOAL_HINT, DEFAULT_LOCATION, GEOLOCATION_TIMEOUT_MS, MYSTERY_COUNT, SNAPSHOT_INTERVAL_MS, Settings,
    XP_PER_COLLECTIBLE,
};
use crate::error::{AppError, js_message};
use crate::geo::{GeoPoint, haversine_distance_m, initial_bearing_deg};
use crate::model::{ArrivalMetrics, MissionMode, MissionOutcome, MysteryPoint, calculate_level};
use crate::render::{CanvasSurface, FloatingText, FogScene, MissionOverlay, render_base, render_frame};
use crate::state::arrival::Observation;
use crate::state::gps::GpsFix;
use crate::state::{ArrivalDetector, GpsTrack, Guidance, MapView, VirtualWalk, VisitedPath, WalkTarget, mystery};
use crate::storage::{PersistScheduler, ProfileRecord, ProfileStore, open_store};
use crate::util::{bearing_arrow, format_distance, now_ms};

const DRAG_THRESHOLD_PX: f64 = 4.0;
const BUTTON_ZOOM_FACTOR: f64 = 2.0;

#[derive(Properties, PartialEq, Clone)]
pub struct FogMapProps {
    pub user_id: AttrValue,
    #[prop_or_default]
    pub mission: Option<MissionMode>,
    #[prop_or_default]
    pub on_path_change: Callback<Rc<Vec<GeoPoint>>>,
}

#[derive(Clone, Copy, PartialEq)]
enum Locating {
    Virtual,
    Searching,
    Live,
    Fallback,
}

/// Mutable cells shared by the frame loops and the input handlers.
#[derive(Clone)]
struct Shared {
    user_id: AttrValue,
    view: Rc<RefCell<MapView>>,
    path: Rc<RefCell<VisitedPath>>,
    walk: Rc<RefCell<VirtualWalk>>,
    mystery: Rc<RefCell<Vec<MysteryPoint>>>,
    floating: Rc<RefCell<Vec<FloatingText>>>,
    marker: Rc<RefCell<Option<GeoPoint>>>,
    mission: Rc<RefCell<Option<MissionMode>>>,
    settings: Rc<RefCell<Settings>>,
    detector: Rc<RefCell<ArrivalDetector>>,
    gps: Rc<RefCell<GpsTrack>>,
    scheduler: Rc<RefCell<PersistScheduler>>,
    store: Rc<Box<dyn ProfileStore>>,
    on_path_change: Rc<RefCell<Callback<Rc<Vec<GeoPoint>>>>>,
    alive: Rc<RefCell<bool>>,
    guidance: UseStateHandle<Option<Guidance>>,
    committed: UseStateHandle<Rc<Vec<GeoPoint>>>,
}

// Borrows are always released before a callback or state setter runs: yew may
// re-render this component synchronously from inside them.
impl Shared {
    fn active_mission(&self) -> Option<MissionMode> {
        self.mission.borrow().clone().filter(|m| m.active)
    }

    fn is_virtual(&self) -> bool {
        self.mission.borrow().as_ref().is_none_or(|m| m.is_virtual)
    }

    fn metrics(&self) -> ArrivalMetrics {
        let distance_walked_m =
            if self.is_virtual() { self.walk.borrow().distance_walked_m } else { self.gps.borrow().walked_m() };
        ArrivalMetrics {
            distance_walked_m,
            collected: self.walk.borrow().collected,
            total_mystery: self.mystery.borrow().len() as u32,
            path: self.path.borrow().all().to_vec(),
        }
    }

    fn load_profile(&self) {
        match self.store.load(&self.user_id) {
            Ok(Some(record)) => {
                log::info!("restored {} visited points", record.visited_points.len());
                *self.path.borrow_mut() = VisitedPath::from_points(record.visited_points);
            }
            Ok(None) => {}
            Err(e) => log::warn!("loading profile failed: {e}"),
        }
    }

    /// Publishes the hot path to UI state if it grew.
    fn publish(&self) {
        let snapshot = self.path.borrow_mut().take_snapshot();
        let Some(snapshot) = snapshot else {
            return;
        };
        self.scheduler.borrow_mut().mark_dirty();
        let on_change = self.on_path_change.borrow().clone();
        self.committed.set(snapshot.clone());
        on_change.emit(snapshot);
    }

    fn save(&self) -> Result<(), AppError> {
        let record = ProfileRecord {
            user_id: self.user_id.to_string(),
            username: self.user_id.to_string(),
            visited_points: self.path.borrow().all().to_vec(),
        };
        self.store.save(&record)
    }

    fn flush(&self, now: f64) {
        let mission_active = self.active_mission().is_some();
        if !self.scheduler.borrow().should_flush(now, mission_active) {
            return;
        }
        if let Err(e) = self.save() {
            log::warn!("saving path failed: {e}");
        }
        self.scheduler.borrow_mut().flushed(now);
    }

    fn spawn_xp_label(&self, at: GeoPoint, now: f64) {
        self.floating.borrow_mut().push(FloatingText::new(format!("+{XP_PER_COLLECTIBLE} XP"), at, now));
    }
}

/// One frame of the virtual walk. Returns whether another frame is needed.
fn walk_step(shared: &Shared) -> bool {
    let now = now_ms();
    let mission = shared.active_mission();
    let target = mission
        .as_ref()
        .and_then(|m| m.target.map(|target| WalkTarget { target, arrival_radius_m: m.arrival_radius_m() }));
    let report = {
        let mut mystery = shared.mystery.borrow_mut();
        let mut path = shared.path.borrow_mut();
        shared.walk.borrow_mut().tick(now, &mut mystery, &mut path, target)
    };
    let Some(report) = report else {
        return false;
    };

    *shared.marker.borrow_mut() = Some(report.position);
    if shared.settings.borrow().camera_follow {
        shared.view.borrow_mut().recenter(report.position);
    }
    for point in &report.collected {
        log::debug!("collected {}", point.id);
        shared.spawn_xp_label(point.position(), now);
    }

    if let Some(m) = &mission {
        if m.mission_id.is_incentive() {
            for point in report.collected {
                m.on_collectible_found.emit(point);
            }
        }
        if let Some(g) = report.guidance {
            shared.guidance.set(Some(g));
            m.on_distance_update.emit(g.distance_m);
        }
        if let Some(metrics) = report.arrival {
            log::info!(
                "arrived at {} target after {:.0} m ({} collected)",
                m.mission_id.as_str(),
                metrics.distance_walked_m,
                metrics.collected
            );
            m.on_arrival.emit(metrics);
        }
    }

    if report.finished {
        shared.publish();
    }
    !report.finished
}

/// Real-mode position update: path, camera and the arrival check.
/// A fallback position only moves the marker and the guidance arrow.
fn apply_real_position(shared: &Shared, fix: GpsFix) {
    let p = fix.position();
    match fix {
        GpsFix::Live(_) => {
            shared.gps.borrow_mut().live(p, &mut shared.path.borrow_mut());
        }
        GpsFix::Fallback(_) => {
            if !shared.gps.borrow_mut().fallback(p) {
                return;
            }
        }
    }
    *shared.marker.borrow_mut() = Some(p);
    if shared.settings.borrow().camera_follow {
        shared.view.borrow_mut().recenter(p);
    }

    let Some(m) = shared.active_mission() else {
        return;
    };
    let Some(target) = m.target else {
        return;
    };
    let observation = match fix {
        GpsFix::Live(_) => shared.detector.borrow_mut().observe(p, target, m.arrival_radius_m()),
        GpsFix::Fallback(_) => Observation { distance_m: haversine_distance_m(p, target), arrived_now: false },
    };
    shared.guidance.set(Some(Guidance {
        distance_m: observation.distance_m,
        bearing_deg: initial_bearing_deg(p, target),
    }));
    if matches!(fix, GpsFix::Live(_)) {
        m.on_distance_update.emit(observation.distance_m);
    }
    if observation.arrived_now {
        log::info!("arrived at {} target (gps)", m.mission_id.as_str());
        m.on_arrival.emit(shared.metrics());
    }
}

/// `GeolocationPosition.coords` read through reflection.
fn position_from_js(pos: &JsValue) -> Option<GeoPoint> {
    let coords = js_sys::Reflect::get(pos, &JsValue::from_str("coords")).ok()?;
    let read = |key: &str| js_sys::Reflect::get(&coords, &JsValue::from_str(key)).ok()?.as_f64();
    GeoPoint::checked(read("longitude")?, read("latitude")?)
}

fn js_error_message(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| js_message(err))
}

/// Subscribes to the device position. The returned closure unsubscribes.
fn watch_position(shared: Shared, locating: UseStateHandle<Locating>) -> Box<dyn FnOnce()> {
    let Some(window) = web_sys::window() else {
        return Box::new(|| ());
    };
    locating.set(Locating::Searching);
    let settled = Rc::new(RefCell::new(false));

    let fallback: Rc<dyn Fn(&str)> = {
        let shared = shared.clone();
        let locating = locating.clone();
        let settled = settled.clone();
        Rc::new(move |reason: &str| {
            if settled.replace(true) {
                return;
            }
            log::warn!("geolocation: {reason}, using default location");
            locating.set(Locating::Fallback);
            apply_real_position(&shared, GpsFix::Fallback(DEFAULT_LOCATION));
        })
    };

    let on_fix = {
        let settled = settled.clone();
        Closure::wrap(Box::new(move |pos: JsValue| {
            let Some(p) = position_from_js(&pos) else {
                log::warn!("geolocation: unreadable position");
                return;
            };
            *settled.borrow_mut() = true;
            locating.set(Locating::Live);
            apply_real_position(&shared, GpsFix::Live(p));
        }) as Box<dyn FnMut(_)>)
    };
    let on_error = {
        let fallback = fallback.clone();
        Closure::wrap(Box::new(move |err: JsValue| {
            fallback(&js_error_message(&err));
        }) as Box<dyn FnMut(_)>)
    };
    let on_timeout = {
        let fallback = fallback.clone();
        Closure::wrap(Box::new(move || fallback("no fix in time")) as Box<dyn FnMut()>)
    };

    let timeout_id = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            on_timeout.as_ref().unchecked_ref(),
            GEOLOCATION_TIMEOUT_MS,
        )
        .ok();
    let watch = window
        .navigator()
        .geolocation()
        .map_err(|e| AppError::Geolocation(js_message(&e)))
        .and_then(|geo| {
            let options = PositionOptions::new();
            options.set_enable_high_accuracy(true);
            geo.watch_position_with_error_callback_and_options(
                on_fix.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                &options,
            )
            .map(|id| (geo, id))
            .map_err(|e| AppError::Geolocation(js_message(&e)))
        });
    let watch = match watch {
        Ok(w) => Some(w),
        Err(e) => {
            fallback(&e.to_string());
            None
        }
    };

    Box::new(move || {
        if let Some((geo, id)) = &watch {
            geo.clear_watch(*id);
        }
        if let Some(id) = timeout_id {
            window.clear_timeout_with_handle(id);
        }
        let _keep_alive = (&on_fix, &on_error, &on_timeout);
    })
}

#[function_component(FogMap)]
pub fn fog_map(props: &FogMapProps) -> Html {
    let container_ref = use_node_ref();
    let base_ref = use_node_ref();
    let fog_ref = use_node_ref();
    let draw_ref = use_mut_ref(|| None::<Rc<dyn Fn()>>);
    let store = use_memo((), |_| open_store());
    let settings = use_state(Settings::load);
    let show_settings = use_state(|| false);
    let locating = use_state(|| Locating::Virtual);

    let shared = Shared {
        user_id: props.user_id.clone(),
        view: use_mut_ref(MapView::default),
        path: use_mut_ref(VisitedPath::default),
        walk: use_mut_ref(VirtualWalk::default),
        mystery: use_mut_ref(Vec::new),
        floating: use_mut_ref(Vec::new),
        marker: use_mut_ref(|| None),
        mission: use_mut_ref(|| props.mission.clone()),
        settings: use_mut_ref(|| (*settings).clone()),
        detector: use_mut_ref(ArrivalDetector::default),
        gps: use_mut_ref(GpsTrack::default),
        scheduler: use_mut_ref(PersistScheduler::default),
        store,
        on_path_change: use_mut_ref(|| props.on_path_change.clone()),
        alive: use_mut_ref(|| true),
        guidance: use_state(|| None),
        committed: use_state(|| Rc::new(Vec::new())),
    };

    // Frame callbacks read these cells, never captured props.
    {
        let shared = shared.clone();
        let on_path_change = props.on_path_change.clone();
        use_effect_with(props.mission.clone(), move |mission| {
            *shared.mission.borrow_mut() = mission.clone();
            *shared.on_path_change.borrow_mut() = on_path_change;
            || ()
        });
    }
    {
        let shared = shared.clone();
        let draw_ref = draw_ref.clone();
        use_effect_with((*settings).clone(), move |s| {
            s.save();
            *shared.settings.borrow_mut() = s.clone();
            if let Some(f) = &*draw_ref.borrow() {
                f();
            }
            || ()
        });
    }

    // Canvases, render loop, walk loop, input and snapshot timer.
    {
        let shared = shared.clone();
        let container_ref = container_ref.clone();
        let base_ref = base_ref.clone();
        let fog_ref = fog_ref.clone();
        let draw_ref = draw_ref.clone();
        use_effect_with((), move |_| {
            let cleanup = setup_map(shared, container_ref, base_ref, fog_ref, draw_ref);
            if let Err(e) = &cleanup {
                log::error!("map setup failed: {e}");
            }
            move || {
                if let Ok(cleanup) = cleanup {
                    cleanup();
                }
            }
        });
    }

    // New mission activation: fresh accumulators, arrival latch and pickups.
    {
        let shared = shared.clone();
        let mission = props.mission.clone();
        let key = props.mission.as_ref().map(|m| {
            let start = m.start_position.map(|p| (p.lng.to_bits(), p.lat.to_bits()));
            (m.activation_key(), start)
        });
        use_effect_with(key, move |_| {
            {
                let mut walk = shared.walk.borrow_mut();
                walk.cancel();
                walk.reset_mission();
            }
            shared.detector.borrow_mut().reset();
            shared.gps.borrow_mut().reset_distance();
            shared.floating.borrow_mut().clear();

            let is_virtual = mission.as_ref().is_none_or(|m| m.is_virtual);
            let start = mission.as_ref().and_then(|m| m.start_position);
            if is_virtual {
                let origin = {
                    let marker = *shared.marker.borrow();
                    start.or(marker).or_else(|| shared.path.borrow().last()).unwrap_or(DEFAULT_LOCATION)
                };
                *shared.marker.borrow_mut() = Some(origin);
                shared.walk.borrow_mut().set_position(origin);
                shared.path.borrow_mut().append(origin);
                shared.view.borrow_mut().recenter(origin);
            }

            let origin = (*shared.marker.borrow()).or(start).unwrap_or(DEFAULT_LOCATION);
            let points = match mission.as_ref().and_then(|m| m.badges.as_deref()) {
                Some(badges) => mystery::from_badges(badges),
                None => {
                    let goal = mission.as_ref().and_then(|m| m.target).unwrap_or(DEFAULT_GOAL_HINT);
                    mystery::generate(origin, goal, MYSTERY_COUNT, &mut rand::thread_rng())
                }
            };
            log::debug!("{} mystery points ready", points.len());
            *shared.mystery.borrow_mut() = points;
            shared.guidance.set(None);
            shared.publish();
            || ()
        });
    }

    // Device position only outside virtual mode.
    {
        let shared = shared.clone();
        let locating = locating.clone();
        let is_virtual = props.mission.as_ref().is_none_or(|m| m.is_virtual);
        use_effect_with(is_virtual, move |is_virtual| {
            let cleanup: Box<dyn FnOnce()> = if *is_virtual {
                locating.set(Locating::Virtual);
                Box::new(|| ())
            } else {
                watch_position(shared, locating)
            };
            move || cleanup()
        });
    }

    let redraw = {
        let draw_ref = draw_ref.clone();
        move || {
            if let Some(f) = &*draw_ref.borrow() {
                f();
            }
        }
    };
    let zoom_by = |factor: f64| {
        let view = shared.view.clone();
        let redraw = redraw.clone();
        Callback::from(move |_: ()| {
            {
                let mut v = view.borrow_mut();
                let (cx, cy) = (v.width * 0.5, v.height * 0.5);
                v.zoom_at(cx, cy, factor);
            }
            redraw();
        })
    };
    let on_center = {
        let shared = shared.clone();
        let redraw = redraw.clone();
        Callback::from(move |_| {
            let marker = *shared.marker.borrow();
            if let Some(p) = marker {
                shared.view.borrow_mut().recenter(p);
            }
            redraw();
        })
    };
    let open_settings = {
        let show = show_settings.clone();
        Callback::from(move |_| show.set(true))
    };
    let close_settings = {
        let show = show_settings.clone();
        Callback::from(move |_| show.set(false))
    };
    let toggle_follow = {
        let settings = settings.clone();
        Callback::from(move |_| {
            settings.set(Settings { camera_follow: !settings.camera_follow, ..(*settings).clone() });
        })
    };
    let toggle_route = {
        let settings = settings.clone();
        Callback::from(move |_| {
            settings.set(Settings { show_route: !settings.show_route, ..(*settings).clone() });
        })
    };
    let reset_path = {
        let shared = shared.clone();
        let show = show_settings.clone();
        Callback::from(move |_| {
            let marker = *shared.marker.borrow();
            {
                let mut path = shared.path.borrow_mut();
                path.clear();
                if let Some(p) = marker {
                    path.append(p);
                }
            }
            log::info!("visited path reset");
            shared.publish();
            show.set(false);
        })
    };
    let give_up = {
        let shared = shared.clone();
        Callback::from(move |_| {
            let Some(m) = shared.active_mission() else {
                return;
            };
            shared.walk.borrow_mut().cancel();
            let outcome = MissionOutcome { mission: m.mission_id, gave_up: true, metrics: shared.metrics() };
            log::info!("gave up {} after {:.0} m", m.mission_id.as_str(), outcome.metrics.distance_walked_m);
            m.on_outcome.emit(outcome);
        })
    };

    let committed = (*shared.committed).clone();
    let stats = calculate_level(&committed);
    let mission_active = props.mission.as_ref().is_some_and(|m| m.active);
    let has_target = props.mission.as_ref().is_some_and(|m| m.active && m.target.is_some());
    let status = match *locating {
        Locating::Virtual => "Simulation: tippe auf die Karte, um dorthin zu gehen",
        Locating::Searching => "Standort wird gesucht …",
        Locating::Live => "GPS aktiv",
        Locating::Fallback => "Kein Standort verfügbar, Startpunkt wird verwendet",
    };

    let canvas_style = "position:absolute; inset:0; width:100%; height:100%; display:block;";
    html! {
        <div ref={container_ref} style="position:absolute; inset:0; overflow:hidden; background:#0d1117;">
            <canvas ref={base_ref} style={canvas_style}></canvas>
            <canvas ref={fog_ref} style={format!("{canvas_style} cursor:crosshair;")}></canvas>
            <StatsPanel stats={stats} visited={committed.len()} />
            {
                if let (true, Some(g)) = (has_target, *shared.guidance) {
                    html! {
                        <div style="position:absolute; top:12px; left:50%; transform:translateX(-50%); background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:8px 14px; display:flex; gap:10px; align-items:center; font-size:16px;">
                            <span style="font-size:24px;">{ bearing_arrow(g.bearing_deg) }</span>
                            <span style="font-variant-numeric:tabular-nums;">{ format_distance(g.distance_m) }</span>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            <div style="position:absolute; left:12px; bottom:12px; background:rgba(22,27,34,0.9); border:1px solid #30363d; border-radius:8px; padding:6px 10px; font-size:12px; opacity:0.85;">{ status }</div>
            {
                if mission_active {
                    html! { <button onclick={give_up} style="position:absolute; right:12px; top:12px;">{"Aufgeben"}</button> }
                } else {
                    html! {}
                }
            }
            <CameraControls
                on_zoom_in={zoom_by(BUTTON_ZOOM_FACTOR)}
                on_zoom_out={zoom_by(1.0 / BUTTON_ZOOM_FACTOR)}
                on_center={on_center}
                on_settings={open_settings}
            />
            <SettingsModal
                show={*show_settings}
                on_close={close_settings}
                camera_follow={settings.camera_follow}
                on_toggle_follow={toggle_follow}
                show_route={settings.show_route}
                on_toggle_route={toggle_route}
                on_reset_path={reset_path}
            />
        </div>
    }
}

fn listen(target: &web_sys::EventTarget, name: &str, cb: &js_sys::Function) -> Result<(), AppError> {
    target
        .add_event_listener_with_callback(name, cb)
        .map_err(|e| AppError::Canvas(js_message(&e)))
}

fn setup_map(
    shared: Shared,
    container_ref: NodeRef,
    base_ref: NodeRef,
    fog_ref: NodeRef,
    draw_ref: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
) -> Result<impl FnOnce(), AppError> {
    let window = web_sys::window().ok_or_else(|| AppError::Canvas("no window".into()))?;
    let container = container_ref
        .cast::<HtmlElement>()
        .ok_or_else(|| AppError::Canvas("map container missing".into()))?;
    let base = base_ref
        .cast::<HtmlCanvasElement>()
        .ok_or_else(|| AppError::Canvas("base canvas missing".into()))?;
    let fog = fog_ref
        .cast::<HtmlCanvasElement>()
        .ok_or_else(|| AppError::Canvas("fog canvas missing".into()))?;

    if shared.active_mission().is_none() {
        shared.load_profile();
    }

    let fit_canvases = {
        let (base, fog, view) = (base.clone(), fog.clone(), shared.view.clone());
        move || {
            let rect = container.get_bounding_client_rect();
            let (w, h) = (rect.width().max(1.0), rect.height().max(1.0));
            for canvas in [&base, &fog] {
                canvas.set_width(w as u32);
                canvas.set_height(h as u32);
            }
            view.borrow_mut().resize(w, h);
        }
    };
    fit_canvases();

    // Draw closure. Surfaces are acquired lazily; a frame without them is skipped.
    let draw_closure: Rc<dyn Fn()> = {
        let shared = shared.clone();
        let (base, fog) = (base.clone(), fog.clone());
        let surfaces = RefCell::new(None::<(CanvasSurface, CanvasSurface)>);
        Rc::new(move || {
            if surfaces.borrow().is_none() {
                match (CanvasSurface::from_canvas(&base), CanvasSurface::from_canvas(&fog)) {
                    (Ok(b), Ok(f)) => *surfaces.borrow_mut() = Some((b, f)),
                    _ => return,
                }
            }
            let mut surfaces = surfaces.borrow_mut();
            let Some((base_surface, fog_surface)) = surfaces.as_mut() else {
                return;
            };
            let view = shared.view.borrow();
            let path = shared.path.borrow();
            let mystery = shared.mystery.borrow();
            let mission = shared.mission.borrow();
            let show_route = shared.settings.borrow().show_route;
            let current = *shared.marker.borrow();
            let active = mission.as_ref().filter(|m| m.active);
            let scene = FogScene {
                view: &view,
                path: path.all(),
                current,
                mission: active.map(|m| MissionOverlay { mission: m.mission_id, target: m.target }),
                mystery: &mystery,
                route: match active {
                    Some(m) if show_route => m.route.as_slice(),
                    _ => &[],
                },
                now_ms: now_ms(),
            };
            render_base(base_surface, &view, current);
            render_frame(fog_surface, &scene, &mut shared.floating.borrow_mut());
        })
    };
    *draw_ref.borrow_mut() = Some(draw_closure.clone());
    (draw_closure)();

    // Render loop
    let raf_id = Rc::new(RefCell::new(None));
    let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    {
        let raf_id_clone = raf_id.clone();
        let alive = shared.alive.clone();
        let window_loop = window.clone();
        let closure_cell_clone = closure_cell.clone();
        *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if !*alive.borrow() {
                return;
            }
            draw_closure();
            if let Some(cb) = closure_cell_clone.borrow().as_ref() {
                if let Ok(id) = window_loop.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    *raf_id_clone.borrow_mut() = Some(id);
                }
            }
        }) as Box<dyn FnMut()>));
        if let Some(cb) = closure_cell.borrow().as_ref() {
            if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                *raf_id.borrow_mut() = Some(id);
            }
        }
    }

    // Walk loop, started by a click, stops itself at progress 1.
    let walk_raf: Rc<RefCell<Option<i32>>> = Rc::new(RefCell::new(None));
    let walk_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    {
        let shared = shared.clone();
        let walk_raf = walk_raf.clone();
        let walk_cell_clone = walk_cell.clone();
        let window_loop = window.clone();
        *walk_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            *walk_raf.borrow_mut() = None;
            if !*shared.alive.borrow() {
                return;
            }
            if walk_step(&shared) && *shared.alive.borrow() {
                if let Some(cb) = walk_cell_clone.borrow().as_ref() {
                    if let Ok(id) = window_loop.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        *walk_raf.borrow_mut() = Some(id);
                    }
                }
            }
        }) as Box<dyn FnMut()>));
    }

    // Snapshot + debounced persistence
    let snapshot_tick = {
        let shared = shared.clone();
        Closure::wrap(Box::new(move || {
            shared.publish();
            shared.flush(now_ms());
        }) as Box<dyn FnMut()>)
    };
    let snapshot_tick_id = window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            snapshot_tick.as_ref().unchecked_ref(),
            SNAPSHOT_INTERVAL_MS as i32,
        )
        .map_err(|e| AppError::Canvas(js_message(&e)))?;

    // Wheel zoom around the cursor
    let wheel_cb = {
        let view = shared.view.clone();
        Closure::wrap(Box::new(move |e: web_sys::WheelEvent| {
            e.prevent_default();
            let factor = (-e.delta_y() * 0.0015).exp();
            view.borrow_mut().zoom_at(e.offset_x() as f64, e.offset_y() as f64, factor);
        }) as Box<dyn FnMut(_)>)
    };
    listen(&fog, "wheel", wheel_cb.as_ref().unchecked_ref())?;

    let mousedown_cb = {
        let view = shared.view.clone();
        Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
            let mut v = view.borrow_mut();
            v.panning = true;
            v.dragged = false;
            v.last_x = e.client_x() as f64;
            v.last_y = e.client_y() as f64;
        }) as Box<dyn FnMut(_)>)
    };
    let mousemove_cb = {
        let view = shared.view.clone();
        Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
            let mut v = view.borrow_mut();
            if !v.panning {
                return;
            }
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            let (dx, dy) = (x - v.last_x, y - v.last_y);
            if !v.dragged && dx.abs() + dy.abs() < DRAG_THRESHOLD_PX {
                return;
            }
            v.dragged = true;
            v.pan_by(dx, dy);
            v.last_x = x;
            v.last_y = y;
        }) as Box<dyn FnMut(_)>)
    };
    let mouseup_cb = {
        let view = shared.view.clone();
        Closure::wrap(Box::new(move |_e: web_sys::MouseEvent| {
            view.borrow_mut().panning = false;
        }) as Box<dyn FnMut(_)>)
    };
    // Click-to-walk; a drag is not a click.
    let click_cb = {
        let shared = shared.clone();
        let walk_cell = walk_cell.clone();
        let walk_raf = walk_raf.clone();
        let window = window.clone();
        Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
            if shared.view.borrow().dragged || !shared.is_virtual() {
                return;
            }
            let dest = shared.view.borrow().unproject(e.offset_x() as f64, e.offset_y() as f64);
            let marker = *shared.marker.borrow();
            let begun = {
                let mut walk = shared.walk.borrow_mut();
                let origin = walk.origin(marker, DEFAULT_LOCATION);
                walk.begin(origin, dest, now_ms())
            };
            if !begun || walk_raf.borrow().is_some() {
                return;
            }
            if let Some(cb) = walk_cell.borrow().as_ref() {
                if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    *walk_raf.borrow_mut() = Some(id);
                }
            }
        }) as Box<dyn FnMut(_)>)
    };
    let contextmenu_cb =
        Closure::wrap(Box::new(move |e: web_sys::Event| e.prevent_default()) as Box<dyn FnMut(_)>);
    let resize_cb = Closure::wrap(Box::new(move |_e: web_sys::Event| fit_canvases()) as Box<dyn FnMut(_)>);

    listen(&fog, "mousedown", mousedown_cb.as_ref().unchecked_ref())?;
    listen(&fog, "mousemove", mousemove_cb.as_ref().unchecked_ref())?;
    listen(&fog, "click", click_cb.as_ref().unchecked_ref())?;
    listen(&fog, "contextmenu", contextmenu_cb.as_ref().unchecked_ref())?;
    listen(&window, "mouseup", mouseup_cb.as_ref().unchecked_ref())?;
    listen(&window, "resize", resize_cb.as_ref().unchecked_ref())?;

    // Cleanup
    Ok(move || {
        *shared.alive.borrow_mut() = false;
        let _ = fog.remove_event_listener_with_callback("wheel", wheel_cb.as_ref().unchecked_ref());
        let _ = fog.remove_event_listener_with_callback("mousedown", mousedown_cb.as_ref().unchecked_ref());
        let _ = fog.remove_event_listener_with_callback("mousemove", mousemove_cb.as_ref().unchecked_ref());
        let _ = fog.remove_event_listener_with_callback("click", click_cb.as_ref().unchecked_ref());
        let _ = fog.remove_event_listener_with_callback("contextmenu", contextmenu_cb.as_ref().unchecked_ref());
        let _ = window.remove_event_listener_with_callback("mouseup", mouseup_cb.as_ref().unchecked_ref());
        let _ = window.remove_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref());
        window.clear_interval_with_handle(snapshot_tick_id);
        if let Some(id) = *raf_id.borrow() {
            let _ = window.cancel_animation_frame(id);
        }
        if let Some(id) = walk_raf.borrow_mut().take() {
            let _ = window.cancel_animation_frame(id);
        }
        // Both loops hold their own cell; emptying it breaks the cycle.
        *closure_cell.borrow_mut() = None;
        *walk_cell.borrow_mut() = None;
        if shared.active_mission().is_none() {
            if let Err(e) = shared.save() {
                log::warn!("saving path on teardown failed: {e}");
            }
        }
        *draw_ref.borrow_mut() = None;
        let _keep_alive = (
            &snapshot_tick,
            &wheel_cb,
            &mousedown_cb,
            &mousemove_cb,
            &mouseup_cb,
            &click_cb,
            &contextmenu_cb,
            &resize_cb,
        );
    })
}
