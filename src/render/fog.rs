//! Per-frame fog compositing.
//!
//! Draw order matters: glows drawn before the fog fill sit beneath it, the
//! tunnel and the head hole are erased out of the fog, and the pickups and
//! floating labels land on top of everything.

use std::f64::consts::PI;

use super::floating::{self, FloatingText};
use super::{Painter, Shadow, Stroke, Surface};
use crate::config::{BACKGROUND_COLOR, FOG_COLOR, FOG_REVEAL_RADIUS_M, GRID_COLOR, TUNNEL_WIDEN_FACTOR};
use crate::geo::GeoPoint;
use crate::model::{MissionId, MysteryPoint};
use crate::state::MapView;

const ERASE_FULL: &str = "rgba(0,0,0,1)";
const ERASE_NONE: &str = "rgba(0,0,0,0)";
const ON_SCREEN_MARGIN: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MissionOverlay {
    pub mission: MissionId,
    pub target: Option<GeoPoint>,
}

pub struct FogScene<'a> {
    pub view: &'a MapView,
    pub path: &'a [GeoPoint],
    pub current: Option<GeoPoint>,
    pub mission: Option<MissionOverlay>,
    pub mystery: &'a [MysteryPoint],
    pub route: &'a [GeoPoint],
    pub now_ms: f64,
}

impl FogScene<'_> {
    fn pulse(&self, hz: f64) -> f64 {
        0.5 + 0.5 * (self.now_ms / 1000.0 * 2.0 * PI * hz).sin()
    }

    /// Reveal radius in pixels at the latitude currently in view.
    fn reveal_radius_px(&self) -> f64 {
        let lat = self.current.map(|p| p.lat).unwrap_or(self.view.center.lat);
        self.view.radius_px(FOG_REVEAL_RADIUS_M, lat)
    }

    fn target_on_screen(&self) -> Option<(f64, f64)> {
        let target = self.mission?.target?;
        let (x, y) = self.view.project(target);
        self.view.is_on_screen(x, y, ON_SCREEN_MARGIN).then_some((x, y))
    }
}

/// Plain stand-in for the base map: background, grid, position marker.
pub fn render_base<S: Surface + ?Sized>(surface: &mut S, view: &MapView, current: Option<GeoPoint>) {
    let mut p = Painter::new(surface);
    p.fill_rect(0.0, 0.0, view.width, view.height, BACKGROUND_COLOR);
    let step_deg = 0.002 * 2f64.powf((15.0 - view.zoom).max(0.0).floor());
    let top_left = view.unproject(0.0, 0.0);
    let bottom_right = view.unproject(view.width, view.height);
    let mut lng = (top_left.lng / step_deg).floor() * step_deg;
    while lng <= bottom_right.lng {
        let (x, _) = view.project(GeoPoint::new(lng, top_left.lat));
        p.fill_rect(x, 0.0, 1.0, view.height, GRID_COLOR);
        lng += step_deg;
    }
    let mut lat = (bottom_right.lat / step_deg).floor() * step_deg;
    while lat <= top_left.lat {
        let (_, y) = view.project(GeoPoint::new(top_left.lng, lat));
        p.fill_rect(0.0, y, view.width, 1.0, GRID_COLOR);
        lat += step_deg;
    }
    if let Some(pos) = current {
        let (x, y) = view.project(pos);
        p.fill_circle(x, y, 9.0, "#ffffff");
        p.fill_circle(x, y, 6.0, "#1f6feb");
    }
}

pub fn render_frame<S: Surface + ?Sized>(
    surface: &mut S,
    scene: &FogScene,
    floating_texts: &mut Vec<FloatingText>,
) {
    let view = scene.view;
    let radius = scene.reveal_radius_px();
    let mut p = Painter::new(surface);
    p.clear(view.width, view.height);

    // 1. target glow, hidden under the fog
    if let Some((x, y)) = scene.target_on_screen() {
        let pulse = scene.pulse(2.5);
        p.fill_radial(
            x,
            y,
            30.0 + 10.0 * pulse,
            &[(0.0, "rgba(229,72,77,0.85)"), (1.0, "rgba(229,72,77,0)")],
        );
        p.fill_circle(x, y, 6.0, "#e5484d");
    }

    // 2. fog
    p.fill_rect(0.0, 0.0, view.width, view.height, FOG_COLOR);

    // 3. route
    if scene.route.len() >= 2 {
        let pts: Vec<(f64, f64)> = scene.route.iter().map(|g| view.project(*g)).collect();
        p.stroke_polyline(&pts, &Stroke { color: "rgba(255,255,255,0.9)", width: 9.0, dash: None, shadow: None });
        p.stroke_polyline(&pts, &Stroke { color: "#e5484d", width: 4.0, dash: Some((10.0, 8.0)), shadow: None });
    }

    // 4. forced target glow on top of the fog
    if scene.mission.is_some_and(|m| m.mission.forces_target_glow()) {
        if let Some((x, y)) = scene.target_on_screen() {
            let pulse = scene.pulse(2.5);
            p.fill_radial(
                x,
                y,
                60.0 + 20.0 * pulse,
                &[(0.0, "rgba(255,140,0,0.9)"), (0.5, "rgba(255,140,0,0.45)"), (1.0, "rgba(255,140,0,0)")],
            );
            p.fill_circle(x, y, 8.0, "#ff8c00");
        }
    }

    // 5. unfound mystery glows
    let pulse = scene.pulse(1.5);
    for m in scene.mystery.iter().filter(|m| !m.found) {
        let (x, y) = view.project(m.position());
        if !view.is_on_screen(x, y, ON_SCREEN_MARGIN) {
            continue;
        }
        p.fill_radial(
            x,
            y,
            18.0 + 4.0 * pulse,
            &[(0.0, "rgba(255,196,0,0.95)"), (0.6, "rgba(255,140,0,0.5)"), (1.0, "rgba(255,140,0,0)")],
        );
        p.fill_circle(x, y, 3.0, "#ffffff");
    }

    p.with_erase(|p| {
        // 6. one stroke for the whole tunnel
        if scene.path.len() >= 2 {
            let mut pts: Vec<(f64, f64)> = scene.path.iter().map(|g| view.project(*g)).collect();
            if let Some(cur) = scene.current {
                pts.push(view.project(cur));
            }
            p.stroke_polyline(
                &pts,
                &Stroke {
                    color: ERASE_FULL,
                    width: radius * 2.0 * TUNNEL_WIDEN_FACTOR,
                    dash: None,
                    shadow: Some(Shadow { blur: radius, color: ERASE_FULL }),
                },
            );
        }
        // 7. soft head of the tunnel
        let mut holes: Vec<GeoPoint> = scene.current.into_iter().collect();
        if scene.path.len() == 1 {
            holes.push(scene.path[0]);
        }
        for hole in holes {
            let (x, y) = view.project(hole);
            p.fill_radial(x, y, radius * 1.5, &[(0.0, ERASE_FULL), (1.0, ERASE_NONE)]);
        }
    });

    p.with_normal(|p| {
        // 8. pickups stay visible regardless of fog
        if scene.mission.is_some_and(|m| m.mission.is_incentive()) {
            let bounce = (scene.now_ms / 1000.0 * 2.0 * PI).sin().abs() * 6.0;
            for m in scene.mystery.iter().filter(|m| !m.found) {
                let (x, y) = view.project(m.position());
                if !view.is_on_screen(x, y, ON_SCREEN_MARGIN) {
                    continue;
                }
                let cy = y - bounce;
                let s = 10.0;
                p.fill_polygon(
                    &[(x, cy - s), (x + s * 0.7, cy), (x, cy + s), (x - s * 0.7, cy)],
                    "#ffc400",
                    Some(Shadow { blur: 12.0, color: "rgba(255,196,0,0.9)" }),
                );
            }
        }

        // 9. floating labels
        floating::prune(floating_texts, scene.now_ms);
        for t in floating_texts.iter() {
            let (x, y) = view.project(t.at);
            let color = format!("rgba(46,160,67,{:.3})", t.opacity(scene.now_ms));
            p.fill_text(&t.text, x, y - 24.0 - t.rise_px(scene.now_ms), "bold 16px sans-serif", &color);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CompositeMode;
    use crate::render::recording::{Op, RecordingSurface};

    fn view() -> MapView {
        MapView { width: 800.0, height: 600.0, ..MapView::default() }
    }

    fn scene<'a>(view: &'a MapView, path: &'a [GeoPoint], current: Option<GeoPoint>) -> FogScene<'a> {
        FogScene { view, path, current, mission: None, mystery: &[], route: &[], now_ms: 0.0 }
    }

    fn render(scene: &FogScene) -> RecordingSurface {
        let mut surface = RecordingSurface::default();
        render_frame(&mut surface, scene, &mut Vec::new());
        surface
    }

    #[test]
    fn start_position_always_gets_a_hole() {
        let v = view();
        let surface = render(&scene(&v, &[], Some(v.center)));
        let holes: Vec<_> = surface.erased().collect();
        assert_eq!(holes.len(), 1);
        match holes[0] {
            Op::Radial { x, y, r } => {
                assert!((x - 400.0).abs() < 1e-6 && (y - 300.0).abs() < 1e-6);
                let expected = v.radius_px(FOG_REVEAL_RADIUS_M, v.center.lat) * 1.5;
                assert!((r - expected).abs() < 1e-9);
            }
            other => panic!("expected a radial hole, got {other:?}"),
        }
    }

    #[test]
    fn single_point_path_gets_a_hole_without_current() {
        let v = view();
        let path = [v.center];
        let surface = render(&scene(&v, &path, None));
        assert!(surface.erased().any(|op| matches!(op, Op::Radial { .. })));
        assert!(!surface.erased().any(|op| matches!(op, Op::Polyline { .. })));
    }

    #[test]
    fn tunnel_is_one_stroke_through_path_and_current() {
        let v = view();
        let path = [v.center, v.center.offset_meters(100.0, 0.0), v.center.offset_meters(200.0, 50.0)];
        let current = v.center.offset_meters(250.0, 80.0);
        let surface = render(&scene(&v, &path, Some(current)));
        let strokes: Vec<_> = surface.erased().filter(|op| matches!(op, Op::Polyline { .. })).collect();
        assert_eq!(strokes.len(), 1);
        let radius = v.radius_px(FOG_REVEAL_RADIUS_M, current.lat);
        let width = radius * 2.0 * TUNNEL_WIDEN_FACTOR;
        assert!(TUNNEL_WIDEN_FACTOR > 1.0);
        assert_eq!(strokes[0], &Op::Polyline { points: 4, width, dashed: false });
    }

    #[test]
    fn fog_precedes_erase_and_mode_is_restored() {
        let v = view();
        let surface = render(&scene(&v, &[v.center], Some(v.center)));
        let fog = surface.position(|op| matches!(op, Op::Rect { color } if color == FOG_COLOR)).expect("fog fill");
        let first_erase = surface.ops.iter().position(|(m, _)| *m == CompositeMode::Erase).expect("erase");
        assert!(fog < first_erase);
        assert_eq!(surface.mode, Some(CompositeMode::Normal));
    }

    #[test]
    fn target_glow_below_fog_and_forced_above_for_navigation() {
        let v = view();
        let mut s = scene(&v, &[], Some(v.center));
        s.mission = Some(MissionOverlay { mission: MissionId::Navigation, target: Some(v.center.offset_meters(300.0, 0.0)) });
        let surface = render(&s);
        let fog = surface.position(|op| matches!(op, Op::Rect { color } if color == FOG_COLOR)).unwrap();
        let radials: Vec<usize> = surface
            .ops
            .iter()
            .enumerate()
            .filter(|(_, (m, op))| *m == CompositeMode::Normal && matches!(op, Op::Radial { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(radials.len(), 2);
        assert!(radials[0] < fog && radials[1] > fog);

        s.mission = Some(MissionOverlay { mission: MissionId::Detour, target: s.mission.and_then(|m| m.target) });
        let detour = render(&s);
        let normal_radials = detour
            .ops
            .iter()
            .filter(|(m, op)| *m == CompositeMode::Normal && matches!(op, Op::Radial { .. }))
            .count();
        assert_eq!(normal_radials, 1);
    }

    #[test]
    fn offscreen_target_is_skipped() {
        let v = view();
        let mut s = scene(&v, &[], None);
        s.mission = Some(MissionOverlay { mission: MissionId::Navigation, target: Some(GeoPoint::new(0.0, 0.0)) });
        let surface = render(&s);
        assert!(!surface.ops.iter().any(|(_, op)| matches!(op, Op::Radial { .. })));
    }

    #[test]
    fn found_mystery_points_are_not_drawn() {
        let v = view();
        let mut found = MysteryPoint::new("a", v.center.offset_meters(50.0, 50.0));
        found.found = true;
        let mystery = [found, MysteryPoint::new("b", v.center.offset_meters(-50.0, 50.0))];
        let mut s = scene(&v, &[], None);
        s.mystery = &mystery;
        let surface = render(&s);
        let glows = surface.ops.iter().filter(|(_, op)| matches!(op, Op::Radial { .. })).count();
        assert_eq!(glows, 1);
        assert!(!surface.ops.iter().any(|(_, op)| matches!(op, Op::Polygon)));
    }

    #[test]
    fn incentive_pickups_drawn_after_erase() {
        let v = view();
        let mystery = [MysteryPoint::new("b", v.center.offset_meters(-50.0, 50.0))];
        let mut s = scene(&v, &[], Some(v.center));
        s.mystery = &mystery;
        s.mission = Some(MissionOverlay { mission: MissionId::Detour, target: None });
        let surface = render(&s);
        let diamond = surface.ops.iter().position(|(_, op)| matches!(op, Op::Polygon)).expect("diamond");
        let erase = surface.ops.iter().rposition(|(m, _)| *m == CompositeMode::Erase).unwrap();
        assert!(diamond > erase);
        assert_eq!(surface.ops[diamond].0, CompositeMode::Normal);
    }

    #[test]
    fn route_is_stroked_on_top_of_fog() {
        let v = view();
        let route = [v.center, v.center.offset_meters(300.0, 300.0)];
        let mut s = scene(&v, &[], None);
        s.route = &route;
        let surface = render(&s);
        let dashed = surface.position(|op| matches!(op, Op::Polyline { dashed: true, .. })).expect("route");
        let fog = surface.position(|op| matches!(op, Op::Rect { color } if color == FOG_COLOR)).unwrap();
        assert!(dashed > fog);
    }

    #[test]
    fn floating_text_drawn_then_aged_out() {
        let v = view();
        let mut texts = vec![FloatingText::new("+100 XP", v.center, 0.0)];
        let mut s = scene(&v, &[], None);
        s.now_ms = 500.0;
        let mut surface = RecordingSurface::default();
        render_frame(&mut surface, &s, &mut texts);
        assert!(surface.ops.iter().any(|(_, op)| matches!(op, Op::Text { text } if text == "+100 XP")));
        s.now_ms = 1600.0;
        render_frame(&mut RecordingSurface::default(), &s, &mut texts);
        assert!(texts.is_empty());
    }
}
