use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{CompositeMode, Shadow, Stroke, Surface};
use crate::error::{AppError, js_message};

/// `Surface` over a 2d canvas context. JS failures inside a frame are dropped.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, AppError> {
        if !canvas.is_connected() {
            return Err(AppError::Canvas("canvas detached".into()));
        }
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| AppError::Canvas(js_message(&e)))?
            .ok_or_else(|| AppError::Canvas("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| AppError::Canvas("context is not 2d".into()))?;
        Ok(Self { ctx })
    }

    fn apply_shadow(&self, shadow: Option<Shadow>) {
        match shadow {
            Some(s) => {
                self.ctx.set_shadow_blur(s.blur);
                self.ctx.set_shadow_color(s.color);
            }
            None => {
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_shadow_color("rgba(0,0,0,0)");
            }
        }
    }

    fn trace(&self, points: &[(f64, f64)]) {
        self.ctx.begin_path();
        for (i, (x, y)) in points.iter().enumerate() {
            if i == 0 {
                self.ctx.move_to(*x, *y);
            } else {
                self.ctx.line_to(*x, *y);
            }
        }
    }
}

impl Surface for CanvasSurface {
    fn set_mode(&mut self, mode: CompositeMode) {
        let op = match mode {
            CompositeMode::Normal => "source-over",
            CompositeMode::Erase => "destination-out",
        };
        self.ctx.set_global_composite_operation(op).ok();
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(x, y, w, h);
    }

    fn fill_circle(&mut self, x: f64, y: f64, r: f64, color: &str) {
        self.ctx.begin_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.arc(x, y, r.max(0.0), 0.0, PI * 2.0).ok();
        self.ctx.fill();
    }

    fn fill_radial(&mut self, x: f64, y: f64, r: f64, stops: &[(f64, &str)]) {
        let r = r.max(0.5);
        let Ok(gradient) = self.ctx.create_radial_gradient(x, y, 0.0, x, y, r) else {
            return;
        };
        for (offset, color) in stops {
            gradient.add_color_stop(*offset as f32, color).ok();
        }
        self.ctx.begin_path();
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.ctx.arc(x, y, r, 0.0, PI * 2.0).ok();
        self.ctx.fill();
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        self.ctx.save();
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.set_line_width(stroke.width);
        self.ctx.set_stroke_style_str(stroke.color);
        if let Some((on, off)) = stroke.dash {
            let dash = js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off));
            self.ctx.set_line_dash(&dash).ok();
        }
        self.apply_shadow(stroke.shadow);
        self.trace(points);
        self.ctx.stroke();
        self.ctx.restore();
    }

    fn fill_polygon(&mut self, points: &[(f64, f64)], color: &str, shadow: Option<Shadow>) {
        self.ctx.save();
        self.apply_shadow(shadow);
        self.ctx.set_fill_style_str(color);
        self.trace(points);
        self.ctx.close_path();
        self.ctx.fill();
        self.ctx.restore();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str) {
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_text(text, x, y).ok();
        self.ctx.set_text_align("start");
    }
}
