//! Drawing for the fog map. Frame logic talks to a [`Surface`]; the canvas
//! backend lives in `canvas`.

pub mod canvas;
pub mod floating;
pub mod fog;

use std::ops::{Deref, DerefMut};

pub use canvas::CanvasSurface;
pub use floating::FloatingText;
pub use fog::{FogScene, MissionOverlay, render_base, render_frame};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeMode {
    /// Paint over existing pixels (source-over).
    Normal,
    /// Remove existing pixels where painted (destination-out).
    Erase,
}

#[derive(Clone, Copy, Debug)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    pub dash: Option<(f64, f64)>,
    pub shadow: Option<Shadow<'a>>,
}

#[derive(Clone, Copy, Debug)]
pub struct Shadow<'a> {
    pub blur: f64,
    pub color: &'a str,
}

pub trait Surface {
    fn set_mode(&mut self, mode: CompositeMode);
    fn clear(&mut self, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
    fn fill_circle(&mut self, x: f64, y: f64, r: f64, color: &str);
    /// Circle filled with a radial gradient; `stops` are (offset 0..1, colour).
    fn fill_radial(&mut self, x: f64, y: f64, r: f64, stops: &[(f64, &str)]);
    fn stroke_polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke);
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: &str, shadow: Option<Shadow>);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font: &str, color: &str);
}

/// Tracks the composite mode and restores it after scoped draws.
pub struct Painter<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    mode: CompositeMode,
}

impl<'s, S: Surface + ?Sized> Painter<'s, S> {
    pub fn new(surface: &'s mut S) -> Self {
        surface.set_mode(CompositeMode::Normal);
        Self { surface, mode: CompositeMode::Normal }
    }

    #[cfg(test)]
    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn with_erase(&mut self, draw: impl FnOnce(&mut Self)) {
        self.scoped(CompositeMode::Erase, draw);
    }

    pub fn with_normal(&mut self, draw: impl FnOnce(&mut Self)) {
        self.scoped(CompositeMode::Normal, draw);
    }

    fn scoped(&mut self, mode: CompositeMode, draw: impl FnOnce(&mut Self)) {
        let previous = self.mode;
        self.switch(mode);
        draw(self);
        self.switch(previous);
    }

    fn switch(&mut self, mode: CompositeMode) {
        if self.mode != mode {
            self.surface.set_mode(mode);
            self.mode = mode;
        }
    }
}

impl<S: Surface + ?Sized> Deref for Painter<'_, S> {
    type Target = S;
    fn deref(&self) -> &S {
        &*self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for Painter<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.surface
    }
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingSurface;
    use super::*;

    #[test]
    fn scoped_modes_restore_previous() {
        let mut surface = RecordingSurface::default();
        let mut painter = Painter::new(&mut surface);
        painter.with_erase(|p| {
            assert_eq!(p.mode(), CompositeMode::Erase);
            p.with_normal(|p| assert_eq!(p.mode(), CompositeMode::Normal));
            assert_eq!(p.mode(), CompositeMode::Erase);
        });
        assert_eq!(painter.mode(), CompositeMode::Normal);
        drop(painter);
        assert_eq!(surface.mode, Some(CompositeMode::Normal));
    }

    #[test]
    fn draws_carry_their_mode() {
        let mut surface = RecordingSurface::default();
        let mut painter = Painter::new(&mut surface);
        painter.fill_circle(1.0, 1.0, 1.0, "red");
        painter.with_erase(|p| p.fill_circle(2.0, 2.0, 1.0, "black"));
        drop(painter);
        assert_eq!(surface.erased().count(), 1);
        assert_eq!(surface.ops[0].0, CompositeMode::Normal);
    }
}
