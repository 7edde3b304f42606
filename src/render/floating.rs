// Short-lived score labels ("+100 XP") that float up and fade out
use crate::config::{FLOATING_TEXT_LIFETIME_MS, FLOATING_TEXT_RISE_PX};
use crate::geo::GeoPoint;

#[derive(Clone, Debug, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub at: GeoPoint,
    pub created_ms: f64,
}

impl FloatingText {
    pub fn new(text: impl Into<String>, at: GeoPoint, created_ms: f64) -> Self {
        Self { text: text.into(), at, created_ms }
    }

    /// Lifetime fraction in [0, 1].
    fn t(&self, now_ms: f64) -> f64 {
        ((now_ms - self.created_ms) / FLOATING_TEXT_LIFETIME_MS).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.created_ms >= FLOATING_TEXT_LIFETIME_MS
    }

    pub fn rise_px(&self, now_ms: f64) -> f64 {
        self.t(now_ms) * FLOATING_TEXT_RISE_PX
    }

    /// 1 - easeOutCubic(t)
    pub fn opacity(&self, now_ms: f64) -> f64 {
        (1.0 - self.t(now_ms)).powi(3)
    }
}

pub fn prune(texts: &mut Vec<FloatingText>, now_ms: f64) {
    texts.retain(|t| !t.is_expired(now_ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: GeoPoint = GeoPoint::new(8.65, 49.87);

    #[test]
    fn fades_and_rises() {
        let t = FloatingText::new("+100 XP", AT, 1000.0);
        assert_eq!(t.opacity(1000.0), 1.0);
        assert_eq!(t.rise_px(1000.0), 0.0);
        let mid = 1000.0 + FLOATING_TEXT_LIFETIME_MS / 2.0;
        assert!((t.opacity(mid) - 0.125).abs() < 1e-9);
        assert!((t.rise_px(mid) - FLOATING_TEXT_RISE_PX / 2.0).abs() < 1e-9);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let mut texts = vec![
            FloatingText::new("old", AT, 0.0),
            FloatingText::new("new", AT, 1000.0),
        ];
        prune(&mut texts, 1600.0);
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, "new");
        prune(&mut texts, 2500.0);
        assert!(texts.is_empty());
    }
}
