// Small browser helpers shared by the components

/// Monotonic milliseconds from `performance.now()`, wall clock if unavailable.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

pub fn iso_timestamp() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

pub fn format_duration(ms: f64) -> String {
    let secs = (ms.max(0.0) / 1000.0).round() as u64;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{:01}:{:02}:{:02}", h, m, s)
    } else if m > 0 {
        format!("{:02}:{:02}", m, s)
    } else {
        format!("{}s", s)
    }
}

pub fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{:.0} m", meters.max(0.0))
    }
}

/// Eight-way compass arrow for a bearing in degrees.
pub fn bearing_arrow(bearing_deg: f64) -> &'static str {
    const ARROWS: [&str; 8] = ["↑", "↗", "→", "↘", "↓", "↙", "←", "↖"];
    let idx = ((bearing_deg.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    ARROWS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(4_400.0), "4s");
        assert_eq!(format_duration(65_000.0), "01:05");
        assert_eq!(format_duration(3_725_000.0), "1:02:05");
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(7_730.0), "7.7 km");
    }

    #[test]
    fn arrows_follow_compass() {
        assert_eq!(bearing_arrow(0.0), "↑");
        assert_eq!(bearing_arrow(359.0), "↑");
        assert_eq!(bearing_arrow(90.0), "→");
        assert_eq!(bearing_arrow(200.0), "↓");
    }
}
