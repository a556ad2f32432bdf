pub const UNKNOWN_RATIO: &str = "unknown";

// Scanned in order; the first minimal distance wins, so ties resolve to the
// earlier row.
const RATIO_TABLE: &[(f64, &str)] = &[
    (9.0 / 16.0, "916"),
    (16.0 / 9.0, "169"),
    (1.0, "11"),
    (4.0 / 5.0, "45"),
    (3.0 / 4.0, "34"),
    (4.0 / 3.0, "43"),
];

/// Map probed dimensions to the nearest canonical aspect-ratio tag.
pub fn classify_ratio(width: Option<u32>, height: Option<u32>) -> &'static str {
    let (Some(width), Some(height)) = (width, height) else {
        return UNKNOWN_RATIO;
    };
    if width == 0 || height == 0 {
        return UNKNOWN_RATIO;
    }
    let actual = f64::from(width) / f64::from(height);

    let mut best = RATIO_TABLE[0].1;
    let mut best_distance = (actual - RATIO_TABLE[0].0).abs();
    for &(canonical, label) in &RATIO_TABLE[1..] {
        let distance = (actual - canonical).abs();
        if distance < best_distance {
            best = label;
            best_distance = distance;
        }
    }
    best
}
