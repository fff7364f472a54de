use eframe::egui::Color32;

use exoscope::projection::{Classification, HIGH_CONFIDENCE, LOW_CONFIDENCE};

// ---------------------------------------------------------------------------
// Classification colours
// ---------------------------------------------------------------------------

pub fn class_color(class: Classification) -> Color32 {
    let [r, g, b] = class.rgb();
    Color32::from_rgb(r, g, b)
}

/// Colour for a raw `classification` cell; unclassified rows stay neutral.
pub fn class_color_or_default(class: Option<Classification>) -> Color32 {
    class.map(class_color).unwrap_or(Color32::GRAY)
}

/// Green at or above the high threshold, red below the low one.
pub fn confidence_color(confidence: f64) -> Color32 {
    if confidence >= HIGH_CONFIDENCE {
        Color32::from_rgb(0x10, 0xb9, 0x81)
    } else if confidence < LOW_CONFIDENCE {
        Color32::from_rgb(0xef, 0x44, 0x44)
    } else {
        Color32::from_rgb(0xf5, 0x9e, 0x0b)
    }
}

/// Legend entries (label → colour) for the UI.
pub fn legend_entries() -> Vec<(&'static str, Color32)> {
    Classification::ALL
        .iter()
        .map(|&c| (c.label(), class_color(c)))
        .collect()
}
