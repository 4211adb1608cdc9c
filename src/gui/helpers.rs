//! Helper functions for the GUI
//!
//! Formatting for the form hints and the procedurally drawn window icon.

use eframe::egui;
use image::{Rgba, RgbaImage};

const ICON_SIZE: u32 = 64;

/// Expected send rate for a run, e.g. `3 tx every 1000ms (~3.00 tx/s)`
pub fn send_rate_hint(accounts: usize, interval_ms: u64) -> String {
    if accounts == 0 || interval_ms == 0 {
        return "no transactions will be sent".to_string();
    }
    let per_second = accounts as f64 * 1000.0 / interval_ms as f64;
    format!(
        "{} tx every {}ms (~{:.2} tx/s)",
        accounts, interval_ms, per_second
    )
}

/// Size of the payload once encoded, e.g. `12 bytes`
pub fn payload_size_label(payload: &str) -> String {
    match payload.len() {
        1 => "1 byte".to_string(),
        n => format!("{} bytes", n),
    }
}

/// Shorten a long single-line string for a label, keeping the head.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// Draw the window icon: an amber quill stroke on a dark rounded tile.
pub fn render_icon() -> RgbaImage {
    let background = Rgba([18, 18, 22, 255]);
    let border = Rgba([255, 183, 3, 255]);
    let ink = Rgba([235, 225, 200, 255]);

    let mut img = RgbaImage::from_pixel(ICON_SIZE, ICON_SIZE, background);
    let last = ICON_SIZE - 1;
    for i in 0..ICON_SIZE {
        for t in 0..3 {
            img.put_pixel(i, t, border);
            img.put_pixel(i, last - t, border);
            img.put_pixel(t, i, border);
            img.put_pixel(last - t, i, border);
        }
    }
    // Diagonal quill from bottom-left to top-right
    for i in 12..52 {
        let y = ICON_SIZE - i;
        for w in 0..4 {
            img.put_pixel(i, (y + w).min(last - 3), ink);
        }
    }
    // Baseline under the quill
    for x in 10..54 {
        for y in 52..55 {
            img.put_pixel(x, y, border);
        }
    }
    img
}

/// Load the application icon for the window
pub fn load_icon() -> Option<egui::IconData> {
    let img = render_icon();
    let (width, height) = img.dimensions();
    Some(egui::IconData {
        rgba: img.into_raw(),
        width,
        height,
    })
}
