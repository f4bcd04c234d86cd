//! Export layout: placing a rasterized diagram on a landscape page.

use chrono::NaiveDate;

/// Fraction of the page the exported image may occupy.
pub const PAGE_FILL_RATIO: f32 = 0.9;
/// Maximum length of the topic-derived part of an export filename.
pub const MAX_FILENAME_LEN: usize = 50;

/// Placement of the exported image on the page, in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scales the image to fit the page with a margin and centers it.
pub fn fit_to_page(
    page_width: f32,
    page_height: f32,
    image_width: f32,
    image_height: f32,
) -> PagePlacement {
    if image_width <= 0.0 || image_height <= 0.0 {
        return PagePlacement {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let ratio = (page_width / image_width).min(page_height / image_height) * PAGE_FILL_RATIO;
    let width = image_width * ratio;
    let height = image_height * ratio;
    PagePlacement {
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
    }
}

/// Derives an export filename (without extension) from the topic text.
///
/// The topic is truncated, characters invalid in filenames are replaced with
/// `-`, and a `_Mind_Map` suffix is appended. Topics that reduce to nothing
/// fall back to a dated default.
pub fn export_filename(topic: &str, today: NaiveDate) -> String {
    let cleaned: String = topic
        .trim()
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '-',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        format!("mind-map-{}", today.format("%Y-%m-%d"))
    } else {
        format!("{cleaned}_Mind_Map")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_to_page_width_bound() {
        // A4 landscape in mm against a wide image: width is the binding side.
        let placement = fit_to_page(297.0, 210.0, 1000.0, 500.0);
        let expected_ratio = (297.0_f32 / 1000.0).min(210.0 / 500.0) * 0.9;
        assert!((placement.width - 1000.0 * expected_ratio).abs() < 1e-3);
        assert!((placement.height - 500.0 * expected_ratio).abs() < 1e-3);
        // Centered.
        assert!((placement.x - (297.0 - placement.width) / 2.0).abs() < 1e-3);
        assert!((placement.y - (210.0 - placement.height) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_to_page_degenerate_image() {
        let placement = fit_to_page(297.0, 210.0, 0.0, 0.0);
        assert_eq!(placement.width, 0.0);
        assert_eq!(placement.height, 0.0);
    }

    #[test]
    fn test_export_filename_sanitizes_invalid_chars() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(export_filename("AI / ML?", today), "AI - ML-_Mind_Map");
    }

    #[test]
    fn test_export_filename_truncates_long_topics() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let topic = "x".repeat(120);
        let name = export_filename(&topic, today);
        assert_eq!(name, format!("{}_Mind_Map", "x".repeat(50)));
    }

    #[test]
    fn test_export_filename_falls_back_when_empty() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(export_filename("   ", today), "mind-map-2025-06-01");
    }
}
