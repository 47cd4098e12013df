/// Caps the longer side of an image at `max` pixels, keeping the aspect ratio.
///
/// Dimensions already inside the bound come back unchanged. Scaled sides are
/// floored and never drop below one pixel.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = f64::min(max as f64 / width as f64, max as f64 / height as f64);
    let scaled = |side: u32| ((side as f64 * scale).floor() as u32).clamp(1, max);

    (scaled(width), scaled(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_images_are_untouched() {
        assert_eq!(bounded_dimensions(1200, 800, 2000), (1200, 800));
        assert_eq!(bounded_dimensions(2000, 2000, 2000), (2000, 2000));
    }

    #[test]
    fn landscape_is_bounded_by_width() {
        assert_eq!(bounded_dimensions(4000, 3000, 2000), (2000, 1500));
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        assert_eq!(bounded_dimensions(3024, 4032, 2000), (1500, 2000));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(bounded_dimensions(100_000, 10, 2000), (2000, 1));
    }

    #[test]
    fn result_never_exceeds_bound() {
        for (w, h) in [(2001, 1), (4999, 4998), (65535, 3), (7, 9000)] {
            let (bw, bh) = bounded_dimensions(w, h, 2000);
            assert!(bw <= 2000 && bh <= 2000, "{}x{} -> {}x{}", w, h, bw, bh);
        }
    }
}
