use eframe::egui::Color32;

use crate::session::DocType;

pub trait ColorExt {
    fn from_hex(hex: &str) -> Option<Self>
    where
        Self: Sized;
}

impl ColorExt for Color32 {
    fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Color32::from_rgb(r, g, b))
    }
}

pub fn theme_color(doc_type: DocType) -> Color32 {
    Color32::from_hex(doc_type.theme_hex()).unwrap_or(Color32::from_rgb(161, 89, 225))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(Color32::from_hex("#1677ff"), Some(Color32::from_rgb(0x16, 0x77, 0xff)));
        assert_eq!(Color32::from_hex("fa8c16"), Some(Color32::from_rgb(0xfa, 0x8c, 0x16)));
        assert_eq!(Color32::from_hex("#fff"), None);
        assert_eq!(Color32::from_hex("#gg0000"), None);
    }

    #[test]
    fn every_doc_type_has_a_theme() {
        for doc_type in DocType::ALL {
            assert!(Color32::from_hex(doc_type.theme_hex()).is_some());
        }
        assert_ne!(theme_color(DocType::Sales), theme_color(DocType::Transfer));
    }
}
