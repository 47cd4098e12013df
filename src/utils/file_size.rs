pub struct FileSizeUtils;

impl FileSizeUtils {
    pub fn format_size(size: u64) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut value = size as f64;
        let mut unit_index = 0;

        while value >= 1024.0 && unit_index < UNITS.len() - 1 {
            value /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size, UNITS[unit_index])
        } else {
            format!("{:.1} {}", value, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileSizeUtils;

    #[test]
    fn formats_each_unit() {
        assert_eq!(FileSizeUtils::format_size(512), "512 B");
        assert_eq!(FileSizeUtils::format_size(1536), "1.5 KB");
        assert_eq!(FileSizeUtils::format_size(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(FileSizeUtils::format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
