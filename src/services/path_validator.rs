// Theme Bundle Path Validation
// Keeps asset names inside the flat asset directory

use std::sync::OnceLock;

use regex::Regex;

const ASSET_NAME_PATTERN: &str = r"^[^/\\\x00]{1,255}$";

static ASSET_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

/// Validate that an asset name is a plain file name.
///
/// Asset names come from manifests and archive entries, so anything that could
/// address a path outside the asset directory is rejected.
///
/// # Returns
/// * `Ok(())` - If the name is a single path component
/// * `Err(String)` - Error message describing the problem
pub fn validate_asset_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Asset name cannot be empty".to_string());
    }

    let regex = ASSET_NAME_REGEX.get_or_init(|| Regex::new(ASSET_NAME_PATTERN).unwrap());
    if !regex.is_match(name) {
        return Err(format!("Asset name '{name}' cannot contain path separators"));
    }

    if name == "." || name == ".." {
        return Err(format!("Asset name '{name}' does not name a file"));
    }

    Ok(())
}

/// Sanitize a display name into something usable as a file name.
/// Removes path separators and '..' sequences; falls back to "theme" when nothing is left.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned = filename
        .replace(['/', '\\', ':'], "_")
        .replace("..", "_")
        .trim()
        .trim_matches('.')
        .to_string();

    if cleaned.is_empty() {
        "theme".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate_asset_name("posts-light.png").is_ok());
        assert!(validate_asset_name("Night Sky (2x).jpg").is_ok());
        assert!(validate_asset_name("a..b.png").is_ok());
        assert!(validate_asset_name("sky..light.png").is_ok());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let result = validate_asset_name("../settings.json");
        assert!(result.is_err());
        assert!(validate_asset_name("..").is_err());
        assert!(validate_asset_name(".").is_err());
        assert!(validate_asset_name("nested/asset.png").is_err());
        assert!(validate_asset_name("nested\\asset.png").is_err());
    }

    #[test]
    fn test_rejects_empty_names() {
        assert!(validate_asset_name("").is_err());
        assert!(validate_asset_name("   ").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_filename("Solarized: Dark"), "Solarized_ Dark");
        assert_eq!(sanitize_filename("  .  "), "theme");
    }
}
