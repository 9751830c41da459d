use std::path::Path;

use super::file::{Category, ImageKind};

/// Media type reported for files whose extension is unknown
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Classify a declared media type.
///
/// Accepts `application/pdf`, any `image/*` and `text/plain`. Parameters
/// (`; charset=...`) and case are ignored.
pub fn classify(media_type: &str) -> Option<Category> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/pdf" => Some(Category::Pdf),
        "text/plain" => Some(Category::Text),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Category::Image(ImageKind::Jpeg)),
        "image/png" => Some(Category::Image(ImageKind::Png)),
        other if other.starts_with("image/") => Some(Category::Image(ImageKind::Other)),
        _ => None,
    }
}

/// Media type a browser would report for a picked file, based on its extension.
pub fn media_type_for_path(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_categories() {
        assert_eq!(classify("application/pdf"), Some(Category::Pdf));
        assert_eq!(classify("text/plain"), Some(Category::Text));
        assert_eq!(classify("image/jpeg"), Some(Category::Image(ImageKind::Jpeg)));
        assert_eq!(classify("image/png"), Some(Category::Image(ImageKind::Png)));
    }

    #[test]
    fn test_other_images_accepted_but_not_embeddable() {
        assert_eq!(classify("image/gif"), Some(Category::Image(ImageKind::Other)));
        assert_eq!(classify("image/webp"), Some(Category::Image(ImageKind::Other)));
    }

    #[test]
    fn test_parameters_and_case_ignored() {
        assert_eq!(classify("text/plain; charset=utf-8"), Some(Category::Text));
        assert_eq!(classify("Application/PDF"), Some(Category::Pdf));
    }

    #[test]
    fn test_rejected_types() {
        assert_eq!(classify("text/html"), None);
        assert_eq!(classify("application/msword"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path("a/b/report.pdf"), "application/pdf");
        assert_eq!(media_type_for_path("photo.jpg"), "image/jpeg");
        assert_eq!(media_type_for_path("readme.txt"), "text/plain");
        assert_eq!(media_type_for_path("archive.unknownext"), FALLBACK_MEDIA_TYPE);
    }
}
