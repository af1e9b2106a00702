//! Responsive-image sizing: the logical size ladder, the derivative
//! decision table, storage path layout, and `srcset`/`sizes` rewriting of
//! post body HTML.
//!
//! At upload time the pipeline generates every derivative whose target
//! width is strictly smaller than the original; the media row records how
//! many were generated (`resize_count`, 0–4). The generated sizes are
//! always the smallest N of the ladder, so serving reduces to a rank
//! comparison.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Logical image sizes, smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSize {
    Small,
    Medium,
    MediumLarge,
    Large,
    Original,
}

/// The derivative ladder in generation order (smallest first).
pub const DERIVATIVE_SIZES: [ImageSize; 4] = [
    ImageSize::Small,
    ImageSize::Medium,
    ImageSize::MediumLarge,
    ImageSize::Large,
];

impl ImageSize {
    /// Target pixel width for a derivative size. `Original` has no target.
    pub fn width(self) -> Option<u32> {
        match self {
            ImageSize::Small => Some(400),
            ImageSize::Medium => Some(800),
            ImageSize::MediumLarge => Some(1200),
            ImageSize::Large => Some(1800),
            ImageSize::Original => None,
        }
    }

    /// Storage directory segment. Originals live directly in the
    /// year/month folder.
    pub fn dir_segment(self) -> Option<&'static str> {
        match self {
            ImageSize::Small => Some("sm"),
            ImageSize::Medium => Some("md"),
            ImageSize::MediumLarge => Some("ml"),
            ImageSize::Large => Some("lg"),
            ImageSize::Original => None,
        }
    }

    /// 1-based position in the ladder; 0 for `Original`.
    fn rank(self) -> i32 {
        match self {
            ImageSize::Original => 0,
            ImageSize::Small => 1,
            ImageSize::Medium => 2,
            ImageSize::MediumLarge => 3,
            ImageSize::Large => 4,
        }
    }

    /// Parse a query-string value (`small`, `medium`, `medium-large`,
    /// `large`, `original`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" | "sm" => Some(ImageSize::Small),
            "medium" | "md" => Some(ImageSize::Medium),
            "medium-large" | "ml" => Some(ImageSize::MediumLarge),
            "large" | "lg" => Some(ImageSize::Large),
            "original" => Some(ImageSize::Original),
            _ => None,
        }
    }
}

/// Decide which stored derivative actually serves a request.
///
/// A requested size was generated iff its rank is within `resize_count`;
/// anything else falls back to the original upload.
pub fn stored_size(requested: ImageSize, resize_count: i32) -> ImageSize {
    if requested == ImageSize::Original {
        return ImageSize::Original;
    }
    if requested.rank() <= resize_count {
        requested
    } else {
        ImageSize::Original
    }
}

/// Derivatives to generate for an upload of the given pixel width,
/// smallest first. A derivative is only generated when it would actually
/// shrink the image.
pub fn resize_targets(original_width: u32) -> Vec<(ImageSize, u32)> {
    DERIVATIVE_SIZES
        .iter()
        .filter_map(|&size| {
            let w = size.width().unwrap_or(0);
            (w < original_width).then_some((size, w))
        })
        .collect()
}

/// Relative storage key for a media file:
/// `blog/{yyyy}/{MM}/{size?}/{file_name}`.
pub fn media_path(year: i32, month: u32, size: ImageSize, file_name: &str) -> String {
    match size.dir_segment() {
        Some(seg) => format!("blog/{year}/{month:02}/{seg}/{file_name}"),
        None => format!("blog/{year}/{month:02}/{file_name}"),
    }
}

/// URL candidates for one image, used to build a `srcset` attribute.
/// `candidates` pairs a public URL with its pixel width, smallest first.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub candidates: Vec<(String, u32)>,
}

/// Collect the `src` URL of every `<img>` tag in post body HTML, in
/// document order. Callers resolve these against the media store before
/// rewriting.
pub fn collect_img_srcs(html: &str) -> Vec<String> {
    let tag_re = Regex::new(r"<img\b[^>]*>").unwrap();
    let src_re = Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).unwrap();

    tag_re
        .find_iter(html)
        .filter_map(|m| src_re.captures(m.as_str()).map(|c| c[1].to_string()))
        .collect()
}

/// Rewrite `<img>` tags in post body HTML, appending `srcset` and `sizes`
/// attributes for images the resolver recognizes.
///
/// The resolver maps a `src` URL to its available candidates; foreign
/// images (resolver returns `None`) and tags that already carry a
/// `srcset` are left untouched.
pub fn rewrite_img_tags<F>(html: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<ImageSource>,
{
    // Unwraps are safe: both patterns are compile-time constants.
    let tag_re = Regex::new(r"<img\b[^>]*>").unwrap();
    let src_re = Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).unwrap();

    tag_re
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let tag = &caps[0];
            if tag.contains("srcset") {
                return tag.to_string();
            }
            let Some(src) = src_re.captures(tag) else {
                return tag.to_string();
            };
            let Some(source) = resolve(&src[1]) else {
                return tag.to_string();
            };
            if source.candidates.is_empty() {
                return tag.to_string();
            }

            let srcset = source
                .candidates
                .iter()
                .map(|(url, w)| format!("{url} {w}w"))
                .collect::<Vec<_>>()
                .join(", ");
            // Unwrap is safe: candidates is non-empty.
            let max_w = source.candidates.iter().map(|&(_, w)| w).max().unwrap();
            let attrs = format!(" srcset=\"{srcset}\" sizes=\"(max-width: {max_w}px) 100vw, {max_w}px\"");

            if let Some(base) = tag.strip_suffix("/>") {
                format!("{}{attrs} />", base.trim_end())
            } else if let Some(base) = tag.strip_suffix('>') {
                format!("{base}{attrs}>")
            } else {
                tag.to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_targets_scale_with_width() {
        assert!(resize_targets(300).is_empty());
        assert_eq!(resize_targets(500).len(), 1);
        assert_eq!(resize_targets(1000).len(), 2);
        assert_eq!(resize_targets(1500).len(), 3);
        assert_eq!(resize_targets(2400).len(), 4);
        // Boundary: equal width generates nothing for that size.
        assert_eq!(resize_targets(400).len(), 0);
        assert_eq!(resize_targets(401).len(), 1);
    }

    #[test]
    fn stored_size_serves_generated_derivatives() {
        assert_eq!(stored_size(ImageSize::Small, 4), ImageSize::Small);
        assert_eq!(stored_size(ImageSize::Large, 4), ImageSize::Large);
        assert_eq!(stored_size(ImageSize::Medium, 2), ImageSize::Medium);
    }

    #[test]
    fn stored_size_falls_back_to_original() {
        assert_eq!(stored_size(ImageSize::Large, 2), ImageSize::Original);
        assert_eq!(stored_size(ImageSize::Small, 0), ImageSize::Original);
        assert_eq!(stored_size(ImageSize::MediumLarge, 2), ImageSize::Original);
    }

    #[test]
    fn stored_size_original_is_identity() {
        for rc in 0..=4 {
            assert_eq!(stored_size(ImageSize::Original, rc), ImageSize::Original);
        }
    }

    #[test]
    fn media_path_layout() {
        assert_eq!(
            media_path(2026, 8, ImageSize::Original, "cat.jpg"),
            "blog/2026/08/cat.jpg"
        );
        assert_eq!(
            media_path(2026, 8, ImageSize::Medium, "cat.jpg"),
            "blog/2026/08/md/cat.jpg"
        );
    }

    fn two_sizes(_src: &str) -> Option<ImageSource> {
        Some(ImageSource {
            candidates: vec![
                ("/m/sm/cat.jpg".into(), 400),
                ("/m/cat.jpg".into(), 900),
            ],
        })
    }

    #[test]
    fn rewrite_appends_srcset_and_sizes() {
        let html = r#"<p><img src="/m/cat.jpg" alt="cat"></p>"#;
        let out = rewrite_img_tags(html, two_sizes);
        assert!(out.contains(r#"srcset="/m/sm/cat.jpg 400w, /m/cat.jpg 900w""#));
        assert!(out.contains(r#"sizes="(max-width: 900px) 100vw, 900px""#));
    }

    #[test]
    fn rewrite_handles_self_closing_tags() {
        let html = r#"<img src="/m/cat.jpg" />"#;
        let out = rewrite_img_tags(html, two_sizes);
        assert!(out.ends_with("/>"));
        assert!(out.contains("srcset="));
    }

    #[test]
    fn rewrite_skips_foreign_and_existing_srcset() {
        let html = r#"<img src="https://elsewhere/x.png">"#;
        assert_eq!(rewrite_img_tags(html, |_| None), html);

        let html = r#"<img src="/m/cat.jpg" srcset="already">"#;
        assert_eq!(rewrite_img_tags(html, two_sizes), html);
    }

    #[test]
    fn collect_img_srcs_finds_all_sources() {
        let html = r#"<img src="/m/a.jpg"><p>x</p><img src='/m/b.png' alt="b">"#;
        assert_eq!(collect_img_srcs(html), vec!["/m/a.jpg", "/m/b.png"]);
        assert!(collect_img_srcs("<p>none</p>").is_empty());
    }

    #[test]
    fn rewrite_leaves_imgless_html_alone() {
        let html = "<p>no images here</p>";
        assert_eq!(rewrite_img_tags(html, two_sizes), html);
    }
}
