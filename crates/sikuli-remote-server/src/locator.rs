//! Locator parsing
//!
//! A locator is either an image reference, optionally carrying its own
//! similarity threshold as `image.png=0.85`, or plain text to be found by OCR.

use crate::constants::IMAGE_SUFFIXES;
use crate::errors::{KeywordError, KeywordResult};
use sikuli_remote_protocol::Target;

/// A parsed locator
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    raw: String,
    target: Target,
}

impl Locator {
    /// The string the caller passed in
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Similarity threshold, `None` for text targets
    pub fn similarity(&self) -> Option<f64> {
        match &self.target {
            Target::Image { similarity, .. } => Some(*similarity),
            Target::Text { .. } => None,
        }
    }
}

fn is_image_reference(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Parse `raw` into a [`Locator`], using `default_similarity` when the locator carries none
pub fn resolve(raw: &str, default_similarity: f64) -> KeywordResult<Locator> {
    if raw.trim().is_empty() {
        return Err(KeywordError::invalid_locator(raw, "locator is empty"));
    }

    if let Some((head, tail)) = raw.rsplit_once('=')
        && is_image_reference(head)
    {
        let path: String = head.chars().filter(|c| !c.is_whitespace()).collect();
        let similarity: f64 = tail.trim().parse().map_err(|_| {
            KeywordError::invalid_locator(raw, format!("similarity '{}' is not a number", tail.trim()))
        })?;
        if !(0.0..=1.0).contains(&similarity) {
            return Err(KeywordError::invalid_locator(
                raw,
                format!("similarity {} is outside 0..1", similarity),
            ));
        }
        return Ok(Locator {
            raw: raw.to_string(),
            target: Target::Image { path, similarity },
        });
    }

    let target = if is_image_reference(raw) {
        Target::Image {
            path: raw.trim().to_string(),
            similarity: default_similarity,
        }
    } else {
        Target::Text {
            text: raw.to_string(),
        }
    };

    Ok(Locator {
        raw: raw.to_string(),
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_of(locator: &Locator) -> (&str, f64) {
        match locator.target() {
            Target::Image { path, similarity } => (path.as_str(), *similarity),
            other => panic!("expected image target, got {:?}", other),
        }
    }

    #[test]
    fn test_image_without_threshold_uses_default() {
        let locator = resolve("img.png", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("img.png", 0.7));
        assert_eq!(locator.raw(), "img.png");
    }

    #[test]
    fn test_image_with_threshold() {
        let locator = resolve("img.png=0.87", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("img.png", 0.87));
    }

    #[test]
    fn test_embedded_whitespace_is_stripped() {
        let locator = resolve("img.png = 0.5", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("img.png", 0.5));

        let locator = resolve("my dir/ok button.png=0.9", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("mydir/okbutton.png", 0.9));
    }

    #[test]
    fn test_splits_on_last_equals() {
        let locator = resolve("a=b/img.PNG=0.6", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("a=b/img.PNG", 0.6));

        let locator = resolve("a=b/img.png", 0.7).unwrap();
        assert_eq!(image_of(&locator), ("a=b/img.png", 0.7));
    }

    #[test]
    fn test_bad_threshold_is_rejected() {
        let err = resolve("img.png=abc", 0.7).unwrap_err();
        assert!(matches!(err, KeywordError::InvalidLocator { .. }));
        assert!(resolve("img.png=", 0.7).is_err());
        assert!(resolve("img.png=1.5", 0.7).is_err());
    }

    #[test]
    fn test_text_targets() {
        let locator = resolve("Save as=", 0.7).unwrap();
        assert_eq!(
            locator.target(),
            &Target::Text {
                text: "Save as=".to_string()
            }
        );
        assert_eq!(locator.similarity(), None);
    }

    #[test]
    fn test_empty_locator_is_invalid() {
        assert!(resolve("  ", 0.7).is_err());
    }
}
