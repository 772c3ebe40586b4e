//! The closed set of comparison features
//!
//! Every similarity query scores candidates along four fixed dimensions.
//! Backend responses and historical match-reason strings drift between
//! "color", "colorPalette" and "palette" for the color dimension; parsing
//! accepts all of them, while the outbound wire names are fixed.

use serde::{Deserialize, Serialize};

/// One comparison dimension of the similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// Artistic style and technique
    Style,
    /// Surface texture and material
    Texture,
    /// Color scheme and harmony
    Color,
    /// Emotional tone and mood
    Emotion,
}

impl Feature {
    /// All features in canonical display order
    pub const ALL: [Feature; 4] = [
        Feature::Style,
        Feature::Texture,
        Feature::Color,
        Feature::Emotion,
    ];

    /// Stable wire name, also used as the boolean active-flag field
    pub fn wire_name(&self) -> &'static str {
        match self {
            Feature::Style => "style",
            Feature::Texture => "texture",
            Feature::Color => "color",
            Feature::Emotion => "emotion",
        }
    }

    /// Multipart field name carrying this feature's normalized weight
    pub fn weight_field(&self) -> &'static str {
        match self {
            Feature::Style => "style_weight",
            Feature::Texture => "texture_weight",
            Feature::Color => "color_weight",
            Feature::Emotion => "emotion_weight",
        }
    }

    /// Human-readable label
    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::Style => "Style",
            Feature::Texture => "Texture",
            Feature::Color => "Color",
            Feature::Emotion => "Emotion",
        }
    }

    /// Parse a feature name, case-insensitively, accepting the color
    /// aliases found in backend output ("colorPalette", "palette",
    /// "colour")
    pub fn parse(name: &str) -> Option<Feature> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "style" => Some(Feature::Style),
            "texture" => Some(Feature::Texture),
            "color" | "colour" | "colorpalette" | "colourpalette" | "palette" => {
                Some(Feature::Color)
            }
            "emotion" => Some(Feature::Emotion),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let names: Vec<&str> = Feature::ALL.iter().map(|f| f.wire_name()).collect();
        assert_eq!(names, vec!["style", "texture", "color", "emotion"]);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Feature::parse("Style"), Some(Feature::Style));
        assert_eq!(Feature::parse("TEXTURE"), Some(Feature::Texture));
        assert_eq!(Feature::parse("emotion"), Some(Feature::Emotion));
    }

    #[test]
    fn test_parse_accepts_color_aliases() {
        assert_eq!(Feature::parse("color"), Some(Feature::Color));
        assert_eq!(Feature::parse("colour"), Some(Feature::Color));
        assert_eq!(Feature::parse("colorPalette"), Some(Feature::Color));
        assert_eq!(Feature::parse("Palette"), Some(Feature::Color));
        assert_eq!(Feature::parse("Color Palette"), Some(Feature::Color));
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert_eq!(Feature::parse("composition"), None);
        assert_eq!(Feature::parse(""), None);
    }

    #[test]
    fn test_weight_field_names() {
        assert_eq!(Feature::Color.weight_field(), "color_weight");
        assert_eq!(Feature::Style.weight_field(), "style_weight");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Feature::Emotion).unwrap(),
            "\"emotion\""
        );
    }
}
