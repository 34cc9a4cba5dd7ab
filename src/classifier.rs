//! Canned response selection
//!
//! Stand-in for a real inference service. [`classify`] is pure: the same
//! submission always maps to the same [`CannedResponseId`].

use crate::composer::{Submission, VOICE_TRANSCRIPT_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CannedResponseId {
    #[serde(rename = "pest-aphid")]
    PestAphid,
    #[serde(rename = "soil-nitrogen")]
    SoilNitrogen,
    #[serde(rename = "weather-irrigation")]
    WeatherIrrigation,
    #[serde(rename = "image-blight")]
    ImageBlight,
    #[serde(rename = "voice-rotation")]
    VoiceRotation,
    #[serde(rename = "generic-monitor")]
    GenericMonitor,
}

impl CannedResponseId {
    pub const ALL: [CannedResponseId; 6] = [
        CannedResponseId::PestAphid,
        CannedResponseId::SoilNitrogen,
        CannedResponseId::WeatherIrrigation,
        CannedResponseId::ImageBlight,
        CannedResponseId::VoiceRotation,
        CannedResponseId::GenericMonitor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CannedResponseId::PestAphid => "pest-aphid",
            CannedResponseId::SoilNitrogen => "soil-nitrogen",
            CannedResponseId::WeatherIrrigation => "weather-irrigation",
            CannedResponseId::ImageBlight => "image-blight",
            CannedResponseId::VoiceRotation => "voice-rotation",
            CannedResponseId::GenericMonitor => "generic-monitor",
        }
    }

    /// Advisory text shown for this response
    pub fn advice(self) -> &'static str {
        match self {
            CannedResponseId::PestAphid => "Based on what you've shared, it looks like you might be dealing with aphids. These small pests can multiply quickly and damage crops. I recommend trying a neem oil solution as an organic treatment. Mix 2 tablespoons of neem oil with 1 gallon of water and spray affected plants early in the morning or late evening.",
            CannedResponseId::SoilNitrogen => "Your soil appears to be lacking in nitrogen based on the yellowing of the lower leaves. Consider applying a balanced organic fertilizer with an NPK ratio of 10-10-10. For a more precise recommendation, a soil test would be beneficial to determine exact nutrient deficiencies.",
            CannedResponseId::WeatherIrrigation => "With the current weather patterns, I'd recommend preparing for potential water stress. Consider setting up drip irrigation for your most valuable crops. Also, applying mulch around plants can help retain soil moisture during dry periods.",
            CannedResponseId::ImageBlight => "Thank you for sharing these images. I can see signs of what appears to be early blight on your tomato plants. This fungal disease thrives in warm, humid conditions. I recommend removing affected leaves, improving air circulation around plants, and applying a copper-based fungicide approved for organic farming.",
            CannedResponseId::VoiceRotation => "I've analyzed your voice recording about crop rotation. For your specific situation, I'd recommend following a three-year rotation plan: legumes (like beans) in year one to fix nitrogen, followed by heavy feeders like corn in year two, then leafy greens in year three. This will help break pest cycles and maintain soil health.",
            CannedResponseId::GenericMonitor => "Thanks for your question. Based on the information you've provided, I'd recommend monitoring your crop closely for the next few days. If you notice any changes, please share more details or images so I can provide more specific advice. In the meantime, ensure adequate irrigation and consider a light application of compost tea as a preventative measure.",
        }
    }
}

impl fmt::Display for CannedResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected response and its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub response_id: CannedResponseId,
    pub text: String,
}

impl Advice {
    pub fn canned(response_id: CannedResponseId) -> Self {
        Self {
            response_id,
            text: response_id.advice().to_string(),
        }
    }
}

/// Keyword rules in priority order; matched as lowercase substrings
const KEYWORD_RULES: &[(&[&str], CannedResponseId)] = &[
    (
        &["pest", "insect", "aphid", "bug", "beetle", "caterpillar", "weevil", "locust"],
        CannedResponseId::PestAphid,
    ),
    (
        &["soil", "fertilizer", "fertiliser", "compost", "manure", "nitrogen"],
        CannedResponseId::SoilNitrogen,
    ),
    (
        &["weather", "rain", "drought", "frost", "storm", "forecast"],
        CannedResponseId::WeatherIrrigation,
    ),
];

/// Pick the canned response for a submission. First matching rule wins:
/// pest, soil and weather vocabulary, then attachments, then the voice
/// placeholder, then the generic fallback.
pub fn classify(submission: &Submission) -> CannedResponseId {
    let content = submission.content.to_lowercase();

    if let Some((_, id)) = KEYWORD_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| content.contains(w)))
    {
        return *id;
    }

    if !submission.attachments.is_empty() {
        return CannedResponseId::ImageBlight;
    }

    if submission.content == VOICE_TRANSCRIPT_PLACEHOLDER {
        return CannedResponseId::VoiceRotation;
    }

    CannedResponseId::GenericMonitor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageRef;
    use crate::composer::IMAGES_ONLY_LABEL;
    use proptest::prelude::*;

    fn text(content: &str) -> Submission {
        Submission {
            content: content.to_string(),
            attachments: vec![],
        }
    }

    fn with_image(content: &str) -> Submission {
        Submission {
            content: content.to_string(),
            attachments: vec![ImageRef::new("data:image/png;base64,AAAA")],
        }
    }

    #[test]
    fn test_aphids_on_tomatoes() {
        assert_eq!(
            classify(&text("I found aphids on my tomato leaves")),
            CannedResponseId::PestAphid
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(classify(&text("INSECTS everywhere")), CannedResponseId::PestAphid);
        assert_eq!(classify(&text("Which Fertilizer?")), CannedResponseId::SoilNitrogen);
        assert_eq!(classify(&text("Heavy RAIN tonight")), CannedResponseId::WeatherIrrigation);
    }

    #[test]
    fn test_rule_order_breaks_ties() {
        // pest beats soil beats weather
        assert_eq!(
            classify(&text("pests in wet soil after rain")),
            CannedResponseId::PestAphid
        );
        assert_eq!(
            classify(&text("soil washed away by rain")),
            CannedResponseId::SoilNitrogen
        );
        // keywords beat attachments
        assert_eq!(
            classify(&with_image("is this weather damage?")),
            CannedResponseId::WeatherIrrigation
        );
    }

    #[test]
    fn test_images_only() {
        assert_eq!(classify(&with_image(IMAGES_ONLY_LABEL)), CannedResponseId::ImageBlight);
    }

    #[test]
    fn test_voice_placeholder_mentions_soil() {
        // The placeholder talks about soil management, so the soil rule claims it first
        assert_eq!(
            classify(&text(VOICE_TRANSCRIPT_PLACEHOLDER)),
            CannedResponseId::SoilNitrogen
        );
    }

    #[test]
    fn test_generic_fallback() {
        assert_eq!(
            classify(&text("When should I harvest my maize?")),
            CannedResponseId::GenericMonitor
        );
    }

    #[test]
    fn test_ids_serialize_as_slugs() {
        for id in CannedResponseId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
            assert!(!id.advice().is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(content in ".{0,60}", images in 0usize..3) {
            let submission = Submission {
                content,
                attachments: (0..images).map(|n| ImageRef::new(format!("img{n}"))).collect(),
            };
            prop_assert_eq!(classify(&submission), classify(&submission.clone()));
        }

        #[test]
        fn prop_attachments_never_change_keyword_match(content in "[a-z ]{0,40}") {
            let plain = classify(&text(&content));
            let attached = classify(&with_image(&content));
            if plain != CannedResponseId::GenericMonitor && plain != CannedResponseId::VoiceRotation {
                prop_assert_eq!(plain, attached);
            }
        }
    }
}
