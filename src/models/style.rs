/// Named prompt suffixes offered by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt_suffix: &'static str,
}

pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: "none",
        name: "None",
        prompt_suffix: "",
    },
    StylePreset {
        id: "realistic",
        name: "Realistic",
        prompt_suffix: "photorealistic, 8k, detailed, high quality, sharp focus, professional",
    },
    StylePreset {
        id: "3d-art",
        name: "3D Art",
        prompt_suffix: "3d render, octane render, cinematic lighting, trending on artstation, hyperrealistic",
    },
    StylePreset {
        id: "anime",
        name: "Anime",
        prompt_suffix: "anime style, key visual, beautiful, intricate detail, by studio ghibli and makoto shinkai",
    },
    StylePreset {
        id: "digital-painting",
        name: "Digital Painting",
        prompt_suffix: "digital painting, concept art, smooth, sharp focus, illustration, art by artgerm and greg rutkowski",
    },
];

#[must_use]
pub fn find_style(id: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

/// Trims the prompt and appends the preset suffix, if any.
#[must_use]
pub fn apply_style(prompt: &str, preset: Option<&StylePreset>) -> String {
    let prompt = prompt.trim();
    match preset {
        Some(p) if !p.prompt_suffix.is_empty() => format!("{prompt}, {}", p.prompt_suffix),
        _ => prompt.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_preset_leaves_prompt_alone() {
        let preset = find_style("none");
        assert_eq!(apply_style("  a cat  ", preset), "a cat");
    }

    #[test]
    fn preset_suffix_is_appended() {
        let preset = find_style("Anime").unwrap();
        let prompt = apply_style("a cat", Some(preset));
        assert!(prompt.starts_with("a cat, anime style"));
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find_style("cubism").is_none());
    }
}
