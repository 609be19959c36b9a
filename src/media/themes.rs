//! Visual theme presets for title cards, thumbnails, and backgrounds.

/// A named visual style.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Theme name, echoed in response metadata.
    pub name: &'static str,
    /// Background color, `#rrggbb`.
    pub background: &'static str,
    /// Title text color.
    pub title_color: &'static str,
    /// Secondary text color.
    pub subtitle_color: &'static str,
    /// Accent color for transitions and highlights.
    pub accent: &'static str,
    /// Title font size at 1080p.
    pub title_size: u32,
    /// Subtitle font size at 1080p.
    pub subtitle_size: u32,
}

const THEMES: &[Theme] = &[
    Theme {
        name: "modern",
        background: "#1a1a1a",
        title_color: "#ffffff",
        subtitle_color: "#e0e0e0",
        accent: "#3b82f6",
        title_size: 80,
        subtitle_size: 40,
    },
    Theme {
        name: "classic",
        background: "#000080",
        title_color: "#ffd700",
        subtitle_color: "#cbd5e1",
        accent: "#60a5fa",
        title_size: 70,
        subtitle_size: 36,
    },
    Theme {
        name: "minimalist",
        background: "#ffffff",
        title_color: "#000000",
        subtitle_color: "#4b5563",
        accent: "#10b981",
        title_size: 60,
        subtitle_size: 32,
    },
    Theme {
        name: "news",
        background: "#0f172a",
        title_color: "#ffffff",
        subtitle_color: "#cbd5e1",
        accent: "#ef4444",
        title_size: 64,
        subtitle_size: 34,
    },
];

impl Theme {
    /// Look up a theme by name.
    pub fn lookup(name: &str) -> Option<&'static Theme> {
        THEMES.iter().find(|t| t.name == name)
    }

    /// Look up a theme, falling back to `modern` for unknown names.
    pub fn named_or_default(name: &str) -> &'static Theme {
        Self::lookup(name).unwrap_or(&THEMES[0])
    }

    /// All theme names.
    pub fn names() -> Vec<&'static str> {
        THEMES.iter().map(|t| t.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_themes_resolve() {
        for name in ["modern", "classic", "minimalist", "news"] {
            assert!(Theme::lookup(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn unknown_theme_falls_back_to_modern() {
        assert_eq!(Theme::named_or_default("vaporwave").name, "modern");
    }
}
