// Pin definitions: user-configured named locations, grouped by area pattern.
//
// Pins are loaded once per session from TOML and shared by reference with
// every match built from them; nothing downstream mutates a pin.

use egui::Color32;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::rc::Rc;

use super::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pin {
    /// Object path of the tiles this pin marks, matched exactly (ignoring case).
    pub path: String,
    /// How many instances the user expects; more than this flags the label.
    pub expected_count: usize,
    pub label: String,
    pub enabled: bool,
    /// Written as straight (unmultiplied) `[r, g, b]` or `[r, g, b, a]`.
    #[serde(deserialize_with = "straight_rgba")]
    pub text_color: Color32,
    #[serde(deserialize_with = "straight_rgba")]
    pub bg_color: Color32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RgbaArray {
    Rgb([u8; 3]),
    Rgba([u8; 4]),
}

fn straight_rgba<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Color32, D::Error> {
    Ok(match RgbaArray::deserialize(deserializer)? {
        RgbaArray::Rgb([r, g, b]) => Color32::from_rgb(r, g, b),
        RgbaArray::Rgba([r, g, b, a]) => Color32::from_rgba_unmultiplied(r, g, b, a),
    })
}

impl Default for Pin {
    fn default() -> Self {
        Self {
            path: String::new(),
            expected_count: 1,
            label: String::new(),
            enabled: true,
            text_color: Color32::from_rgb(253, 224, 71),
            bg_color: Color32::from_rgb(0, 0, 0),
        }
    }
}

impl Pin {
    pub fn new(path: impl Into<String>, label: impl Into<String>, expected_count: usize) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            expected_count,
            ..Self::default()
        }
    }
}

/// Pins that apply to every area whose id matches `area`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PinGroup {
    /// Area-id pattern, see [`area_matches`].
    pub area: String,
    #[serde(default, rename = "pin")]
    pub pins: Vec<Rc<Pin>>,
}

/// All loaded pin groups, in file order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PinLibrary {
    #[serde(default, rename = "group")]
    pub groups: Vec<PinGroup>,
}

impl PinLibrary {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let library = Self::from_toml_str(&text)?;
        log::info!(
            "loaded {} pin groups ({} pins) from {}",
            library.groups.len(),
            library.pin_count(),
            path.display()
        );
        Ok(library)
    }

    pub fn push(&mut self, area: impl Into<String>, pins: Vec<Pin>) {
        self.groups.push(PinGroup {
            area: area.into(),
            pins: pins.into_iter().map(Rc::new).collect(),
        });
    }

    pub fn pin_count(&self) -> usize {
        self.groups.iter().map(|g| g.pins.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pin_count() == 0
    }

    /// Groups whose pattern matches `area_id`, in library order.
    pub fn groups_for<'a>(&'a self, area_id: &'a str) -> impl Iterator<Item = &'a PinGroup> + 'a {
        self.groups
            .iter()
            .filter(move |g| area_matches(&g.area, area_id))
    }
}

// ============================================================================
// AREA PATTERNS
// ============================================================================

/// Case-insensitive whole-string wildcard match: `*` matches any run of
/// characters (including none), `?` exactly one.
pub fn area_matches(pattern: &str, area_id: &str) -> bool {
    let pat: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let text: Vec<char> = area_id.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut t) = (0, 0);
    // Last `*` seen and the text position it was tried against.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            // Let the last star swallow one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pat[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_and_case() {
        assert!(area_matches("G1_1", "g1_1"));
        assert!(area_matches("G1_*", "G1_town"));
        assert!(area_matches("*", ""));
        assert!(area_matches("*town", "G1_Town"));
        assert!(area_matches("G?_1", "G2_1"));
        assert!(area_matches("a*b*c", "axxbyyc"));
        assert!(!area_matches("G1_*", "G2_1"));
        assert!(!area_matches("G?_1", "G12_1"));
        assert!(!area_matches("G1", "G1_1"));
        assert!(!area_matches("", "x"));
    }

    #[test]
    fn parses_groups_with_defaults() {
        let lib = PinLibrary::from_toml_str(
            r#"
            [[group]]
            area = "G1_*"

            [[group.pin]]
            path = "Metadata/Terrain/Altar"
            label = "Altar"

            [[group.pin]]
            path = "Metadata/Terrain/Exit"
            label = "Exit"
            expected_count = 2
            enabled = false
            text_color = [255, 0, 0, 255]

            [[group]]
            area = "*"
            "#,
        )
        .unwrap();
        assert_eq!(lib.groups.len(), 2);
        assert_eq!(lib.pin_count(), 2);
        let altar = &lib.groups[0].pins[0];
        assert_eq!(altar.expected_count, 1);
        assert!(altar.enabled);
        assert_eq!(altar.text_color, Color32::from_rgb(253, 224, 71));
        let exit = &lib.groups[0].pins[1];
        assert_eq!(exit.expected_count, 2);
        assert!(!exit.enabled);
        assert_eq!(exit.text_color, Color32::RED);
    }

    #[test]
    fn colors_are_read_unmultiplied() {
        let lib = PinLibrary::from_toml_str(
            r#"
            [[group]]
            area = "*"

            [[group.pin]]
            path = "a"
            text_color = [200, 100, 50, 128]
            bg_color = [10, 20, 30]
            "#,
        )
        .unwrap();
        let pin = &lib.groups[0].pins[0];
        assert_eq!(pin.text_color, Color32::from_rgba_unmultiplied(200, 100, 50, 128));
        assert_ne!(pin.text_color, Color32::from_rgba_premultiplied(200, 100, 50, 128));
        assert_eq!(pin.bg_color, Color32::from_rgb(10, 20, 30));
        assert!(PinLibrary::from_toml_str(
            "[[group]]\narea = \"*\"\n[[group.pin]]\npath = \"a\"\ntext_color = [1, 2]"
        )
        .is_err());
    }

    #[test]
    fn groups_for_filters_by_area() {
        let mut lib = PinLibrary::default();
        lib.push("G1_*", vec![Pin::new("a", "A", 1)]);
        lib.push("G2_*", vec![Pin::new("b", "B", 1)]);
        lib.push("*", vec![Pin::new("c", "C", 1)]);
        let areas: Vec<_> = lib.groups_for("g1_4").map(|g| g.area.as_str()).collect();
        assert_eq!(areas, ["G1_*", "*"]);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(PinLibrary::from_toml_str("[[group]]\narea = 3").is_err());
    }
}
