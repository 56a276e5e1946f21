//! Task domain type
//!
//! A Task is either a top-level mission (`parent_id == None`) or one of its
//! sub-tasks. Sub-tasks carry the `order` assigned by decomposition, which
//! picks the palace layer they reveal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Lowest allowed complexity
pub const MIN_COMPLEXITY: i64 = 1;

/// Highest allowed complexity
pub const MAX_COMPLEXITY: i64 = 5;

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Creative,
    #[default]
    Analytical,
    Physical,
    Administrative,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creative => "creative",
            Self::Analytical => "analytical",
            Self::Physical => "physical",
            Self::Administrative => "administrative",
        }
    }

    /// Parse model output, falling back to the default for unknown labels
    pub fn parse_lenient(s: &str) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(_) => {
                warn!(category = %s, "Unknown category, using default");
                Self::default()
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "creative" => Ok(Self::Creative),
            "analytical" => Ok(Self::Analytical),
            "physical" => Ok(Self::Physical),
            "administrative" | "admin" => Ok(Self::Administrative),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

/// Clamp a complexity score into the 1-5 range
pub fn clamp_complexity(value: i64) -> i64 {
    value.clamp(MIN_COMPLEXITY, MAX_COMPLEXITY)
}

/// The four generated-image slots of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// Per-layer image
    Layer,
    /// Per-layer image with only this layer revealed
    LayerRevealed,
    /// Running composite of the revealed layers
    Palace,
    /// One-time, fully revealed reference palace
    CompletePalace,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 4] = [Self::Layer, Self::LayerRevealed, Self::Palace, Self::CompletePalace];

    /// Database column holding the slot's media path
    pub fn column(&self) -> &'static str {
        match self {
            Self::Layer => "layer_image",
            Self::LayerRevealed => "layer_revealed_image",
            Self::Palace => "palace_image",
            Self::CompletePalace => "complete_palace_image",
        }
    }

    /// Media subdirectory for files of this slot
    pub fn media_dir(&self) -> &'static str {
        match self {
            Self::Layer => "layers",
            Self::LayerRevealed => "layer_images",
            Self::Palace => "palaces",
            Self::CompletePalace => "complete_palaces",
        }
    }

    /// Filename prefix for files of this slot
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Layer => "layer",
            Self::LayerRevealed => "layer_revealed",
            Self::Palace => "palace",
            Self::CompletePalace => "complete_palace",
        }
    }
}

/// A mission or sub-task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,

    /// Owning DailySession
    pub session_id: i64,

    /// Parent mission; `None` for top-level tasks
    pub parent_id: Option<i64>,

    pub title: String,

    pub category: Category,

    /// 1-5
    pub complexity: i64,

    pub is_completed: bool,

    /// Layer position, only set on sub-tasks
    pub order: Option<i64>,

    /// Estimated minutes
    pub time_estimate: Option<i64>,

    pub layer_image: Option<String>,
    pub layer_revealed_image: Option<String>,
    pub palace_image: Option<String>,
    pub complete_palace_image: Option<String>,
}

impl Task {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Media path stored in a slot
    pub fn image(&self, slot: ImageSlot) -> Option<&str> {
        match slot {
            ImageSlot::Layer => self.layer_image.as_deref(),
            ImageSlot::LayerRevealed => self.layer_revealed_image.as_deref(),
            ImageSlot::Palace => self.palace_image.as_deref(),
            ImageSlot::CompletePalace => self.complete_palace_image.as_deref(),
        }
    }

    /// Every media path the task points at
    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        ImageSlot::ALL.into_iter().filter_map(|slot| self.image(slot))
    }

    pub fn set_image(&mut self, slot: ImageSlot, path: Option<String>) {
        debug!(id = self.id, ?slot, ?path, "Task::set_image: called");
        match slot {
            ImageSlot::Layer => self.layer_image = path,
            ImageSlot::LayerRevealed => self.layer_revealed_image = path,
            ImageSlot::Palace => self.palace_image = path,
            ImageSlot::CompletePalace => self.complete_palace_image = path,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time_estimate {
            Some(minutes) => write!(f, "{} ({} min)", self.title, minutes),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Fields for a sub-task about to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubTask {
    pub title: String,
    pub category: Category,
    pub complexity: i64,
    pub order: i64,
    pub time_estimate: Option<i64>,
}

/// Fields for a mission and its sub-tasks, inserted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMission {
    pub title: String,
    pub category: Category,
    pub complexity: i64,
    pub sub_tasks: Vec<NewSubTask>,
}

/// User edits to a sub-task; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubTaskEdit {
    pub title: Option<String>,
    pub complexity: Option<i64>,
    /// Always applied: `None` clears the estimate
    pub time_estimate: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: 1,
            session_id: 1,
            parent_id: None,
            title: "Write a report".to_string(),
            category: Category::Analytical,
            complexity: 2,
            is_completed: false,
            order: None,
            time_estimate: None,
            layer_image: None,
            layer_revealed_image: None,
            palace_image: None,
            complete_palace_image: None,
        }
    }

    #[test]
    fn test_category_round_trip_names() {
        for category in [
            Category::Creative,
            Category::Analytical,
            Category::Physical,
            Category::Administrative,
        ] {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("Admin".parse::<Category>().unwrap(), Category::Administrative);
    }

    #[test]
    fn test_category_lenient_defaults() {
        assert_eq!(Category::parse_lenient("mystical"), Category::Analytical);
        assert_eq!(Category::parse_lenient(" Creative "), Category::Creative);
    }

    #[test]
    fn test_clamp_complexity() {
        assert_eq!(clamp_complexity(0), 1);
        assert_eq!(clamp_complexity(3), 3);
        assert_eq!(clamp_complexity(9), 5);
    }

    #[test]
    fn test_display_with_estimate() {
        let mut t = task();
        assert_eq!(t.to_string(), "Write a report");
        t.time_estimate = Some(40);
        assert_eq!(t.to_string(), "Write a report (40 min)");
    }

    #[test]
    fn test_image_slots() {
        let mut t = task();
        assert!(t.image(ImageSlot::Palace).is_none());
        t.set_image(ImageSlot::Palace, Some("palaces/palace_1.png".to_string()));
        assert_eq!(t.image(ImageSlot::Palace), Some("palaces/palace_1.png"));
        assert!(t.image(ImageSlot::CompletePalace).is_none());
        assert_eq!(ImageSlot::CompletePalace.column(), "complete_palace_image");
        assert_eq!(ImageSlot::LayerRevealed.media_dir(), "layer_images");

        t.set_image(ImageSlot::CompletePalace, Some("complete_palaces/complete_palace_2.png".to_string()));
        let paths: Vec<_> = t.image_paths().collect();
        assert_eq!(paths, vec!["palaces/palace_1.png", "complete_palaces/complete_palace_2.png"]);
    }
}
