//! Display options.
//!
//! Options travel with a pipeline node and steer the output adapter and
//! layout composer: where controls sit relative to the output pane, whether
//! the pane is centered, and how many rows a paged table shows.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Where extracted controls are placed relative to the output pane.
///
/// The single-word variants span the full edge; the two-word variants pin
/// the controls to one end of that edge (the first word names the edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    LeftTop,
    LeftBottom,
    RightTop,
    RightBottom,
}

impl Location {
    pub fn as_str(self) -> &'static str {
        match self {
            Location::Left => "left",
            Location::Right => "right",
            Location::Top => "top",
            Location::Bottom => "bottom",
            Location::TopLeft => "top_left",
            Location::TopRight => "top_right",
            Location::BottomLeft => "bottom_left",
            Location::BottomRight => "bottom_right",
            Location::LeftTop => "left_top",
            Location::LeftBottom => "left_bottom",
            Location::RightTop => "right_top",
            Location::RightBottom => "right_bottom",
        }
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Location> {
        match s {
            "left" => Ok(Location::Left),
            "right" => Ok(Location::Right),
            "top" => Ok(Location::Top),
            "bottom" => Ok(Location::Bottom),
            "top_left" => Ok(Location::TopLeft),
            "top_right" => Ok(Location::TopRight),
            "bottom_left" => Ok(Location::BottomLeft),
            "bottom_right" => Ok(Location::BottomRight),
            "left_top" => Ok(Location::LeftTop),
            "left_bottom" => Ok(Location::LeftBottom),
            "right_top" => Ok(Location::RightTop),
            "right_bottom" => Ok(Location::RightBottom),
            other => Err(Error::UnknownLocation(other.to_string())),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pipeline display configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOpts {
    pub location: Location,
    pub center: bool,
    /// Row cap for paged table output.
    pub max_rows: usize,
}

impl Default for DisplayOpts {
    fn default() -> Self {
        DisplayOpts {
            location: Location::Left,
            center: false,
            max_rows: 20,
        }
    }
}

impl DisplayOpts {
    pub fn new() -> DisplayOpts {
        DisplayOpts::default()
    }

    pub fn location(mut self, location: Location) -> DisplayOpts {
        self.location = location;
        self
    }

    pub fn center(mut self, center: bool) -> DisplayOpts {
        self.center = center;
        self
    }

    pub fn max_rows(mut self, max_rows: usize) -> DisplayOpts {
        self.max_rows = max_rows;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_round_trip() {
        for s in [
            "left",
            "right",
            "top",
            "bottom",
            "top_left",
            "top_right",
            "bottom_left",
            "bottom_right",
            "left_top",
            "left_bottom",
            "right_top",
            "right_bottom",
        ] {
            let loc: Location = s.parse().unwrap();
            assert_eq!(loc.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_location_rejected() {
        assert_eq!(
            "center".parse::<Location>(),
            Err(Error::UnknownLocation("center".into()))
        );
    }

    #[test]
    fn test_builder_defaults() {
        let opts = DisplayOpts::new();
        assert_eq!(opts.location, Location::Left);
        assert!(!opts.center);
        assert_eq!(opts.max_rows, 20);

        let opts = DisplayOpts::new().location(Location::TopRight).center(true).max_rows(5);
        assert_eq!(opts.location, Location::TopRight);
        assert!(opts.center);
        assert_eq!(opts.max_rows, 5);
    }
}
