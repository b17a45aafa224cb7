/// Maze decoder: raster image -> `MazeDescriptor`.
///
/// ## Color table (exact RGB match, alpha ignored):
///   (0,0,0)       = Wall
///   (255,255,255) = Path (classified, never stored)
///   (0,0,255)     = Start
///   (255,0,0)     = Goal
///   anything else = Path
///
/// Pixels are scanned in row-major order. If a landmark color appears more
/// than once, the last pixel in scan order wins.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

use super::cell::Cell;
use super::maze::MazeDescriptor;

pub const WALL_RGB: [u8; 3] = [0, 0, 0];
#[cfg(test)]
pub const PATH_RGB: [u8; 3] = [255, 255, 255];
pub const START_RGB: [u8; 3] = [0, 0, 255];
pub const GOAL_RGB: [u8; 3] = [255, 0, 0];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Landmark {
    Start,
    Goal,
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::Start => f.write_str("start"),
            Landmark::Goal => f.write_str("goal"),
        }
    }
}

fn join_landmarks(missing: &[Landmark]) -> String {
    missing.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to load maze image {source_id}: {source}")]
    ImageLoad {
        source_id: String,
        #[source]
        source: image::ImageError,
    },
    #[error("maze image {source_id} is missing landmark(s): {}", join_landmarks(.missing))]
    MissingLandmark {
        source_id: String,
        missing: Vec<Landmark>,
    },
}

impl DecodeError {
    pub fn source_id(&self) -> &str {
        match self {
            DecodeError::ImageLoad { source_id, .. } => source_id,
            DecodeError::MissingLandmark { source_id, .. } => source_id,
        }
    }
}

/// Pixel classification result.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum PixelClass {
    Wall,
    Path,
    Start,
    Goal,
}

#[inline]
fn classify(px: &Rgba<u8>) -> PixelClass {
    let rgb = [px[0], px[1], px[2]];
    if rgb == WALL_RGB {
        PixelClass::Wall
    } else if rgb == START_RGB {
        PixelClass::Start
    } else if rgb == GOAL_RGB {
        PixelClass::Goal
    } else {
        // White and every unreserved shade
        PixelClass::Path
    }
}

/// Decode an RGBA bitmap into a maze descriptor.
/// `source_id` names the image in errors and logs.
pub fn decode(image: &RgbaImage, source_id: &str) -> Result<MazeDescriptor, DecodeError> {
    let (width, height) = image.dimensions();
    let mut walls = HashSet::new();
    let mut start: Option<Cell> = None;
    let mut goal: Option<Cell> = None;
    let mut start_hits = 0usize;
    let mut goal_hits = 0usize;

    // enumerate_pixels yields row-major order
    for (x, y, px) in image.enumerate_pixels() {
        let cell = Cell::new(x as i32, y as i32);
        match classify(px) {
            PixelClass::Wall => {
                walls.insert(cell);
            }
            PixelClass::Start => {
                start = Some(cell);
                start_hits += 1;
            }
            PixelClass::Goal => {
                goal = Some(cell);
                goal_hits += 1;
            }
            PixelClass::Path => {}
        }
    }

    let (start, goal) = match (start, goal) {
        (Some(s), Some(g)) => (s, g),
        (s, g) => {
            let mut missing = vec![];
            if s.is_none() { missing.push(Landmark::Start); }
            if g.is_none() { missing.push(Landmark::Goal); }
            return Err(DecodeError::MissingLandmark {
                source_id: source_id.to_string(),
                missing,
            });
        }
    };

    if start_hits > 1 || goal_hits > 1 {
        warn!(
            source = source_id,
            start_pixels = start_hits,
            goal_pixels = goal_hits,
            %start,
            %goal,
            "duplicate landmark pixels, last in scan order wins"
        );
    }

    debug!(source = source_id, width, height, walls = walls.len(), "maze decoded");

    Ok(MazeDescriptor {
        width: width as usize,
        height: height as usize,
        start,
        goal,
        walls,
    })
}

/// Load an image file in any format the `image` crate understands and decode it.
pub fn load_maze(path: &Path) -> Result<MazeDescriptor, DecodeError> {
    let source_id = path.display().to_string();
    let img = image::open(path)
        .map_err(|source| DecodeError::ImageLoad { source_id: source_id.clone(), source })?;
    decode(&img.to_rgba8(), &source_id)
}
