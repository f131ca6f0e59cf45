//! Sprite tiling
//!
//! Splits a logical image into a grid of power-of-two texture tiles that
//! respect the driver's minimum size, maximum size and aspect-ratio caps.
//! Texture slots are assigned by the context once the grid is known.

use crate::bits::{next_power_of_two, prev_power_of_two};
use crate::error::{RasterError, Result};
use crate::object::{Slot, SpriteTile};
use smallvec::SmallVec;

/// Default cap on tiles along one axis.
pub const MAX_TILES_PER_AXIS: usize = 16;

/// Texture size constraints used to tile a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLimits {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Largest allowed width:height (or height:width) ratio, 0 for none.
    pub max_ratio: u32,
    pub max_tiles_per_axis: usize,
}

impl Default for TileLimits {
    fn default() -> Self {
        Self {
            min_width: 1,
            max_width: 256,
            min_height: 1,
            max_height: 256,
            max_ratio: 0,
            max_tiles_per_axis: MAX_TILES_PER_AXIS,
        }
    }
}

impl TileLimits {
    /// Round minimums up and maximums down to powers of two.
    fn normalized(&self) -> Self {
        let min_width = next_power_of_two(self.min_width.max(1));
        let min_height = next_power_of_two(self.min_height.max(1));
        Self {
            min_width,
            max_width: prev_power_of_two(self.max_width).max(min_width),
            min_height,
            max_height: prev_power_of_two(self.max_height).max(min_height),
            max_ratio: self.max_ratio,
            max_tiles_per_axis: self.max_tiles_per_axis,
        }
    }
}

// ── Axis tiling ─────────────────────────────────────────────────

/// One tile along a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTile {
    /// Position in the logical image.
    pub offset: u32,
    /// Logical extent covered by the tile.
    pub size: u32,
    /// Allocated texture extent, a power of two `>= size`. A closing tile
    /// of at least `min` pixels is allocated at `max`.
    pub alloc: u32,
}

/// Cover `[0, size)` with tiles of allocatable sizes in `[min, max]`.
///
/// `min` and `max` must be powers of two with `min <= max`. Returns `None`
/// when more than `max_tiles` tiles would be needed.
pub fn tile_axis(
    size: u32,
    min: u32,
    max: u32,
    max_tiles: usize,
) -> Option<SmallVec<[AxisTile; MAX_TILES_PER_AXIS]>> {
    let mut tiles = SmallVec::new();

    if size < min {
        tiles.push(AxisTile {
            offset: 0,
            size,
            alloc: min,
        });
        return Some(tiles);
    }

    if (size.is_power_of_two() && size <= max) || size == max {
        tiles.push(AxisTile {
            offset: 0,
            size,
            alloc: size,
        });
        return Some(tiles);
    }

    let mut offset = 0;
    let mut remaining = size;
    while remaining >= max {
        if tiles.len() == max_tiles {
            return None;
        }
        tiles.push(AxisTile {
            offset,
            size: max,
            alloc: max,
        });
        offset += max;
        remaining -= max;
    }

    if remaining > 0 {
        let alloc = if remaining >= min { max } else { min };
        tiles.push(AxisTile {
            offset,
            size: remaining,
            alloc,
        });
    }

    (tiles.len() <= max_tiles).then_some(tiles)
}

// ── Grid ────────────────────────────────────────────────────────

/// Tile a `width` x `height` image.
///
/// Tiles are returned row by row with null texture slots.
pub fn tile_sprite(width: u32, height: u32, limits: &TileLimits) -> Result<Vec<SpriteTile>> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDescriptor(format!(
            "sprite of {}x{} has no area",
            width, height
        )));
    }

    let limits = limits.normalized();
    let too_large = || RasterError::SpriteTooLarge {
        width,
        height,
        max_tiles: limits.max_tiles_per_axis,
    };

    let mut columns = tile_axis(
        width,
        limits.min_width,
        limits.max_width,
        limits.max_tiles_per_axis,
    )
    .ok_or_else(too_large)?;

    let mut min_height = limits.min_height;
    if limits.max_ratio > 0 {
        let widest = columns.iter().map(|c| c.alloc).max().unwrap_or(0);
        let floor = widest.div_ceil(limits.max_ratio);
        min_height = next_power_of_two(min_height.max(floor)).min(limits.max_height);
    }

    let mut rows = tile_axis(
        height,
        min_height,
        limits.max_height,
        limits.max_tiles_per_axis,
    )
    .ok_or_else(too_large)?;

    if limits.max_ratio > 0 {
        enforce_ratio(&mut columns, &mut rows, &limits);
    }

    let mut tiles = Vec::with_capacity(columns.len() * rows.len());
    for row in &rows {
        for column in &columns {
            tiles.push(SpriteTile {
                x: column.offset,
                y: row.offset,
                w: column.size,
                h: row.size,
                sw: column.alloc,
                sh: row.alloc,
                texture: Slot::NULL,
            });
        }
    }

    log::debug!(
        "Sprite {}x{} tiled as {}x{} textures",
        width,
        height,
        columns.len(),
        rows.len()
    );
    Ok(tiles)
}

/// Widen allocations until every column/row pair satisfies the ratio cap.
fn enforce_ratio(columns: &mut [AxisTile], rows: &mut [AxisTile], limits: &TileLimits) {
    let ratio = limits.max_ratio;
    loop {
        let mut changed = false;

        let tallest = rows.iter().map(|r| r.alloc).max().unwrap_or(0);
        let min_width = next_power_of_two(tallest.div_ceil(ratio)).min(limits.max_width);
        for column in columns.iter_mut().filter(|c| c.alloc < min_width) {
            column.alloc = min_width;
            changed = true;
        }

        let widest = columns.iter().map(|c| c.alloc).max().unwrap_or(0);
        let min_height = next_power_of_two(widest.div_ceil(ratio)).min(limits.max_height);
        for row in rows.iter_mut().filter(|r| r.alloc < min_height) {
            row.alloc = min_height;
            changed = true;
        }

        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(min: u32, max: u32, ratio: u32) -> TileLimits {
        TileLimits {
            min_width: min,
            max_width: max,
            min_height: min,
            max_height: max,
            max_ratio: ratio,
            max_tiles_per_axis: MAX_TILES_PER_AXIS,
        }
    }

    fn assert_partition(tiles: &[SpriteTile], width: u32, height: u32) {
        let mut covered = vec![0u8; (width * height) as usize];
        for tile in tiles {
            for y in tile.y..tile.y + tile.h {
                for x in tile.x..tile.x + tile.w {
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn small_axis_gets_min_allocation() {
        let tiles = tile_axis(5, 8, 256, 16).unwrap();
        assert_eq!(
            tiles.as_slice(),
            &[AxisTile {
                offset: 0,
                size: 5,
                alloc: 8
            }]
        );
    }

    #[test]
    fn legal_size_is_one_tile() {
        assert_eq!(tile_axis(64, 8, 256, 16).unwrap().len(), 1);
        assert_eq!(tile_axis(256, 8, 256, 16).unwrap()[0].alloc, 256);
    }

    #[test]
    fn tiny_remainder_closes_with_min_tile() {
        let tiles = tile_axis(515, 8, 256, 16).unwrap();
        assert_eq!(tiles.len(), 3);
        assert_eq!(
            tiles[2],
            AxisTile {
                offset: 512,
                size: 3,
                alloc: 8
            }
        );
    }

    #[test]
    fn remainder_closes_with_max_tile() {
        let tiles = tile_axis(600, 8, 256, 16).unwrap();
        assert_eq!(
            tiles.last(),
            Some(&AxisTile {
                offset: 512,
                size: 88,
                alloc: 256
            })
        );
        assert_eq!(tile_axis(264, 8, 256, 16).unwrap()[1].alloc, 256);
    }

    #[test]
    fn axis_tile_cap() {
        assert!(tile_axis(16 * 256, 8, 256, 16).is_some());
        assert!(tile_axis(16 * 256 + 1, 8, 256, 16).is_none());
    }

    #[test]
    fn thousand_by_six_hundred() {
        let tiles = tile_sprite(1000, 600, &limits(8, 256, 8)).unwrap();
        assert_eq!(tiles.len(), 12);
        assert_partition(&tiles, 1000, 600);

        let widths: Vec<_> = tiles[..4].iter().map(|t| (t.w, t.sw)).collect();
        assert_eq!(widths, vec![(256, 256), (256, 256), (256, 256), (232, 256)]);
        let heights: Vec<_> = tiles.iter().step_by(4).map(|t| (t.h, t.sh)).collect();
        assert_eq!(heights, vec![(256, 256), (256, 256), (88, 256)]);

        for tile in &tiles {
            assert!(tile.sw >= 8 && tile.sw <= 256 && tile.sw.is_power_of_two());
            assert!(tile.sh >= 8 && tile.sh <= 256 && tile.sh.is_power_of_two());
            assert!(tile.sw <= 8 * tile.sh && tile.sh <= 8 * tile.sw);
            assert!(tile.texture.is_null());
        }
    }

    #[test]
    fn ratio_widens_narrow_columns() {
        let tiles = tile_sprite(8, 1000, &limits(1, 1024, 2)).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!((tiles[0].w, tiles[0].sw), (8, 512));
        assert_eq!((tiles[0].h, tiles[0].sh), (1000, 1024));
    }

    #[test]
    fn ratio_floors_row_height() {
        let tiles = tile_sprite(256, 4, &limits(1, 256, 4)).unwrap();
        assert_eq!(tiles[0].sh, 64);
    }

    #[test]
    fn limits_are_normalized() {
        let tiles = tile_sprite(100, 100, &limits(5, 100, 0)).unwrap();
        // min 8, max 64
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[1].sw, 64);
        assert_eq!(tiles[1].w, 36);
        assert_partition(&tiles, 100, 100);
    }

    #[test]
    fn oversized_and_empty_sprites_are_rejected() {
        assert_eq!(
            tile_sprite(5000, 10, &limits(8, 256, 0)),
            Err(RasterError::SpriteTooLarge {
                width: 5000,
                height: 10,
                max_tiles: 16
            })
        );
        assert!(matches!(
            tile_sprite(0, 10, &limits(8, 256, 0)),
            Err(RasterError::InvalidDescriptor(_))
        ));
    }
}
