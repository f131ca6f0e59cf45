//! Sprite creation and upload.
//!
//! A sprite owns one texture slot per tile. The tile textures are ordinary
//! textures of the context and are released through the registry when the
//! sprite goes away.

use super::RasterizerContext;
use crate::error::{RasterError, Result};
use crate::object::{
    ImageFormat, ImageView, ObjectKind, Slot, SpriteDesc, SpriteTile, TextureDesc, TextureFlags,
};
use crate::sprite::tile_sprite;

impl RasterizerContext {
    /// Tile a `format.width` x `format.height` image and create its textures.
    ///
    /// Replaces any sprite at `slot`, releasing its tile textures. On failure
    /// every texture acquired so far is released again.
    pub fn create_sprite(
        &mut self,
        slot: Slot,
        format: ImageFormat,
        flags: TextureFlags,
    ) -> Result<()> {
        let len = self.table_len();
        if slot.index() >= len {
            return Err(RasterError::SlotOutOfRange { slot, len });
        }
        self.delete_object(slot, ObjectKind::Sprite);

        let limits = self.caps.tile_limits(self.config.max_sprite_tiles_per_axis);
        let mut tiles = tile_sprite(format.width, format.height, &limits)?;

        let mut acquired = Vec::with_capacity(tiles.len());
        if let Err(e) = self.create_tile_textures(&mut tiles, format, flags, &mut acquired) {
            log::warn!("Sprite {} rolled back: {}", slot, e);
            let mut registry = self.registry.borrow_mut();
            for texture in acquired {
                registry.release(texture, ObjectKind::Texture, true);
            }
            return Err(e);
        }

        let desc = SpriteDesc {
            flags: flags | TextureFlags::VALID | TextureFlags::SPRITE,
            format,
            tiles,
        };
        self.insert(slot, |tables| {
            tables.sprites.insert(slot, desc).map(drop).map_err(drop)
        });
        Ok(())
    }

    fn create_tile_textures(
        &mut self,
        tiles: &mut [SpriteTile],
        format: ImageFormat,
        flags: TextureFlags,
        acquired: &mut Vec<Slot>,
    ) -> Result<()> {
        for tile in tiles.iter_mut() {
            let texture = self.create_object_index(ObjectKind::Texture)?;
            acquired.push(texture);

            let tile_format = ImageFormat::new(tile.sw, tile.sh, format.pixel_format);
            let mut desc = TextureDesc::new(tile_format);
            desc.flags = flags | TextureFlags::SPRITE;
            self.create_texture(texture, desc)?;
            tile.texture = texture;
        }
        Ok(())
    }

    /// Upload `image` into the tiles of the sprite at `slot`.
    ///
    /// Each tile is staged in the registry scratch buffer at its allocated
    /// size; the area outside the logical tile is zeroed.
    pub fn load_sprite(&mut self, slot: Slot, image: &ImageView<'_>) -> Result<()> {
        let tiles = match self.sprite_data(slot) {
            Some(sprite) => sprite.tiles.clone(),
            None => {
                return Err(RasterError::MissingObject {
                    kind: ObjectKind::Sprite,
                    slot,
                })
            }
        };

        let pixel_format = image.format.pixel_format;
        let bpp = pixel_format
            .bytes_per_pixel()
            .filter(|_| !pixel_format.is_compressed())
            .ok_or_else(|| {
                RasterError::InvalidDescriptor(format!(
                    "cannot tile {:?} pixels",
                    pixel_format
                ))
            })? as usize;

        let row_bytes = image.format.width as usize * bpp;
        if image.pitch < row_bytes {
            return Err(RasterError::InvalidArgument(format!(
                "pitch of {} bytes is shorter than a {}-byte row",
                image.pitch, row_bytes
            )));
        }

        for tile in &tiles {
            let dst_pitch = tile.sw as usize * bpp;
            let row_bytes = tile.w as usize * bpp;

            let mut registry = self.registry.borrow_mut();
            let staging = registry.allocate_scratch(dst_pitch * tile.sh as usize);
            staging.fill(0);

            for row in 0..tile.h as usize {
                let src = (tile.y as usize + row) * image.pitch + tile.x as usize * bpp;
                let end = src + row_bytes;
                let Some(pixels) = image.data.get(src..end) else {
                    return Err(RasterError::stream_too_short(
                        "image",
                        end,
                        image.data.len(),
                    ));
                };
                let dst = row * dst_pitch;
                staging[dst..dst + row_bytes].copy_from_slice(pixels);
            }

            let view = ImageView {
                format: ImageFormat::new(tile.sw, tile.sh, pixel_format),
                pitch: dst_pitch,
                data: staging,
            };
            self.objects_mut().backend.load_texture(tile.texture, &view)?;
        }

        log::debug!("Loaded sprite {} ({} tiles)", slot, tiles.len());
        Ok(())
    }
}
