use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureOptions, Vec2};
use log::debug;

use crate::model::{FileId, SourceFile};
use crate::thumbnail::{
    RasterSurface, RenderEvent, RenderRequest, ThumbnailRenderer, ThumbnailSlot,
};

/// Where a rendered page is displayed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotId {
    Card(FileId, usize),
    Preview,
}

/// Textures of every page on screen, fed by the background renderer
pub struct ThumbnailBoard {
    renderer: ThumbnailRenderer,
    slots: HashMap<SlotId, ThumbnailSlot<TextureHandle>>,
}

impl ThumbnailBoard {
    pub fn new(renderer: ThumbnailRenderer) -> Self {
        Self {
            renderer,
            slots: HashMap::new(),
        }
    }

    /// Texture shown in `slot`. Requests a new render (cancelling the old
    /// one) whenever the page, scale or pixel density differs from what the
    /// slot currently holds.
    pub fn texture(
        &mut self,
        ctx: &Context,
        slot: SlotId,
        file: &SourceFile,
        page_index: usize,
        scale: f32,
    ) -> Option<TextureHandle> {
        let request = RenderRequest::new(file, page_index, scale, ctx.pixels_per_point());
        let entry = self.slots.entry(slot).or_default();
        if entry.needs_render(&request.key) {
            let key = request.key.clone();
            let token = self.renderer.submit(request);
            entry.begin(key, token);
        }
        entry.surface().cloned()
    }

    /// Upload finished renders and settle failed ones. Returns true when a
    /// texture changed.
    pub fn poll(&mut self, ctx: &Context) -> bool {
        let mut updated = false;
        for event in self.renderer.poll() {
            let Some(slot) = self.slots.values_mut().find(|s| s.is_current(event.token())) else {
                debug!("No slot waits for render {}", event.token().id());
                continue;
            };
            match event {
                RenderEvent::Completed(done) => {
                    let name = format!("page_{}_{}", done.key.file_id, done.key.page_index);
                    let texture =
                        ctx.load_texture(name, color_image(&done.surface), TextureOptions::LINEAR);
                    updated |= slot.commit(&done.token, texture);
                }
                RenderEvent::Failed { token, .. } => {
                    slot.fail(&token);
                }
            }
        }
        updated
    }

    pub fn has_pending(&self) -> bool {
        self.slots.values().any(ThumbnailSlot::is_pending)
    }

    /// Drop (and cancel) every slot for which `keep` is false
    pub fn retain(&mut self, mut keep: impl FnMut(&SlotId) -> bool) {
        self.slots.retain(|id, _| keep(id));
    }
}

fn color_image(surface: &RasterSurface) -> ColorImage {
    let size = [surface.width() as usize, surface.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, surface.image.as_raw())
}

/// Logical size of a texture rendered at the context's pixel density
pub fn texture_points(ctx: &Context, texture: &TextureHandle) -> Vec2 {
    texture.size_vec2() / ctx.pixels_per_point()
}
