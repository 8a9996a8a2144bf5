use crate::components::entity::Entity;
use crate::renderer::instance::{RenderBuffer, RectInstance};

/// Rebuild the render buffer from the scene. Inactive entities and entities
/// without a fill are skipped.
pub fn build_render_buffer<'a>(entities: impl Iterator<Item = &'a Entity>, buffer: &mut RenderBuffer) {
    buffer.clear();

    for entity in entities {
        if !entity.active {
            continue;
        }
        let Some(fill) = entity.fill else {
            continue;
        };

        let pushed = buffer.push(RectInstance {
            x: entity.pos.x,
            y: entity.pos.y,
            rotation: entity.rotation,
            size: entity.scale.x,
            r: fill.r,
            g: fill.g,
            b: fill.b,
            a: fill.a,
        });
        if !pushed {
            log::warn!("render buffer full at {} instances", buffer.capacity());
            break;
        }
    }
}
