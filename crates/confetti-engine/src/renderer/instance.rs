/// One filled, rotated square as handed to the canvas painter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectInstance {
    /// Center X in canvas pixels.
    pub x: f32,
    /// Center Y in canvas pixels.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Side length in pixels.
    pub size: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Per-frame list of rectangles, rebuilt after every tick.
pub struct RenderBuffer {
    instances: Vec<RectInstance>,
    capacity: usize,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Instances beyond `capacity` are dropped.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Returns false when the buffer is full.
    pub fn push(&mut self, instance: RectInstance) -> bool {
        if self.instances.len() >= self.capacity {
            return false;
        }
        self.instances.push(instance);
        true
    }

    pub fn instances(&self) -> &[RectInstance] {
        &self.instances
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_capacity() {
        let mut buf = RenderBuffer::with_capacity(2);
        assert!(buf.push(RectInstance::default()));
        assert!(buf.push(RectInstance::default()));
        assert!(!buf.push(RectInstance::default()));
        assert_eq!(buf.instance_count(), 2);
        buf.clear();
        assert_eq!(buf.instance_count(), 0);
    }

    #[test]
    fn default_capacity_fits_a_large_field() {
        let mut buf = RenderBuffer::new();
        for i in 0..1024 {
            assert!(buf.push(RectInstance { x: i as f32, size: 4.0, a: 1.0, ..Default::default() }));
        }
        assert!(!buf.push(RectInstance::default()));
        assert_eq!(buf.instances()[1023].x, 1023.0);
        assert_eq!(buf.capacity(), 1024);
    }
}
