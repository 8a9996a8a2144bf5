use confetti_engine::{
    build_render_buffer, Effect, EffectConfig, EngineContext, InputEvent, InputQueue,
    RenderBuffer, StepClock, Viewport,
};
use glam::Vec2;

/// Generic effect runner that wires up the engine loop.
///
/// The DOM host owns one runner per mounted container and drives it from
/// `requestAnimationFrame`: `tick`, paint the render buffer, `after_render`.
pub struct EffectRunner<E: Effect> {
    effect: E,
    ctx: EngineContext,
    input: InputQueue,
    render_buffer: RenderBuffer,
    clock: StepClock,
    config: EffectConfig,
    initialized: bool,
    builds: u32,
}

impl<E: Effect> EffectRunner<E> {
    pub fn new(effect: E, viewport: Viewport, seed: u64) -> Self {
        let config = effect.config();
        let clock = StepClock::new(config.fixed_dt, config.max_steps_per_frame);
        let render_buffer = RenderBuffer::with_capacity(config.max_instances);

        Self {
            ctx: EngineContext::new(&config, viewport, seed),
            effect,
            input: InputQueue::new(),
            render_buffer,
            clock,
            config,
            initialized: false,
            builds: 0,
        }
    }

    /// Populate the simulation. Declines (returns false) when the viewport
    /// has no area.
    pub fn init(&mut self) -> bool {
        let viewport = self.ctx.viewport();
        if viewport.is_empty() {
            log::info!(
                "effect not initialized: container is {}x{}",
                viewport.width,
                viewport.height
            );
            self.initialized = false;
            return false;
        }

        self.effect.init(&mut self.ctx);
        self.initialized = true;
        self.builds += 1;
        build_render_buffer(self.ctx.scene.iter(), &mut self.render_buffer);
        log::debug!(
            "effect built for {}x{} with {} entities ({} bodies)",
            viewport.width,
            viewport.height,
            self.ctx.scene.len(),
            self.ctx.physics.body_count()
        );
        true
    }

    /// Tear the simulation down and build it again for the new size.
    /// An empty viewport leaves the world empty until the next resize.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        self.ctx.clear();
        self.effect.reset();
        self.render_buffer.clear();
        self.input.drain();
        self.clock.reset();
        self.ctx.set_viewport(viewport);
        self.init()
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one display frame: pointer input, fixed steps of effect update +
    /// physics, then rebuild the render buffer.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            self.input.drain();
            return;
        }

        for event in self.input.iter() {
            self.ctx.handle_pointer(event);
        }

        let steps = self.clock.advance(dt);
        for _ in 0..steps {
            self.effect.update(&mut self.ctx, &self.input);
            self.ctx.step_physics();
        }

        self.input.drain();

        build_render_buffer(self.ctx.scene.iter(), &mut self.render_buffer);
    }

    /// Post-render hook; call after the frame was painted.
    pub fn after_render(&mut self) {
        if self.initialized {
            self.effect.after_render(&mut self.ctx);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// How many times the world has been (re)built.
    pub fn builds(&self) -> u32 {
        self.builds
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render_buffer
    }

    /// Segment to draw for the pointer constraint, only when it is visible
    /// and holding something.
    pub fn pointer_line(&self) -> Option<(Vec2, Vec2)> {
        if !self.ctx.pointer.visible || !self.ctx.pointer.is_dragging() {
            return None;
        }
        self.ctx.pointer.line(&self.ctx.physics)
    }

    pub fn instance_count(&self) -> u32 {
        self.render_buffer.instance_count()
    }
}
