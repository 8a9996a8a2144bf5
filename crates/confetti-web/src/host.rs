//! DOM side of a mounted effect: the canvas child, the listeners and the
//! `requestAnimationFrame` loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use confetti_engine::{Effect, Fill, InputEvent, RenderBuffer, Viewport};
use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
    Node, Window,
};

use crate::runner::EffectRunner;

const CONSTRAINT_STROKE: &str = "rgba(255,255,255,0.6)";

type FrameCallback = Closure<dyn FnMut(f64)>;

struct Surface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl Surface {
    fn fit(&self, viewport: Viewport) {
        self.canvas.set_width(viewport.width.max(0.0) as u32);
        self.canvas.set_height(viewport.height.max(0.0) as u32);
    }

    fn paint(&self, buffer: &RenderBuffer, line: Option<(Vec2, Vec2)>) -> Result<(), JsValue> {
        let ctx = &self.context;
        ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );

        for inst in buffer.instances() {
            let fill = Fill { r: inst.r, g: inst.g, b: inst.b, a: inst.a };
            let size = inst.size as f64;
            ctx.save();
            ctx.translate(inst.x as f64, inst.y as f64)?;
            ctx.rotate(inst.rotation as f64)?;
            ctx.set_fill_style_str(&fill.to_css());
            ctx.fill_rect(-size / 2.0, -size / 2.0, size, size);
            ctx.restore();
        }

        if let Some((from, to)) = line {
            ctx.begin_path();
            ctx.move_to(from.x as f64, from.y as f64);
            ctx.line_to(to.x as f64, to.y as f64);
            ctx.set_stroke_style_str(CONSTRAINT_STROKE);
            ctx.set_line_width(1.5);
            ctx.stroke();
        }
        Ok(())
    }
}

struct MountState<E: Effect> {
    runner: EffectRunner<E>,
    surface: Surface,
    last_frame: Option<f64>,
}

impl<E: Effect> MountState<E> {
    /// One display frame: step, paint, then the post-render hook.
    fn frame(&mut self, timestamp: f64) -> Result<(), JsValue> {
        let dt = match self.last_frame {
            Some(prev) => ((timestamp - prev) / 1000.0) as f32,
            None => self.runner.config().fixed_dt,
        };
        self.last_frame = Some(timestamp);

        self.runner.tick(dt);
        self.surface
            .paint(self.runner.render_buffer(), self.runner.pointer_line())?;
        self.runner.after_render();
        Ok(())
    }
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        Ok(Self { target, kind, callback })
    }

    fn detach(&self) {
        let removed = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
        if let Err(err) = removed {
            log::warn!("could not remove {} listener: {:?}", self.kind, err);
        }
    }
}

/// A running effect attached to one container element.
/// Dropping it leaves the effect running; call `unmount` to stop it.
pub struct MountedEffect {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    alive: Rc<Cell<bool>>,
    frame_request: Rc<Cell<Option<i32>>>,
    frame: Rc<RefCell<Option<FrameCallback>>>,
    listeners: Vec<Listener>,
}

impl MountedEffect {
    pub fn is_mounted_on(&self, container: &HtmlElement) -> bool {
        let node: &Node = container.as_ref();
        self.container.is_same_node(Some(node))
    }

    /// Stop the frame loop, detach every listener and remove the canvas.
    pub fn unmount(self) {
        self.alive.set(false);
        if let (Some(id), Some(window)) = (self.frame_request.take(), web_sys::window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                log::warn!("could not cancel frame request: {:?}", err);
            }
        }
        for listener in &self.listeners {
            listener.detach();
        }
        self.frame.borrow_mut().take();
        self.canvas.remove();
        log::info!("effect unmounted");
    }
}

/// Look up a mount target by element id. `Ok(None)` when there is no such
/// element or it is not an HTML element.
pub fn find_container(container_id: &str) -> Result<Option<HtmlElement>, JsValue> {
    let document = window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    Ok(document
        .get_element_by_id(container_id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok()))
}

/// Current pixel size of the container.
pub fn container_viewport(container: &HtmlElement) -> Viewport {
    Viewport::new(container.client_width() as f32, container.client_height() as f32)
}

/// Seed for effects that were not given one.
pub fn random_seed() -> u64 {
    let noise = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let now = js_sys::Date::now() as u64;
    (noise << 32) ^ now
}

/// Attach `effect` to `container`: add a canvas child sized to the
/// container, wire pointer and resize listeners and start the frame loop.
///
/// A container with no area is declined with `Ok(None)`: nothing is
/// created and no loop starts.
pub fn mount<E: Effect + 'static>(
    container: &HtmlElement,
    effect: E,
    seed: u64,
) -> Result<Option<MountedEffect>, JsValue> {
    let viewport = container_viewport(container);
    if viewport.is_empty() {
        log::info!(
            "not mounting: container is {}x{}",
            viewport.width,
            viewport.height
        );
        return Ok(None);
    }

    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    let context = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let surface = Surface { canvas: canvas.clone(), context };
    surface.fit(viewport);
    container.append_child(&canvas)?;

    let mut runner = EffectRunner::new(effect, viewport, seed);
    runner.init();
    let state = Rc::new(RefCell::new(MountState {
        runner,
        surface,
        last_frame: None,
    }));

    let mut listeners = Vec::with_capacity(5);
    let canvas_target: EventTarget = canvas.clone().into();
    listeners.push(Listener::attach(
        canvas_target.clone(),
        "mousedown",
        pointer_callback(state.clone(), |x, y| InputEvent::PointerDown { x, y }),
    )?);
    listeners.push(Listener::attach(
        canvas_target.clone(),
        "mousemove",
        pointer_callback(state.clone(), |x, y| InputEvent::PointerMove { x, y }),
    )?);
    listeners.push(Listener::attach(
        canvas_target.clone(),
        "mouseup",
        pointer_callback(state.clone(), |x, y| InputEvent::PointerUp { x, y }),
    )?);
    listeners.push(Listener::attach(
        canvas_target,
        "mouseleave",
        pointer_callback(state.clone(), |x, y| InputEvent::PointerUp { x, y }),
    )?);
    listeners.push(Listener::attach(
        window.clone().into(),
        "resize",
        resize_callback(state.clone(), container.clone()),
    )?);

    let alive = Rc::new(Cell::new(true));
    let frame_request = Rc::new(Cell::new(None));
    let frame = start_frame_loop(state, alive.clone(), frame_request.clone())?;

    Ok(Some(MountedEffect {
        container: container.clone(),
        canvas,
        alive,
        frame_request,
        frame,
        listeners,
    }))
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn pointer_callback<E: Effect + 'static>(
    state: Rc<RefCell<MountState<E>>>,
    make: fn(f32, f32) -> InputEvent,
) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |event: Event| {
        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
            let input = make(mouse.offset_x() as f32, mouse.offset_y() as f32);
            state.borrow_mut().runner.push_input(input);
        }
    }) as Box<dyn FnMut(Event)>)
}

/// Every resize notification rebuilds the field from scratch, no debounce.
fn resize_callback<E: Effect + 'static>(
    state: Rc<RefCell<MountState<E>>>,
    container: HtmlElement,
) -> Closure<dyn FnMut(Event)> {
    Closure::wrap(Box::new(move |_event: Event| {
        let viewport = container_viewport(&container);
        let mut st = state.borrow_mut();
        st.surface.fit(viewport);
        st.runner.resize(viewport);
        st.last_frame = None;
    }) as Box<dyn FnMut(Event)>)
}

fn request_frame(frame: &Rc<RefCell<Option<FrameCallback>>>) -> Result<i32, JsValue> {
    let borrowed = frame.borrow();
    let callback = borrowed
        .as_ref()
        .ok_or_else(|| JsValue::from_str("frame loop stopped"))?;
    window()?.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Start the single frame loop of a mount. The returned cell owns the
/// callback; emptying it (on unmount) breaks the self-reference.
fn start_frame_loop<E: Effect + 'static>(
    state: Rc<RefCell<MountState<E>>>,
    alive: Rc<Cell<bool>>,
    frame_request: Rc<Cell<Option<i32>>>,
) -> Result<Rc<RefCell<Option<FrameCallback>>>, JsValue> {
    let frame: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = frame.clone();
    let request = frame_request.clone();

    *frame.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        if !alive.get() {
            return;
        }
        if let Err(err) = state.borrow_mut().frame(timestamp) {
            log::warn!("frame failed: {:?}", err);
        }
        match request_frame(&next) {
            Ok(id) => request.set(Some(id)),
            Err(err) => log::warn!("frame loop stopped: {:?}", err),
        }
    }) as Box<dyn FnMut(f64)>));

    frame_request.set(Some(request_frame(&frame)?));
    Ok(frame)
}
