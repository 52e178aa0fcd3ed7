//! Browser binding: canvas surface, DOM events, timers and asset loaders.
//!
//! Everything here is a thin shell around [`GameCore`]. Fallible DOM calls
//! return `Result<_, JsValue>`; failures inside event callbacks are logged
//! with `tracing` because there is no caller to hand them to.

use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::{Rc, Weak};

use kurbo::Affine;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, EventTarget, HtmlCanvasElement, HtmlImageElement,
    ImageData, KeyboardEvent, MouseEvent, Response, TouchEvent, Window,
};

use crate::asset::{Asset, Bitmap, SheetMeta};
use crate::config::GameConfig;
use crate::engine::{Action, GameCore};
use crate::error::SceneError;
use crate::geom::Point;
use crate::input::Key;
use crate::shape::Geometry;
use crate::surface::{Color, Rect, Surface, SurfaceError};

fn js_error(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn surface_error(err: JsValue) -> SurfaceError {
    SurfaceError(js_error(&err))
}

fn scene_to_js(err: SceneError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn document() -> Result<Document, JsValue> {
    window()?.document().ok_or_else(|| JsValue::from_str("no document"))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = document()?.create_element("canvas")?.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from)?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

// =============================================================
// Canvas surface
// =============================================================

/// [`Surface`] over a `CanvasRenderingContext2d`.
///
/// The context's own transform stack is mirrored so `transform()` can be
/// answered without a round trip to the browser.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    current: Affine,
    stack: Vec<Affine>,
    uploads: Vec<(Weak<Bitmap>, HtmlCanvasElement)>,
}

impl CanvasSurface {
    /// Wrap a canvas element.
    ///
    /// # Errors
    ///
    /// Fails if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx, current: Affine::IDENTITY, stack: Vec::new(), uploads: Vec::new() })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn trace(&self, geometry: &Geometry) -> Result<(), JsValue> {
        self.ctx.begin_path();
        match geometry {
            Geometry::Rectangle { width, height } => self.ctx.rect(-width / 2.0, -height / 2.0, *width, *height),
            Geometry::Oval { rx, ry } => self.ctx.ellipse(0.0, 0.0, *rx, *ry, 0.0, 0.0, TAU)?,
            Geometry::Polygon(points) | Geometry::Line(points) => {
                for (i, p) in points.iter().enumerate() {
                    if i == 0 {
                        self.ctx.move_to(p.x(), p.y());
                    } else {
                        self.ctx.line_to(p.x(), p.y());
                    }
                }
                if geometry.is_closed() {
                    self.ctx.close_path();
                }
            }
        }
        Ok(())
    }

    /// Offscreen canvas holding `bitmap`'s pixels, uploaded on first use.
    fn upload(&mut self, bitmap: &Rc<Bitmap>) -> Result<HtmlCanvasElement, JsValue> {
        self.uploads.retain(|(weak, _)| weak.strong_count() > 0);
        let cached = self.uploads.iter().find(|(weak, _)| weak.upgrade().is_some_and(|b| Rc::ptr_eq(&b, bitmap)));
        if let Some((_, canvas)) = cached {
            return Ok(canvas.clone());
        }
        let (width, height) = (bitmap.width(), bitmap.height());
        let canvas = create_canvas(width, height)?;
        let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(bitmap.pixels()), width, height)?;
        context_2d(&canvas)?.put_image_data(&data, 0.0, 0.0)?;
        self.uploads.push((Rc::downgrade(bitmap), canvas.clone()));
        Ok(canvas)
    }
}

impl Surface for CanvasSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        // Resizing a canvas resets its context state.
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.current = Affine::IDENTITY;
        self.stack.clear();
    }

    fn save(&mut self) {
        self.stack.push(self.current);
        self.ctx.save();
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
            self.ctx.restore();
        }
    }

    fn transform(&self) -> Affine {
        self.current
    }

    fn set_transform(&mut self, t: Affine) -> Result<(), SurfaceError> {
        let [a, b, c, d, e, f] = t.as_coeffs();
        self.ctx.set_transform(a, b, c, d, e, f).map_err(surface_error)?;
        self.current = t;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.ctx.save();
        let cleared = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map(|()| {
            self.ctx.clear_rect(0.0, 0.0, f64::from(self.canvas.width()), f64::from(self.canvas.height()));
        });
        self.ctx.restore();
        cleared.map_err(surface_error)
    }

    fn alpha_at(&self, x: i64, y: i64) -> Result<u8, SurfaceError> {
        let (width, height) = (i64::from(self.canvas.width()), i64::from(self.canvas.height()));
        if !(0..width).contains(&x) || !(0..height).contains(&y) {
            return Ok(0);
        }
        #[allow(clippy::cast_precision_loss)]
        let data = self.ctx.get_image_data(x as f64, y as f64, 1.0, 1.0).map_err(surface_error)?;
        Ok(data.data().get(3).copied().unwrap_or(0))
    }

    fn fill(&mut self, geometry: &Geometry, color: Color) -> Result<(), SurfaceError> {
        if !geometry.is_closed() {
            return Ok(());
        }
        self.trace(geometry).map_err(surface_error)?;
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
        Ok(())
    }

    fn stroke(&mut self, geometry: &Geometry, color: Color, line_width: f64) -> Result<(), SurfaceError> {
        self.trace(geometry).map_err(surface_error)?;
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(line_width);
        self.ctx.stroke();
        Ok(())
    }

    fn draw_image(&mut self, image: &Rc<Bitmap>, src: Rect, dest: Rect) -> Result<(), SurfaceError> {
        let source = self.upload(image).map_err(surface_error)?;
        self.ctx
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &source,
                src.x,
                src.y,
                src.width,
                src.height,
                dest.x,
                dest.y,
                dest.width,
                dest.height,
            )
            .map_err(surface_error)
    }

    fn fill_text(&mut self, text: &str, font: &str, color: Color) -> Result<(), SurfaceError> {
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_text(text, 0.0, 0.0).map_err(surface_error)
    }
}

// =============================================================
// Pointer normalization
// =============================================================

/// Mouse position in canvas space.
///
/// # Errors
///
/// Fails if the computed position is not finite.
pub fn pointer_from_mouse(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Result<Point, SceneError> {
    let rect = canvas.get_bounding_client_rect();
    Point::new(f64::from(event.client_x()) - rect.left(), f64::from(event.client_y()) - rect.top())
}

/// Position of the first active touch in canvas space. A `touchend` has no
/// active touches, so the first changed touch is used instead.
///
/// # Errors
///
/// Fails if the computed position is not finite.
pub fn pointer_from_touch(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Result<Option<Point>, SceneError> {
    let Some(touch) = event.touches().get(0).or_else(|| event.changed_touches().get(0)) else {
        return Ok(None);
    };
    let rect = canvas.get_bounding_client_rect();
    Point::new(f64::from(touch.client_x()) - rect.left(), f64::from(touch.client_y()) - rect.top()).map(Some)
}

fn pointer_of(canvas: &HtmlCanvasElement, event: &web_sys::Event) -> Result<Option<Point>, SceneError> {
    // TouchEvent is undefined on some desktop browsers.
    if event.type_().starts_with("touch") {
        event.prevent_default();
        return pointer_from_touch(canvas, event.unchecked_ref::<TouchEvent>());
    }
    match event.dyn_ref::<MouseEvent>() {
        Some(mouse) => pointer_from_mouse(canvas, mouse).map(Some),
        None => Ok(None),
    }
}

// =============================================================
// Game
// =============================================================

/// A game bound to a visible canvas. The scratch canvas used for hit-tests
/// is never attached to the document.
pub struct Game {
    surface: CanvasSurface,
    pub core: GameCore<CanvasSurface>,
}

impl Game {
    /// Bind to `canvas`. A scratch canvas of the same size is created when
    /// none is given.
    ///
    /// # Errors
    ///
    /// Fails if a canvas has no 2D context or the configuration is invalid.
    pub fn new(
        canvas: HtmlCanvasElement,
        scratch: Option<HtmlCanvasElement>,
        config: GameConfig,
    ) -> Result<Self, JsValue> {
        let scratch = match scratch {
            Some(scratch) => {
                scratch.set_width(canvas.width());
                scratch.set_height(canvas.height());
                scratch
            }
            None => create_canvas(canvas.width(), canvas.height())?,
        };
        let core = GameCore::new(CanvasSurface::new(scratch)?, config).map_err(scene_to_js)?;
        Ok(Self { surface: CanvasSurface::new(canvas)?, core })
    }

    #[must_use]
    pub fn canvas(&self) -> &HtmlCanvasElement {
        self.surface.canvas()
    }

    /// Resize the visible canvas and the scratch canvas together.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.core.resize(width, height);
    }

    /// Draw and animate once.
    ///
    /// # Errors
    ///
    /// Propagates canvas failures.
    pub fn frame(&mut self) -> Result<(), JsValue> {
        self.core.frame(&mut self.surface).map_err(scene_to_js)
    }

    /// Wire DOM events and timers to `game`. Dropping the handle detaches
    /// everything again.
    ///
    /// # Errors
    ///
    /// Fails if a listener or timer cannot be registered.
    pub fn attach(game: &Rc<RefCell<Self>>) -> Result<GameHandle, JsValue> {
        let window = window()?;
        let document = document()?;
        let (canvas, config) = {
            let g = game.try_borrow().map_err(|e| JsValue::from_str(&e.to_string()))?;
            (g.canvas().clone(), g.core.config)
        };
        let timer = HoldTimer::new(window.clone(), game, config.hold_interval_ms);
        let canvas_target: &EventTarget = canvas.as_ref();
        let document_target: &EventTarget = document.as_ref();

        let mut listeners = Vec::new();
        for name in ["mousedown", "touchstart"] {
            let (game, timer, canvas) = (Rc::clone(game), Rc::clone(&timer), canvas.clone());
            listeners.push(Listener::new(canvas_target, name, move |event| {
                if let Some(point) = pointer_or_log(&canvas, &event) {
                    if let Some(result) = with_game(&game, |g| g.core.pointer_down(point)) {
                        react(result, &timer);
                    }
                }
            })?);
        }
        for name in ["mousemove", "touchmove"] {
            let (game, timer, canvas) = (Rc::clone(game), Rc::clone(&timer), canvas.clone());
            listeners.push(Listener::new(canvas_target, name, move |event| {
                if let Some(point) = pointer_or_log(&canvas, &event) {
                    if let Some(result) = with_game(&game, |g| g.core.pointer_move(point)) {
                        react(result, &timer);
                    }
                }
            })?);
        }
        for name in ["mouseup", "touchend"] {
            let (game, timer, canvas) = (Rc::clone(game), Rc::clone(&timer), canvas.clone());
            listeners.push(Listener::new(canvas_target, name, move |event| {
                if let Some(point) = pointer_or_log(&canvas, &event) {
                    if let Some(actions) = with_game(&game, |g| g.core.pointer_up(point)) {
                        react(Ok(actions), &timer);
                    }
                }
            })?);
        }
        listeners.push(Listener::new(canvas_target, "contextmenu", |event| event.prevent_default())?);
        {
            let game = Rc::clone(game);
            listeners.push(Listener::new(document_target, "keydown", move |event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
                    with_game(&game, |g| g.core.key_down(Key(key)));
                }
            })?);
        }
        {
            let game = Rc::clone(game);
            listeners.push(Listener::new(document_target, "keyup", move |event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
                    with_game(&game, |g| g.core.key_up(&Key(key)));
                }
            })?);
        }

        let frame = {
            let game = Rc::clone(game);
            Interval::new(&window, config.frame_interval_ms, move || {
                if let Some(Err(e)) = with_game(&game, Game::frame) {
                    tracing::warn!(error = %js_error(&e), "frame failed");
                }
            })?
        };
        let key_hold = {
            let game = Rc::clone(game);
            Interval::new(&window, config.key_hold_interval_ms, move || {
                with_game(&game, |g| g.core.key_hold_tick());
            })?
        };

        tracing::info!(width = canvas.width(), height = canvas.height(), "game attached");
        Ok(GameHandle { listeners, intervals: vec![frame, key_hold], timer })
    }
}

/// Run `f` on the game unless it is already borrowed by an outer callback.
fn with_game<R>(game: &Rc<RefCell<Game>>, f: impl FnOnce(&mut Game) -> R) -> Option<R> {
    match game.try_borrow_mut() {
        Ok(mut g) => Some(f(&mut g)),
        Err(_) => {
            tracing::warn!("game busy; event skipped");
            None
        }
    }
}

fn pointer_or_log(canvas: &HtmlCanvasElement, event: &web_sys::Event) -> Option<Point> {
    match pointer_of(canvas, event) {
        Ok(point) => point,
        Err(e) => {
            tracing::warn!(error = %e, "pointer position rejected");
            None
        }
    }
}

/// Start or stop the hold timer as the core asks.
fn react(result: Result<Vec<Action>, SceneError>, timer: &HoldTimer) {
    match result {
        Ok(actions) => {
            for action in actions {
                match action {
                    Action::HoldStarted(_) => timer.start(),
                    Action::HoldFinished(_) => timer.stop(),
                    _ => {}
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "pointer dispatch failed"),
    }
}

// =============================================================
// Listeners and timers
// =============================================================

struct Listener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn new(target: &EventTarget, name: &'static str, f: impl FnMut(web_sys::Event) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(f);
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        Ok(Self { target: target.clone(), name, closure })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let callback = self.closure.as_ref().unchecked_ref();
        if let Err(e) = self.target.remove_event_listener_with_callback(self.name, callback) {
            tracing::warn!(event = self.name, error = %js_error(&e), "could not remove listener");
        }
    }
}

struct Interval {
    window: Window,
    id: i32,
    _tick: Closure<dyn FnMut()>,
}

impl Interval {
    fn new(window: &Window, period_ms: u32, f: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let tick = Closure::<dyn FnMut()>::new(f);
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            i32::try_from(period_ms).unwrap_or(i32::MAX),
        )?;
        Ok(Self { window: window.clone(), id, _tick: tick })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.id);
    }
}

/// The hold timer runs only while a holdable element is pressed.
struct HoldTimer {
    window: Window,
    period_ms: i32,
    id: Cell<Option<i32>>,
    tick: Closure<dyn FnMut()>,
}

impl HoldTimer {
    fn new(window: Window, game: &Rc<RefCell<Game>>, period_ms: u32) -> Rc<Self> {
        let game = Rc::clone(game);
        Rc::new_cyclic(|me: &Weak<Self>| {
            let me = me.clone();
            let tick = Closure::<dyn FnMut()>::new(move || {
                let Some(actions) = with_game(&game, |g| g.core.hold_tick()) else {
                    return;
                };
                if let Some(timer) = me.upgrade() {
                    react(Ok(actions), &timer);
                }
            });
            Self { window, period_ms: i32::try_from(period_ms).unwrap_or(i32::MAX), id: Cell::new(None), tick }
        })
    }

    fn start(&self) {
        if self.id.get().is_some() {
            return;
        }
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(self.tick.as_ref().unchecked_ref(), self.period_ms)
        {
            Ok(id) => self.id.set(Some(id)),
            Err(e) => tracing::warn!(error = %js_error(&e), "could not start hold timer"),
        }
    }

    fn stop(&self) {
        if let Some(id) = self.id.take() {
            self.window.clear_interval_with_handle(id);
        }
    }
}

/// Keeps a game wired to the page. Dropping it removes every listener and
/// stops every timer.
pub struct GameHandle {
    listeners: Vec<Listener>,
    intervals: Vec<Interval>,
    timer: Rc<HoldTimer>,
}

impl GameHandle {
    /// Number of DOM listeners installed.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of always-on timers (frame loop and key-hold loop).
    #[must_use]
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        self.timer.stop();
        tracing::debug!("game detached");
    }
}

// =============================================================
// Asset loaders
// =============================================================

/// Start loading an image; the returned asset resolves when decoding ends.
#[must_use]
pub fn load_image(url: &str) -> Asset<Bitmap> {
    let asset = Asset::loading();
    let pending = asset.clone();
    let url = url.to_owned();
    spawn_local(async move {
        match fetch_bitmap(&url).await {
            Ok(bitmap) => pending.resolve(bitmap),
            Err(e) => {
                let reason = js_error(&e);
                tracing::warn!(%url, %reason, "image failed to load");
                pending.fail(reason);
            }
        }
    });
    asset
}

async fn fetch_bitmap(url: &str) -> Result<Bitmap, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_cross_origin(Some("anonymous"));
    image.set_src(url);
    let decoded: js_sys::Promise = image.decode();
    JsFuture::from(decoded).await?;
    let (width, height) = (image.natural_width(), image.natural_height());
    let canvas = create_canvas(width, height)?;
    let ctx = context_2d(&canvas)?;
    ctx.draw_image_with_html_image_element(&image, 0.0, 0.0)?;
    let data = ctx.get_image_data(0.0, 0.0, f64::from(width), f64::from(height))?;
    Bitmap::from_rgba(width, height, data.data().0).map_err(scene_to_js)
}

/// Start loading sprite-sheet metadata (JSON with `frame_count`,
/// `frame_width`, `frame_height`).
#[must_use]
pub fn load_sheet_meta(url: &str) -> Asset<SheetMeta> {
    let asset = Asset::loading();
    let pending = asset.clone();
    let url = url.to_owned();
    spawn_local(async move {
        match fetch_sheet_meta(&url).await {
            Ok(meta) => pending.resolve(meta),
            Err(e) => {
                let reason = js_error(&e);
                tracing::warn!(%url, %reason, "sprite sheet metadata failed to load");
                pending.fail(reason);
            }
        }
    });
    asset
}

async fn fetch_sheet_meta(url: &str) -> Result<SheetMeta, JsValue> {
    let response: Response = JsFuture::from(window()?.fetch_with_str(url)).await?.dyn_into()?;
    let status = response.status();
    if !(200..300).contains(&status) {
        return Err(JsValue::from_str(&format!("HTTP {status}")));
    }
    let text = JsFuture::from(response.text()?).await?;
    let raw = text.as_string().ok_or_else(|| JsValue::from_str("response body is not text"))?;
    SheetMeta::from_json(&raw).map_err(scene_to_js)
}
