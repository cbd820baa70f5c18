use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, TouchEvent};
use yew::prelude::*;

use crate::model::{SettingKey, Settings};
use crate::render;
use crate::state::{Session, TouchState};
use crate::util::{clog, load_item, now_ms, store_item};

use super::{
    camera_controls::CameraControls, expression_bar::ExpressionBar,
    intro_overlay::IntroOverlay, settings_modal::SettingsModal,
};

const DEFAULT_SOURCE: &str = "sin(t-sqrt((x-7.5)^2+(y-6)^2))";
const SOURCE_KEY: &str = "gt_source";
const INTRO_KEY: &str = "gt_intro_seen";

/// Fixed zoom step for wheel input and the on-screen buttons when smooth
/// zoom is off.
const ZOOM_STEP: f64 = 0.1;
/// Pinch distance delta to wheel-delta conversion.
const PINCH_TO_WHEEL: f64 = 5.0;

#[function_component(CanvasView)]
pub fn canvas_view() -> Html {
    let canvas_ref = use_node_ref();
    let source = use_state(|| load_item(SOURCE_KEY).unwrap_or_else(|| DEFAULT_SOURCE.to_string()));
    let session = {
        let initial = (*source).clone();
        use_mut_ref(move || Session::new(&initial, Settings::load(), 800.0, 600.0, now_ms()))
    };
    let touch_state = use_mut_ref(TouchState::default);
    let settings_ui = use_state({
        let session = session.clone();
        move || session.borrow().settings
    });
    let open_settings = use_state(|| false);
    // Show the help overlay only until it has been dismissed once.
    let show_intro = use_state(|| load_item(INTRO_KEY).is_none());

    let on_source_input = {
        let session = session.clone();
        let source = source.clone();
        Callback::from(move |text: String| {
            session.borrow_mut().recompile(&text, now_ms());
            store_item(SOURCE_KEY, &text);
            source.set(text);
        })
    };

    let on_toggle = {
        let session = session.clone();
        let settings_ui = settings_ui.clone();
        let canvas_ref = canvas_ref.clone();
        Callback::from(move |key: SettingKey| {
            let mut s = session.borrow_mut();
            s.settings.toggle(key);
            if key == SettingKey::Emulator {
                // Entering or leaving the fixed window re-frames the view.
                if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                    let emulator = s.settings.emulator;
                    s.camera
                        .reset(emulator, canvas.width() as f64, canvas.height() as f64);
                }
            }
            s.settings.persist();
            settings_ui.set(s.settings);
        })
    };

    let on_reset_camera = {
        let session = session.clone();
        let canvas_ref = canvas_ref.clone();
        Callback::from(move |_| {
            if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                let mut s = session.borrow_mut();
                let emulator = s.settings.emulator;
                s.camera
                    .reset(emulator, canvas.width() as f64, canvas.height() as f64);
            }
        })
    };

    let on_fullscreen = {
        let canvas_ref = canvas_ref.clone();
        Callback::from(move |_| {
            if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                let _ = canvas.request_fullscreen();
            }
        })
    };

    let zoom_step = |direction: f64| {
        let session = session.clone();
        let canvas_ref = canvas_ref.clone();
        Callback::from(move |_| {
            if let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() {
                let mut s = session.borrow_mut();
                s.camera.zoom_by(
                    ZOOM_STEP * direction,
                    canvas.width() as f64 / 2.0,
                    canvas.height() as f64 / 2.0,
                );
            }
        })
    };
    let on_zoom_in = zoom_step(1.0);
    let on_zoom_out = zoom_step(-1.0);

    let on_show_help = {
        let show_intro = show_intro.clone();
        Callback::from(move |_| show_intro.set(true))
    };
    let hide_intro = {
        let show_intro = show_intro.clone();
        Callback::from(move |_| {
            show_intro.set(false);
            store_item(INTRO_KEY, "1");
        })
    };
    let on_open_settings = {
        let open_settings = open_settings.clone();
        Callback::from(move |_| open_settings.set(true))
    };
    let on_close_settings = {
        let open_settings = open_settings.clone();
        Callback::from(move |_| open_settings.set(false))
    };

    // Main mount effect (canvas sizing, events, frame loop)
    {
        let canvas_ref = canvas_ref.clone();
        let session_setup = session.clone();
        let touch_state_setup = touch_state.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window().expect("window");
            let document = window.document().expect("document");
            let canvas: HtmlCanvasElement = canvas_ref.cast::<HtmlCanvasElement>().expect("canvas");

            let compute_and_apply_canvas_size = {
                let canvas = canvas.clone();
                let document = document.clone();
                let window = window.clone();
                move || {
                    let bar_height: f64 = document
                        .get_element_by_id("top-bar")
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                        .map(|el| el.client_height() as f64)
                        .unwrap_or(0.0);
                    let width = window
                        .inner_width()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(800.0);
                    let height = window
                        .inner_height()
                        .ok()
                        .and_then(|v| v.as_f64())
                        .unwrap_or(600.0)
                        - bar_height;
                    canvas.set_width(width.max(0.0) as u32);
                    canvas.set_height(height.max(0.0) as u32);
                }
            };
            compute_and_apply_canvas_size();
            clog(&format!(
                "canvas mounted at {}x{}",
                canvas.width(),
                canvas.height()
            ));

            // Frame the default window against the real canvas size.
            {
                let mut s = session_setup.borrow_mut();
                let emulator = s.settings.emulator;
                s.camera
                    .reset(emulator, canvas.width() as f64, canvas.height() as f64);
            }

            // RAF loop
            let raf_id = Rc::new(RefCell::new(None));
            let closure_cell: Rc<RefCell<Option<Closure<dyn FnMut()>>>> =
                Rc::new(RefCell::new(None));
            {
                let raf_id_clone = raf_id.clone();
                let closure_cell_clone = closure_cell.clone();
                let window_loop = window.clone();
                let canvas_loop = canvas.clone();
                let session_loop = session_setup.clone();
                *closure_cell.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                    let now = now_ms();
                    if canvas_loop.is_connected() {
                        if let Some(ctx) = canvas_loop
                            .get_context("2d")
                            .ok()
                            .flatten()
                            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
                        {
                            let w = canvas_loop.width() as f64;
                            let h = canvas_loop.height() as f64;
                            let mut s = session_loop.borrow_mut();
                            s.record_frame(now);
                            let smooth_pan = s.settings.smooth_pan;
                            let smooth_zoom = s.settings.smooth_zoom;
                            s.camera.update(smooth_pan, smooth_zoom, w / 2.0, h / 2.0);
                            render::draw_frame(&ctx, &s, w, h, now);
                            if s.settings.show_fps {
                                render::draw_fps(&ctx, s.frames.fps());
                            }
                        }
                    }
                    if let Ok(id) = window_loop.request_animation_frame(
                        closure_cell_clone
                            .borrow()
                            .as_ref()
                            .unwrap()
                            .as_ref()
                            .unchecked_ref(),
                    ) {
                        *raf_id_clone.borrow_mut() = Some(id);
                    }
                })
                    as Box<dyn FnMut()>));
                if let Ok(id) = window.request_animation_frame(
                    closure_cell
                        .borrow()
                        .as_ref()
                        .unwrap()
                        .as_ref()
                        .unchecked_ref(),
                ) {
                    *raf_id.borrow_mut() = Some(id);
                }
            }

            // Wheel zoom
            let wheel_cb = {
                let session = session_setup.clone();
                let canvas_ev = canvas.clone();
                Closure::wrap(Box::new(move |e: web_sys::WheelEvent| {
                    e.prevent_default();
                    let mut s = session.borrow_mut();
                    if s.settings.smooth_zoom {
                        s.camera.scale_velocity += e.delta_y();
                    } else {
                        let step = if e.delta_y() > 0.0 { -ZOOM_STEP } else { ZOOM_STEP };
                        s.camera.zoom_by(
                            step,
                            canvas_ev.width() as f64 / 2.0,
                            canvas_ev.height() as f64 / 2.0,
                        );
                    }
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("wheel", wheel_cb.as_ref().unchecked_ref())
                .unwrap();

            // Mouse events
            let mousedown_cb = {
                let session = session_setup.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    let mut s = session.borrow_mut();
                    s.camera.panning = true;
                    s.camera.last_x = e.client_x() as f64;
                    s.camera.last_y = e.client_y() as f64;
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                )
                .unwrap();

            let mousemove_cb = {
                let session = session_setup.clone();
                let canvas_ev = canvas.clone();
                Closure::wrap(Box::new(move |e: web_sys::MouseEvent| {
                    let rect = canvas_ev.get_bounding_client_rect();
                    let cw = canvas_ev.width() as f64;
                    let ch = canvas_ev.height() as f64;
                    // CSS size can differ from the backing store (fullscreen).
                    let width_ratio = if cw > 0.0 { rect.width() / cw } else { 1.0 };
                    let height_ratio = if ch > 0.0 { rect.height() / ch } else { 1.0 };
                    let x = e.client_x() as f64;
                    let y = e.client_y() as f64;
                    let mut s = session.borrow_mut();
                    s.mouse_x = ((x - rect.left()) / width_ratio).clamp(0.0, cw);
                    s.mouse_y = ((y - rect.top()) / height_ratio).clamp(0.0, ch);
                    if s.camera.panning {
                        let dx = (x - s.camera.last_x) / width_ratio;
                        let dy = (y - s.camera.last_y) / height_ratio;
                        s.camera.last_x = x;
                        s.camera.last_y = y;
                        s.camera.pan_by(dx, dy);
                    }
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                )
                .unwrap();

            let mouseup_cb = {
                let session = session_setup.clone();
                Closure::wrap(Box::new(move |_e: web_sys::MouseEvent| {
                    session.borrow_mut().camera.panning = false;
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("mouseup", mouseup_cb.as_ref().unchecked_ref())
                .unwrap();

            // Touch: one finger pans, two pinch-zoom.
            let touch_start_cb = {
                let canvas_tc = canvas.clone();
                let touch_state_tc = touch_state_setup.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let touches = e.touches();
                    let rect = canvas_tc.get_bounding_client_rect();
                    let mut ts = touch_state_tc.borrow_mut();
                    if touches.length() == 1 {
                        if let Some(t0) = touches.item(0) {
                            ts.single_active = true;
                            ts.pinch = false;
                            ts.last_touch_x = t0.client_x() as f64 - rect.left();
                            ts.last_touch_y = t0.client_y() as f64 - rect.top();
                        }
                    } else if touches.length() == 2 {
                        if let (Some(t0), Some(t1)) = (touches.item(0), touches.item(1)) {
                            ts.single_active = false;
                            ts.pinch = true;
                            ts.last_pinch_dist = touch_dist(&t0, &t1);
                        }
                    }
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let touch_move_cb = {
                let canvas_tc = canvas.clone();
                let session = session_setup.clone();
                let touch_state_tc = touch_state_setup.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let touches = e.touches();
                    let rect = canvas_tc.get_bounding_client_rect();
                    if touches.length() == 1 {
                        if let Some(t0) = touches.item(0) {
                            let cx = t0.client_x() as f64 - rect.left();
                            let cy = t0.client_y() as f64 - rect.top();
                            let mut ts = touch_state_tc.borrow_mut();
                            let mut s = session.borrow_mut();
                            s.mouse_x = cx.clamp(0.0, canvas_tc.width() as f64);
                            s.mouse_y = cy.clamp(0.0, canvas_tc.height() as f64);
                            if ts.single_active {
                                let dx = cx - ts.last_touch_x;
                                let dy = cy - ts.last_touch_y;
                                ts.last_touch_x = cx;
                                ts.last_touch_y = cy;
                                s.camera.pan_by(dx, dy);
                            }
                        }
                    } else if touches.length() == 2 {
                        if let (Some(t0), Some(t1)) = (touches.item(0), touches.item(1)) {
                            let dist = touch_dist(&t0, &t1);
                            let mut ts = touch_state_tc.borrow_mut();
                            if ts.pinch {
                                let delta = dist - ts.last_pinch_dist;
                                let mut s = session.borrow_mut();
                                if s.settings.smooth_zoom {
                                    // Spreading fingers reads as a negative
                                    // wheel delta, i.e. zoom in.
                                    s.camera.scale_velocity -= delta * PINCH_TO_WHEEL;
                                } else {
                                    let step = if delta > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
                                    s.camera.zoom_by(
                                        step,
                                        canvas_tc.width() as f64 / 2.0,
                                        canvas_tc.height() as f64 / 2.0,
                                    );
                                }
                            }
                            ts.pinch = true;
                            ts.last_pinch_dist = dist;
                        }
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let touch_end_cb = {
                let touch_state_tc = touch_state_setup.clone();
                Closure::wrap(Box::new(move |e: TouchEvent| {
                    let mut ts = touch_state_tc.borrow_mut();
                    if e.touches().length() < 2 {
                        ts.pinch = false;
                    }
                    if e.touches().length() == 0 {
                        ts.single_active = false;
                    }
                    e.prevent_default();
                }) as Box<dyn FnMut(_)>)
            };
            canvas
                .add_event_listener_with_callback("touchend", touch_end_cb.as_ref().unchecked_ref())
                .ok();
            canvas
                .add_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                )
                .ok();

            let resize_cb = {
                let compute_and_apply_canvas_size = compute_and_apply_canvas_size.clone();
                Closure::wrap(Box::new(move |_e: web_sys::Event| {
                    compute_and_apply_canvas_size();
                }) as Box<dyn FnMut(_)>)
            };
            window
                .add_event_listener_with_callback("resize", resize_cb.as_ref().unchecked_ref())
                .unwrap();

            // Cleanup
            let window_clone = window.clone();
            move || {
                let _ = canvas.remove_event_listener_with_callback(
                    "wheel",
                    wheel_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "mousedown",
                    mousedown_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "mousemove",
                    mousemove_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "mouseup",
                    mouseup_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchstart",
                    touch_start_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchmove",
                    touch_move_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchend",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                let _ = canvas.remove_event_listener_with_callback(
                    "touchcancel",
                    touch_end_cb.as_ref().unchecked_ref(),
                );
                let _ = window_clone.remove_event_listener_with_callback(
                    "resize",
                    resize_cb.as_ref().unchecked_ref(),
                );
                if let Some(id) = *raf_id.borrow() {
                    let _ = window_clone.cancel_animation_frame(id);
                }
                let _keep_alive = (
                    &wheel_cb,
                    &mousedown_cb,
                    &mousemove_cb,
                    &mouseup_cb,
                    &touch_start_cb,
                    &touch_move_cb,
                    &touch_end_cb,
                    &resize_cb,
                );
            }
        });
    }

    let cartesian_locked = settings_ui.emulator;

    html! {
        <div style="position:relative; width:100vw; height:100vh; overflow:hidden; background:#000; color:#eee;">
            <ExpressionBar
                source={(*source).clone()}
                on_input={on_source_input}
                on_reset_camera={on_reset_camera.clone()}
                on_fullscreen={on_fullscreen}
                on_show_help={on_show_help}
                on_open_settings={on_open_settings}
            />
            <canvas ref={canvas_ref} style="display:block; touch-action:none;" />
            <CameraControls
                on_zoom_in={on_zoom_in}
                on_zoom_out={on_zoom_out}
                on_center={on_reset_camera}
            />
            <SettingsModal
                show={*open_settings}
                settings={*settings_ui}
                cartesian_locked={cartesian_locked}
                on_toggle={on_toggle}
                on_close={on_close_settings}
            />
            <IntroOverlay show={*show_intro} hide_intro={hide_intro} />
        </div>
    }
}

fn touch_dist(a: &web_sys::Touch, b: &web_sys::Touch) -> f64 {
    let dx = (a.client_x() - b.client_x()) as f64;
    let dy = (a.client_y() - b.client_y()) as f64;
    (dx * dx + dy * dy).sqrt()
}
