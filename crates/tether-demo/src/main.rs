use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::select;

use tether_engine::device::GpuInit;
use tether_engine::gfx::{Canvas, GraphicsContext, GraphicsError};
use tether_engine::input::{Event, Key, PointerButton};
use tether_engine::logging::{init_logging, LoggingConfig};
use tether_engine::native::{keycode, window_event, HeadlessPlatform, NativeEvent, WinitPlatform};
use tether_engine::paint::Color;
use tether_engine::runtime::{Runtime, RuntimeConfig, RuntimeHandle};

const FRAME: Duration = Duration::from_millis(20);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let headless = std::env::args().skip(1).any(|a| a == "--headless");

    // The main thread owns the windowing system.
    let runtime = Runtime::new(RuntimeConfig::default());
    runtime.bind();

    let handle = runtime.handle();
    let app = thread::Builder::new()
        .name("app".into())
        .spawn(move || {
            let result = run_app(&handle);
            handle.stop();
            result
        })
        .context("failed to spawn app thread")?;

    if headless {
        let platform = HeadlessPlatform::new();
        let (injector, probe) = (platform.injector(), platform.probe());

        // Stand-in for a user: wiggle the pointer, type, resize, then close.
        thread::spawn(move || {
            let window = loop {
                if let Some(&id) = probe.open_windows().first() {
                    break id;
                }
                thread::sleep(Duration::from_millis(5));
            };
            for i in 0..10 {
                injector.send(NativeEvent::MouseMotion { window, x: 40 + i * 20, y: 60 + i * 10 });
                thread::sleep(FRAME);
            }
            injector.key(window, 'h' as u32, true);
            injector.key(window, 'h' as u32, false);
            injector.key(window, keycode::SPACE, true);
            injector.window_event(window, window_event::RESIZED, 800, 600);
            thread::sleep(FRAME * 3);
            injector.window_event(window, window_event::CLOSE, 0, 0);
            thread::sleep(FRAME * 3);
            log::info!("headless run presented {} frames", probe.presents(window));
        });

        runtime.run(move || Ok(platform))?;
    } else {
        runtime.run(|| Ok(WinitPlatform::new(GpuInit::default())))?;
    }

    app.join()
        .map_err(|_| anyhow::anyhow!("app thread panicked"))?
}

#[derive(Clone, Default)]
struct Scene {
    trail: Vec<[f32; 2]>,
    pressed: bool,
    background: Color,
}

fn run_app(handle: &RuntimeHandle) -> Result<()> {
    let window = handle.new_window("Test", 640, 480)?;
    log::info!("opened {} ({}x{})", window.id(), window.size().0, window.size().1);

    let canvas = window.draw(Canvas::new)??;
    let ticker = crossbeam_channel::tick(FRAME);
    let mut scene = Scene {
        background: Color::from_srgb_u8(24, 26, 33, 255),
        ..Scene::default()
    };

    loop {
        select! {
            recv(window.events()) -> event => match event {
                Ok(Event::Close) | Ok(Event::KeyDown(Key::Char('q'))) => {
                    // Events queued before the close are still delivered.
                    if window.is_closed() {
                        continue;
                    }
                    window.draw(move |gfx| canvas.release(gfx))??;
                    window.close();
                }
                Ok(Event::PointerMove { x, y }) => {
                    scene.trail.push([x as f32, y as f32]);
                    if scene.trail.len() > 64 {
                        scene.trail.remove(0);
                    }
                }
                Ok(Event::PointerDown { button: PointerButton::Left, .. }) => scene.pressed = true,
                Ok(Event::PointerUp { button: PointerButton::Left, .. }) => scene.pressed = false,
                Ok(Event::KeyDown(key)) => log::info!("key down: {key}"),
                Ok(Event::Resize { width, height }) => log::info!("resized to {width}x{height}"),
                Ok(other) => log::debug!("{other:?}"),
                // Stream ended: the window is closed.
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                if window.is_closed() {
                    continue;
                }
                let frame = scene.clone();
                window.draw(move |gfx| render(gfx, canvas, &frame))??;
                if let Err(e) = window.present() {
                    log::warn!("{e:#}");
                }
            }
        }
    }

    log::info!("window closed");
    Ok(())
}

fn render(gfx: &mut dyn GraphicsContext, canvas: Canvas, scene: &Scene) -> Result<(), GraphicsError> {
    let (width, height) = gfx.viewport();
    canvas.clear(gfx, scene.background)?;

    let accent = if scene.pressed {
        Color::from_srgb_u8(236, 112, 99, 255)
    } else {
        Color::from_srgb_u8(93, 173, 226, 255)
    };
    canvas.fill_rect(gfx, 20.0, 20.0, width as f32 - 40.0, 8.0, accent)?;
    canvas.fill_rect(gfx, 20.0, height as f32 - 28.0, width as f32 - 40.0, 8.0, accent)?;

    if let Some(&[x, y]) = scene.trail.last() {
        canvas.fill_rect(gfx, x - 6.0, y - 6.0, 12.0, 12.0, Color::WHITE)?;
    }
    canvas.stroke_line(gfx, Color::WHITE, 2.0, &scene.trail)
}
