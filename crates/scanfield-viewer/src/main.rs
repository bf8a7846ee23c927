//! Scanfield viewer: mounts one of the decorative renderers in a window.
//!
//! `scanfield-viewer` shows the grid scan; `scanfield-viewer rays` shows the
//! light-ray field instead.

use anyhow::Result;
use winit::event::WindowEvent;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use scanfield_engine::core::{App, AppControl, FrameCtx};
use scanfield_engine::device::GpuInit;
use scanfield_engine::gridscan::{GridScan, GridScanConfig};
use scanfield_engine::logging::{init_logging, LoggingConfig};
use scanfield_engine::rays::{LightRays, LightRaysConfig};
use scanfield_engine::window::{Runtime, RuntimeConfig};

enum Effect {
    Grid(Box<GridScan>),
    Rays(Box<LightRays>),
}

struct ViewerApp {
    effect: Effect,
}

impl App for ViewerApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state.is_pressed()
                && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            {
                return AppControl::Exit;
            }
        }
        AppControl::Continue
    }

    fn on_resize(&mut self, _window_id: WindowId, size: winit::dpi::PhysicalSize<u32>) {
        match &mut self.effect {
            Effect::Grid(g) => g.resize(size),
            Effect::Rays(r) => r.resize(size),
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let time = ctx.time;
        let pointer = ctx.pointer;
        let effect = &mut self.effect;
        ctx.render(|rctx, target| match effect {
            Effect::Grid(g) => g.frame(rctx, target, time, pointer),
            Effect::Rays(r) => r.frame(rctx, target, time, pointer),
        })
    }
}

impl Drop for ViewerApp {
    fn drop(&mut self) {
        match &mut self.effect {
            Effect::Grid(g) => g.dispose(),
            Effect::Rays(r) => r.dispose(),
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let want_rays = std::env::args().nth(1).as_deref() == Some("rays");

    let (effect, title) = if want_rays {
        let rays = LightRays::new(&LightRaysConfig::default())?;
        (Effect::Rays(Box::new(rays)), "scanfield · light rays")
    } else {
        let grid = GridScan::new(&GridScanConfig::default())?;
        (Effect::Grid(Box::new(grid)), "scanfield · grid scan")
    };

    log::info!("mounting {title}");

    Runtime::run(
        RuntimeConfig {
            title: title.to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        ViewerApp { effect },
    )
}
