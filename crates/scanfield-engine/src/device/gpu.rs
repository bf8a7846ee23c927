use log::{info, warn};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::EngineError;

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior). FIFO is broadly supported and paces the
    /// decorative renderers to the display without burning a core.
    pub present_mode: wgpu::PresentMode,

    /// Desired maximum frame latency for the surface. A hint; support depends
    /// on platform and backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Owns the wgpu core objects and the surface configuration for one window.
///
/// Surface lifetime is tied to the window; the window entry guarantees the
/// window outlives this context.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
}

/// A single acquired frame. Short-lived: holding the surface texture blocks
/// acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Every failure maps to [`EngineError::ContextUnavailable`] so callers
    /// can degrade (keep the window, render nothing) instead of crashing the
    /// host.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self, EngineError> {
        let raw_size = window.inner_size();
        if raw_size.width == 0 || raw_size.height == 0 {
            return Err(EngineError::ContextUnavailable(
                "window has zero size".to_string(),
            ));
        }
        let size = clamp_backing_size(raw_size, window.scale_factor());

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(|err| {
            EngineError::ContextUnavailable(format!("failed to create surface: {err}"))
        })?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| {
                EngineError::ContextUnavailable(format!("no suitable GPU adapter: {err}"))
            })?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scanfield device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| {
                EngineError::ContextUnavailable(format!("failed to create device: {err}"))
            })?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&surface_caps, init.prefer_srgb).ok_or_else(|| {
            EngineError::ContextUnavailable("no supported surface formats".to_string())
        })?;

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);
        info!("gpu context ready ({format:?}, {}x{})", size.width, size.height);

        Ok(Gpu {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface after a resize.
    ///
    /// wgpu cannot configure a 0x0 surface; in that case only internal state
    /// is updated and configuration is deferred to the next non-zero resize.
    /// The backing store is capped at an effective pixel ratio of 2 via
    /// `scale_factor`; the presentation path scales up on denser displays.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width == 0 || new_size.height == 0 {
            self.size = new_size;
            return;
        }

        let new_size = clamp_backing_size(new_size, scale_factor);
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scanfield frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands; presentation occurs when the surface
    /// texture drops.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        drop(frame.surface_texture);
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                if self.size.width > 0 && self.size.height > 0 {
                    self.surface.configure(&self.device, &self.config);
                }
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => {
                warn!("surface out of memory");
                SurfaceErrorAction::Fatal
            }
            SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

/// Effective pixel-ratio cap; dense displays render at most 2x.
const MAX_PIXEL_RATIO: f64 = 2.0;

/// Scales a physical backing size down so the effective device pixel ratio
/// never exceeds [`MAX_PIXEL_RATIO`]. On a 3x display the surface renders at
/// two thirds of the physical size for the same perceived quality at a
/// fraction of the fill cost.
fn clamp_backing_size(size: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    if scale_factor <= MAX_PIXEL_RATIO {
        return size;
    }
    let ratio = MAX_PIXEL_RATIO / scale_factor;
    PhysicalSize::new(
        ((size.width as f64 * ratio).round() as u32).max(1),
        ((size.height as f64 * ratio).round() as u32).max(1),
    )
}

fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ratios_keep_the_physical_size() {
        let size = PhysicalSize::new(1280, 720);
        assert_eq!(clamp_backing_size(size, 1.0), size);
        assert_eq!(clamp_backing_size(size, 2.0), size);
    }

    #[test]
    fn dense_displays_are_capped_at_two() {
        // 3x display: backing store renders at 2/3 of the physical size.
        let clamped = clamp_backing_size(PhysicalSize::new(3000, 1500), 3.0);
        assert_eq!(clamped, PhysicalSize::new(2000, 1000));
    }

    #[test]
    fn clamped_size_never_reaches_zero() {
        let clamped = clamp_backing_size(PhysicalSize::new(1, 1), 4.0);
        assert_eq!(clamped, PhysicalSize::new(1, 1));
    }
}
