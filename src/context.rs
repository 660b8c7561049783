use anyhow::Context as _;

use crate::{
    backend::{Backend, Sampling},
    data_structures::{program::Program, texture::Texture},
};

/// The wgpu graphics context the loader creates its textures and programs on.
///
/// `wgpu::Device` and `wgpu::Queue` are reference counted internally, so a `Context` can be
/// built from the device and queue of an existing renderer without giving them up.
#[derive(Clone, Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl Context {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Requests a device without a surface, for tools and tests that only load assets.
    pub async fn headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-loader device"),
                ..Default::default()
            })
            .await
            .context("failed to create device")?;

        Ok(Self::new(device, queue))
    }
}

impl Backend for Context {
    type Texture = Texture;
    type Program = Program;

    fn create_texture(
        &self,
        id: &str,
        image: &image::DynamicImage,
        sampling: Sampling,
    ) -> anyhow::Result<Texture> {
        Texture::from_image(&self.device, &self.queue, image, Some(id), sampling)
    }

    fn link_program(
        &self,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &[String],
    ) -> anyhow::Result<Program> {
        Program::new(&self.device, id, vertex_source, fragment_source, attributes)
    }
}
