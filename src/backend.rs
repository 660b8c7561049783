//! The boundary between the loader and the graphics context.
//!
//! The loader never talks to a GPU API directly. It hands decoded images and shader sources to
//! a [`Backend`] and stores whatever handles come back. Handles are released through
//! [`Resource::dispose`] when an [`Assets`](crate::loader::Assets) snapshot is discarded.
//!
//! [`Context`](crate::context::Context) is the wgpu implementation.

/// Texture sampling filter, used for magnification and minification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// Sampling configuration for a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sampling {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
}

/// A GPU-side object that has to be released explicitly.
pub trait Resource {
    fn dispose(self);
}

/// Creates GPU resources from decoded asset data.
pub trait Backend: 'static {
    type Texture: Resource + 'static;
    type Program: Resource + 'static;

    /// Uploads `image` into a new texture.
    fn create_texture(
        &self,
        id: &str,
        image: &image::DynamicImage,
        sampling: Sampling,
    ) -> anyhow::Result<Self::Texture>;

    /// Compiles and links a program. Attribute `i` of `attributes` is bound to vertex input
    /// location `i`.
    fn link_program(
        &self,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &[String],
    ) -> anyhow::Result<Self::Program>;
}
