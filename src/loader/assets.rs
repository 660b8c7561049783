use std::collections::HashMap;

use crate::{
    backend::{Backend, Resource},
    resources::Data,
};

/// The result of one [`Loader::load_assets`](super::Loader::load_assets) call.
///
/// Lookups are by the identifier the asset was queued with. [`discard`](Self::discard)
/// releases every texture and program and empties the snapshot; dropping the snapshot does the
/// same. Snapshots from different loads never share state.
pub struct Assets<B: Backend> {
    data: HashMap<String, Data>,
    textures: HashMap<String, B::Texture>,
    programs: HashMap<String, B::Program>,
}

impl<B: Backend> Default for Assets<B> {
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
        }
    }
}

impl<B: Backend> Assets<B> {
    pub fn get_data(&self, id: &str) -> Option<&Data> {
        self.data.get(id)
    }

    /// Deserializes the data asset `id`. `None` if no such asset was loaded.
    pub fn get_json<T>(&self, id: &str) -> Option<serde_json::Result<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        self.data.get(id).map(|data| data.deserialize())
    }

    pub fn get_texture(&self, id: &str) -> Option<&B::Texture> {
        self.textures.get(id)
    }

    pub fn get_program(&self, id: &str) -> Option<&B::Program> {
        self.programs.get(id)
    }

    pub fn data_ids(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn texture_ids(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }

    pub fn program_ids(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    /// Number of assets of all kinds.
    pub fn len(&self) -> usize {
        self.data.len() + self.textures.len() + self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every texture and program and empties all lookups.
    ///
    /// A second call finds nothing left to release.
    pub fn discard(&mut self) {
        let textures = std::mem::take(&mut self.textures);
        let programs = std::mem::take(&mut self.programs);
        self.data = HashMap::new();

        if !textures.is_empty() || !programs.is_empty() {
            log::debug!(
                "Discarding {} texture(s) and {} program(s)",
                textures.len(),
                programs.len()
            );
        }
        for (id, texture) in textures {
            log::trace!("Disposing texture {}", id);
            texture.dispose();
        }
        for (id, program) in programs {
            log::trace!("Disposing program {}", id);
            program.dispose();
        }
    }

    pub(crate) fn insert_data(&mut self, id: String, data: Data) {
        if self.data.insert(id, data).is_some() {
            log::warn!("Data asset was queued twice; keeping the last load");
        }
    }

    pub(crate) fn insert_texture(&mut self, id: String, texture: B::Texture) {
        if let Some(previous) = self.textures.insert(id, texture) {
            log::warn!("Texture was queued twice; disposing the earlier load");
            previous.dispose();
        }
    }

    pub(crate) fn insert_program(&mut self, id: String, program: B::Program) {
        if let Some(previous) = self.programs.insert(id, program) {
            log::warn!("Program was queued twice; disposing the earlier load");
            previous.dispose();
        }
    }
}

impl<B: Backend> Drop for Assets<B> {
    fn drop(&mut self) {
        self.discard();
    }
}

impl<B: Backend> std::fmt::Debug for Assets<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assets")
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .field("textures", &self.textures.keys().collect::<Vec<_>>())
            .field("programs", &self.programs.keys().collect::<Vec<_>>())
            .finish()
    }
}
