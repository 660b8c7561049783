#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use anyhow::{anyhow, bail};
use flow_loader::{
    backend::{Backend, Resource, Sampling},
    resources::{Fetch, Params},
};
use futures::{FutureExt, channel::oneshot, future::LocalBoxFuture};

/// Marker that makes [`MockBackend::link_program`] fail when it appears in either source.
pub const LINK_ERROR: &str = "#link-error";

/// Shared record of what a [`MockBackend`] created and what was disposed since.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    created: Rc<RefCell<Vec<String>>>,
    disposed: Rc<RefCell<Vec<String>>>,
}

impl Journal {
    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }

    pub fn disposed(&self) -> Vec<String> {
        let mut disposed = self.disposed.borrow().clone();
        disposed.sort();
        disposed
    }

    fn create(&self, entry: String) {
        self.created.borrow_mut().push(entry);
    }

    fn dispose(&self, entry: String) {
        self.disposed.borrow_mut().push(entry);
    }
}

/// Backend without a GPU: resources are plain records of what was asked for.
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    pub journal: Journal,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct MockTexture {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub sampling: Sampling,
    journal: Journal,
}

impl Resource for MockTexture {
    fn dispose(self) {
        self.journal.dispose(format!("texture:{}", self.id));
    }
}

#[derive(Debug)]
pub struct MockProgram {
    pub id: String,
    pub vertex: String,
    pub fragment: String,
    pub attributes: Vec<String>,
    journal: Journal,
}

impl Resource for MockProgram {
    fn dispose(self) {
        self.journal.dispose(format!("program:{}", self.id));
    }
}

impl Backend for MockBackend {
    type Texture = MockTexture;
    type Program = MockProgram;

    fn create_texture(
        &self,
        id: &str,
        image: &image::DynamicImage,
        sampling: Sampling,
    ) -> anyhow::Result<MockTexture> {
        self.journal.create(format!("texture:{}", id));
        Ok(MockTexture {
            id: id.to_string(),
            width: image.width(),
            height: image.height(),
            sampling,
            journal: self.journal.clone(),
        })
    }

    fn link_program(
        &self,
        id: &str,
        vertex_source: &str,
        fragment_source: &str,
        attributes: &[String],
    ) -> anyhow::Result<MockProgram> {
        if vertex_source.contains(LINK_ERROR) || fragment_source.contains(LINK_ERROR) {
            bail!("program {} does not link", id);
        }
        self.journal.create(format!("program:{}", id));
        Ok(MockProgram {
            id: id.to_string(),
            vertex: vertex_source.to_string(),
            fragment: fragment_source.to_string(),
            attributes: attributes.to_vec(),
            journal: self.journal.clone(),
        })
    }
}

type Reply = anyhow::Result<Vec<u8>>;

/// Fetcher whose requests stay pending until the test resolves them, in any order.
#[derive(Clone, Default)]
pub struct ManualFetcher {
    pending: Rc<RefCell<HashMap<String, oneshot::Sender<Reply>>>>,
    requested: Rc<RefCell<Vec<(String, Option<Params>)>>>,
}

impl ManualFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids that were requested and not answered yet, sorted.
    pub fn pending(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pending.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every request so far with its parameters, in request order.
    pub fn requested(&self) -> Vec<(String, Option<Params>)> {
        self.requested.borrow().clone()
    }

    pub fn resolve(&self, id: &str, bytes: impl Into<Vec<u8>>) {
        self.reply(id, Ok(bytes.into()));
    }

    pub fn reject(&self, id: &str, reason: &str) {
        self.reply(id, Err(anyhow!("{}", reason)));
    }

    fn reply(&self, id: &str, reply: Reply) {
        let sender = self
            .pending
            .borrow_mut()
            .remove(id)
            .unwrap_or_else(|| panic!("`{}` was never requested", id));
        sender
            .send(reply)
            .unwrap_or_else(|_| panic!("request for `{}` was dropped", id));
    }
}

impl Fetch for ManualFetcher {
    fn fetch(&self, id: &str, params: Option<&Params>) -> LocalBoxFuture<'static, Reply> {
        let (sender, receiver) = oneshot::channel();
        self.pending.borrow_mut().insert(id.to_string(), sender);
        self.requested
            .borrow_mut()
            .push((id.to_string(), params.cloned()));
        let id = id.to_string();
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(anyhow!("request for {} was cancelled", id)))
        }
        .boxed_local()
    }
}

/// A `width` x `height` PNG filled with a single colour.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("failed to encode test PNG");
    bytes
}

/// Records every call of a progress callback.
pub fn progress_recorder() -> (Rc<RefCell<Vec<f32>>>, impl FnMut(f32) + 'static) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    (calls, move |percent| sink.borrow_mut().push(percent))
}

/// Slot that a completion callback writes its result into.
pub fn slot<T: 'static>() -> (Rc<RefCell<Option<T>>>, impl FnOnce(T) + 'static) {
    let slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    (slot, move |value| {
        let previous = sink.borrow_mut().replace(value);
        assert!(previous.is_none(), "completion called twice");
    })
}
