//! Cache of rendered page state
//!
//! The viewport captured at render time is the authority for every
//! coordinate conversion on that page. Canvas and page proxy handles stay
//! on the host side; only the viewport and the text snapshot live here.

use crate::text_items::TextLayer;
use crate::viewport::Viewport;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub struct CachedPageInfo {
    pub page: u32,
    pub viewport: Rc<dyn Viewport>,
    pub text_layer: TextLayer,
}

impl fmt::Debug for CachedPageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedPageInfo")
            .field("page", &self.page)
            .field("scale", &self.viewport.scale())
            .field("rotation", &self.viewport.rotation())
            .field("text_items", &self.text_layer.items().len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct PageCache {
    pages: BTreeMap<u32, CachedPageInfo>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the state of a fresh render, replacing any previous one.
    pub fn insert(
        &mut self,
        page: u32,
        viewport: Rc<dyn Viewport>,
        text_layer: TextLayer,
    ) -> Option<CachedPageInfo> {
        self.pages.insert(
            page,
            CachedPageInfo {
                page,
                viewport,
                text_layer,
            },
        )
    }

    pub fn get(&self, page: u32) -> Option<&CachedPageInfo> {
        self.pages.get(&page)
    }

    pub fn viewport(&self, page: u32) -> Option<Rc<dyn Viewport>> {
        self.pages.get(&page).map(|info| Rc::clone(&info.viewport))
    }

    pub fn invalidate(&mut self, page: u32) -> Option<CachedPageInfo> {
        self.pages.remove(&page)
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }
}
