//! Sequential page loading
//!
//! Pages are rendered one at a time, in order. Each rendered page is
//! registered with the session before the next render starts, so the
//! overlay for page N is live while page N+1 is still loading.

use crate::engine::EditEngine;
use crate::error::EditorError;
use crate::session::EditorSession;
use crate::text_items::TextContent;
use crate::viewport::Viewport;
use std::fmt::Display;
use std::rc::Rc;

/// One rendered page as delivered by the rendering library.
pub struct RenderedPage {
    pub viewport: Rc<dyn Viewport>,
    pub text_content: TextContent,
}

/// Renders pages of the open document.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    type Error: Display;

    fn page_count(&self) -> u32;

    /// Render one page (1-based).
    async fn render_page(&mut self, page: u32) -> Result<RenderedPage, Self::Error>;
}

/// Render every page in order, handing each to `on_page` as it completes.
/// Stops at the first failed page.
pub async fn load_pages<S, F>(source: &mut S, mut on_page: F) -> Result<u32, EditorError>
where
    S: PageSource,
    F: FnMut(u32, RenderedPage),
{
    let count = source.page_count();
    tracing::info!(pages = count, "loading document");
    for page in 1..=count {
        let rendered = source
            .render_page(page)
            .await
            .map_err(|e| EditorError::PageLoad {
                page,
                message: e.to_string(),
            })?;
        tracing::debug!(page, "page rendered");
        on_page(page, rendered);
    }
    tracing::info!(pages = count, "document loaded");
    Ok(count)
}

impl<E: EditEngine> EditorSession<E> {
    /// Render and register every page of `source`. Returns the page count.
    pub async fn load_document<S: PageSource>(&mut self, source: &mut S) -> Result<u32, EditorError> {
        load_pages(source, |page, rendered| {
            self.register_page(page, rendered.viewport, &rendered.text_content);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::PageViewport;
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    struct FakeSource {
        pages: u32,
        fail_on: Option<u32>,
        rendered: Vec<u32>,
    }

    impl PageSource for FakeSource {
        type Error = String;

        fn page_count(&self) -> u32 {
            self.pages
        }

        async fn render_page(&mut self, page: u32) -> Result<RenderedPage, String> {
            if self.fail_on == Some(page) {
                return Err("render failed".to_string());
            }
            self.rendered.push(page);
            Ok(RenderedPage {
                viewport: Rc::new(PageViewport::letter(1.0, 0).unwrap()),
                text_content: TextContent::default(),
            })
        }
    }

    #[test]
    fn test_pages_load_in_order() {
        let mut source = FakeSource {
            pages: 3,
            fail_on: None,
            rendered: Vec::new(),
        };
        let mut seen = Vec::new();
        let count = block_on(load_pages(&mut source, |page, _| seen.push(page))).unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(source.rendered, vec![1, 2, 3]);
    }

    #[test]
    fn test_failure_names_the_page_and_stops() {
        let mut source = FakeSource {
            pages: 3,
            fail_on: Some(2),
            rendered: Vec::new(),
        };
        let mut seen = Vec::new();
        let err = block_on(load_pages(&mut source, |page, _| seen.push(page))).unwrap_err();
        assert!(matches!(err, EditorError::PageLoad { page: 2, .. }));
        assert_eq!(seen, vec![1]);
    }
}
