use typst_as_lib::TypstEngine;
use typst_as_lib::typst_kit_options::TypstKitFontOptions;
use typst_library::layout::PagedDocument;
use typst_pdf::PdfOptions;

use crate::block::Block;
use crate::config::Config;
use crate::render::Renderer;
use crate::typst::blocks_to_typst;

/// Compiles the Typst rendering of a tree into PDF bytes.
#[derive(Debug, Default)]
pub struct PdfRenderer {
    pub config: Config,
}

impl PdfRenderer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Renderer for PdfRenderer {
    type Output = Vec<u8>;

    fn render(&self, blocks: &[Block]) -> Result<Vec<u8>, String> {
        let typst_content = blocks_to_typst(blocks, &self.config);

        // A sans family is looked up among the installed fonts
        let font_options = TypstKitFontOptions::new()
            .include_embedded_fonts(true)
            .include_system_fonts(self.config.font.sans);

        let engine = TypstEngine::builder()
            .main_file(typst_content)
            .search_fonts_with(font_options)
            .build();

        let doc: PagedDocument = engine
            .compile()
            .output
            .map_err(|e| format!("Typst compilation failed: {:?}", e))?;
        tracing::debug!(pages = doc.pages.len(), "compiled document");

        typst_pdf::pdf(&doc, &PdfOptions::default())
            .map_err(|e| format!("PDF generation failed: {:?}", e))
    }
}
