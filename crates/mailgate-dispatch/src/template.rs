//! Email template rendering with Handlebars.
//!
//! Every template is a pair of files in the configured template
//! directory: `<stem>.html.hbs` and `<stem>.txt.hbs`. Rendering is a pure
//! function of the template and the data bag; subjects are computed by
//! the dispatcher, not stored in templates.

use async_trait::async_trait;
use handlebars::Handlebars;
use std::path::{Path, PathBuf};

use crate::prelude::*;

/// Identifies a known email template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
	/// Operator-triggered test email
	Test,
	/// Contact-form message to the administrator
	Contact,
	/// Confirmation sent back to the contact-form submitter
	ContactConfirm,
}

impl TemplateId {
	/// File stem of the template pair in the template directory
	pub fn stem(self) -> &'static str {
		match self {
			TemplateId::Test => "test",
			TemplateId::Contact => "contact",
			TemplateId::ContactConfirm => "contact-confirm",
		}
	}
}

impl std::fmt::Display for TemplateId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.stem())
	}
}

/// Rendered template output
#[derive(Debug, Clone)]
pub struct RenderedContent {
	pub html: String,
	pub text: String,
}

/// Maps a (template, data bag) pair to rendered HTML and plain text
#[async_trait]
pub trait ContentRenderer: Send + Sync {
	/// Renders one template. Fails with `Error::Render` when the template
	/// is missing or the data bag does not satisfy it.
	async fn render(
		&self,
		template: TemplateId,
		data: &serde_json::Value,
	) -> MgResult<RenderedContent>;
}

/// File-backed template engine
pub struct TemplateEngine {
	handlebars: Handlebars<'static>,
	template_dir: PathBuf,
}

impl TemplateEngine {
	pub fn new(template_dir: impl Into<PathBuf>) -> Self {
		let mut handlebars = Handlebars::new();

		// Strict mode catches undefined variables instead of rendering
		// empty strings
		handlebars.set_strict_mode(true);

		Self { handlebars, template_dir: template_dir.into() }
	}

	async fn load(&self, template: TemplateId, extension: &str) -> MgResult<String> {
		let path = self.template_dir.join(format!("{}.{}", template.stem(), extension));
		Self::read_template(&path).await
	}

	async fn read_template(path: &Path) -> MgResult<String> {
		tokio::fs::read_to_string(path)
			.await
			.map_err(|_| Error::Render(format!("template not found: {}", path.display())))
	}

	fn render_str(&self, source: &str, data: &serde_json::Value) -> MgResult<String> {
		self.handlebars
			.render_template(source, data)
			.map_err(|e| Error::Render(e.to_string()))
	}
}

#[async_trait]
impl ContentRenderer for TemplateEngine {
	async fn render(
		&self,
		template: TemplateId,
		data: &serde_json::Value,
	) -> MgResult<RenderedContent> {
		let html_source = self.load(template, "html.hbs").await?;
		let text_source = self.load(template, "txt.hbs").await?;

		let html = self.render_str(&html_source, data)?;
		let text = self.render_str(&text_source, data)?;
		debug!("Rendered template {} ({} bytes html)", template, html.len());

		Ok(RenderedContent { html, text })
	}
}


// vim: ts=4
