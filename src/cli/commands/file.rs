//! File subcommands.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Args, Subcommand};
use tracing::info;

use crate::app::{
    collection_choices, download_file, edit_file_metadata, ingest_file, preview_file, view_file,
    App, FileInfo, FileMetadataForm, IngestForm, UploadedFile,
};
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};
use crate::repo_model::FileModel;
use crate::repository::Pid;

// =============================================================================
// File Subcommands
// =============================================================================

/// File subcommands.
#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Reposit a local file in a collection.
    Ingest(IngestArgs),

    /// Show a file's metadata.
    View(ViewArgs),

    /// Edit a file's metadata.
    Edit(EditArgs),

    /// Download a file's master content.
    Download(DownloadArgs),

    /// Download a preview of an image.
    Preview(PreviewArgs),
}

impl FileCommand {
    /// Run the file subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            FileCommand::Ingest(args) => args.run(app, global).await,
            FileCommand::View(args) => args.run(app, global).await,
            FileCommand::Edit(args) => args.run(app, global).await,
            FileCommand::Download(args) => args.run(app, global).await,
            FileCommand::Preview(args) => args.run(app, global).await,
        }
    }
}

fn file_info(file: &FileModel) -> Result<FileInfo> {
    FileInfo::from_model(file).ok_or_else(|| CliError::Other("file has no pid".to_string()))
}

fn file_text(info: &FileInfo) -> String {
    let mut lines = vec![
        format!("pid: {}", info.pid),
        format!("kind: {}", info.kind),
        format!("label: {}", info.label),
    ];
    if let Some(collection) = &info.collection {
        lines.push(format!("collection: {}", collection));
    }
    if let Some(name) = &info.file_name {
        lines.push(format!("file name: {}", name));
    }
    if let Some(mimetype) = &info.mimetype {
        lines.push(format!("mimetype: {}", mimetype));
    }
    if let Some(size) = info.size {
        lines.push(format!("size: {}", size));
    }
    if let Some(checksum) = &info.checksum {
        lines.push(format!("sha256: {}", checksum));
    }
    if let Some(oai_id) = &info.oai_id {
        lines.push(format!("oai id: {}", oai_id));
    }
    for (name, value) in info.dc.elements() {
        lines.push(format!("dc:{}: {}", name, value));
    }
    lines.join("\n")
}

/// MIME type for a local file, guessed from its extension.
fn guess_mimetype(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

// =============================================================================
// Ingest
// =============================================================================

/// Arguments for the ingest command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Local file to reposit.
    pub path: PathBuf,

    /// Pid of the collection the file joins.
    #[arg(long)]
    pub collection: Pid,

    /// MIME type of the file. Guessed from the extension if omitted.
    #[arg(long)]
    pub mimetype: Option<String>,

    #[command(flatten)]
    pub output: OutputSink,
}

impl IngestArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CliError::Other(format!("not a file path: {}", self.path.display()))
            })?;
        let mimetype = self
            .mimetype
            .clone()
            .unwrap_or_else(|| guess_mimetype(&self.path));
        let content = Bytes::from(tokio::fs::read(&self.path).await?);

        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let choices = collection_choices(&repo).await?;
        let form = IngestForm {
            collection: Some(self.collection.uri()),
            file: Some(UploadedFile {
                name,
                mimetype,
                content,
            }),
        };

        let info = file_info(&ingest_file(&repo, &form, &choices).await?)?;
        let text = format!("Successfully ingested {}", info.pid);
        self.output.write(&info, global.json, &text).await?;
        Ok(())
    }
}

// =============================================================================
// View
// =============================================================================

/// Arguments for the view command.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Pid of the file.
    pub pid: Pid,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ViewArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let info = file_info(&view_file(&repo, &self.pid).await?)?;
        self.output
            .write(&info, global.json, &file_text(&info))
            .await?;
        Ok(())
    }
}

// =============================================================================
// Edit
// =============================================================================

/// Arguments for the edit command.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Pid of the file.
    pub pid: Pid,

    #[command(flatten)]
    pub fields: FileFields,

    #[command(flatten)]
    pub output: OutputSink,
}

/// File metadata given on the command line.
///
/// Fields that are not given keep their current values. Repeatable fields
/// replace the whole list when given.
#[derive(Args, Debug, Default)]
pub struct FileFields {
    /// Title, also used as the object label.
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long = "creator")]
    pub creators: Vec<String>,

    #[arg(long = "contributor")]
    pub contributors: Vec<String>,

    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub coverage: Vec<String>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long = "relation")]
    pub relations: Vec<String>,

    #[arg(long)]
    pub rights: Option<String>,

    #[arg(long)]
    pub source: Option<String>,

    #[arg(long = "subject")]
    pub subjects: Vec<String>,

    /// DCMI type, e.g. Text or StillImage.
    #[arg(long = "type")]
    pub dc_type: Option<String>,

    /// File name offered to anyone downloading the file.
    #[arg(long)]
    pub file_name: Option<String>,

    /// Publish the file through the OAI provider.
    #[arg(long, conflicts_with = "disable_oai")]
    pub enable_oai: bool,

    /// Stop publishing the file through the OAI provider.
    #[arg(long)]
    pub disable_oai: bool,
}

fn replace_if_some(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn replace_if_given(slot: &mut Vec<String>, values: Vec<String>) {
    if !values.is_empty() {
        *slot = values;
    }
}

impl FileFields {
    /// Overlay the given fields on a form.
    fn apply_to(self, form: &mut FileMetadataForm) {
        let dc = &mut form.dc;
        replace_if_some(&mut dc.title, self.title);
        replace_if_some(&mut dc.description, self.description);
        replace_if_given(&mut dc.creators, self.creators);
        replace_if_given(&mut dc.contributors, self.contributors);
        replace_if_some(&mut dc.date, self.date);
        replace_if_given(&mut dc.coverage, self.coverage);
        replace_if_some(&mut dc.language, self.language);
        replace_if_some(&mut dc.publisher, self.publisher);
        replace_if_given(&mut dc.relations, self.relations);
        replace_if_some(&mut dc.rights, self.rights);
        replace_if_some(&mut dc.source, self.source);
        replace_if_given(&mut dc.subjects, self.subjects);
        replace_if_some(&mut dc.dc_type, self.dc_type);
        replace_if_some(&mut form.file_name, self.file_name);
        if self.enable_oai {
            form.enable_oai = true;
        }
        if self.disable_oai {
            form.enable_oai = false;
        }
    }
}

impl EditArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let current = view_file(&repo, &self.pid).await?;
        let mut form = FileMetadataForm::from_file(&current);
        self.fields.apply_to(&mut form);

        let edited = edit_file_metadata(&repo, &self.pid, &form, app.oai_prefix()).await?;
        let info = file_info(&edited)?;
        let text = format!("Successfully updated {}", info.pid);
        self.output.write(&info, global.json, &text).await?;
        Ok(())
    }
}

// =============================================================================
// Download / Preview
// =============================================================================

/// Arguments for the download command.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Pid of the file.
    pub pid: Pid,

    #[command(flatten)]
    pub output: OutputSink,
}

impl DownloadArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let download = download_file(&repo, &self.pid).await?;
        info!(
            pid = %self.pid,
            mimetype = %download.mimetype,
            disposition = %download.content_disposition(),
            "downloading"
        );
        self.output.write_bytes(&download.content).await?;
        Ok(())
    }
}

/// Arguments for the preview command.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Pid of an image.
    pub pid: Pid,

    #[command(flatten)]
    pub output: OutputSink,
}

impl PreviewArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let preview = preview_file(&repo, &self.pid).await?;
        info!(pid = %self.pid, mimetype = %preview.mimetype, "downloading preview");
        self.output.write_bytes(&preview.content).await?;
        Ok(())
    }
}
