//! Collection subcommands.

use clap::{Args, Subcommand};

use crate::app::{
    collection_members, create_collection, edit_collection, list_collections, view_collection,
    App, CollectionForm, CollectionInfo, ObjectSummary,
};
use crate::cli::{CliError, GlobalArgs, OutputSink, Result};
use crate::repo_model::CollectionModel;
use crate::repository::Pid;

// =============================================================================
// Collection Subcommands
// =============================================================================

/// Collection subcommands.
#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    /// List the collections visible to the current credentials.
    List(ListArgs),

    /// Show a collection's metadata.
    View(ViewArgs),

    /// Create a new collection.
    New(NewArgs),

    /// Edit an existing collection.
    Edit(EditArgs),

    /// List the visible members of a collection.
    Members(MembersArgs),
}

impl CollectionCommand {
    /// Run the collection subcommand.
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        match self {
            CollectionCommand::List(args) => args.run(app, global).await,
            CollectionCommand::View(args) => args.run(app, global).await,
            CollectionCommand::New(args) => args.run(app, global).await,
            CollectionCommand::Edit(args) => args.run(app, global).await,
            CollectionCommand::Members(args) => args.run(app, global).await,
        }
    }
}

/// One `pid<TAB>label` line per object.
pub(crate) fn summary_lines(objects: &[ObjectSummary]) -> String {
    objects
        .iter()
        .map(|o| format!("{}\t{}", o.pid, o.label))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collection_info(collection: &CollectionModel) -> Result<CollectionInfo> {
    CollectionInfo::from_model(collection)
        .ok_or_else(|| CliError::Other("collection has no pid".to_string()))
}

fn collection_text(info: &CollectionInfo) -> String {
    let mut lines = vec![format!("pid: {}", info.pid), format!("label: {}", info.label)];
    for (name, value) in info.dc.elements() {
        lines.push(format!("dc:{}: {}", name, value));
    }
    if let Some(set) = &info.oai_set {
        lines.push(format!("oai set: {}", set));
    }
    if let Some(name) = &info.oai_set_name {
        lines.push(format!("oai set name: {}", name));
    }
    lines.join("\n")
}

// =============================================================================
// List
// =============================================================================

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

impl ListArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let collections = list_collections(&repo).await?;
        self.output
            .write(&collections, global.json, &summary_lines(&collections))
            .await?;
        Ok(())
    }
}

// =============================================================================
// View
// =============================================================================

/// Arguments for the view command.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Pid of the collection.
    pub pid: Pid,

    #[command(flatten)]
    pub output: OutputSink,
}

impl ViewArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let info = collection_info(&view_collection(&repo, &self.pid).await?)?;
        self.output
            .write(&info, global.json, &collection_text(&info))
            .await?;
        Ok(())
    }
}

// =============================================================================
// New / Edit
// =============================================================================

/// Collection metadata given on the command line.
#[derive(Args, Debug, Default)]
pub struct CollectionFields {
    /// Title, also used as the object label.
    #[arg(long)]
    pub title: Option<String>,

    /// General description of the collection and its contents.
    #[arg(long)]
    pub description: Option<String>,

    /// OAI set identifier (setSpec). Requires --oai-set-name.
    #[arg(long)]
    pub oai_set: Option<String>,

    /// One-line description of the OAI set. Requires --oai-set.
    #[arg(long)]
    pub oai_set_name: Option<String>,
}

impl CollectionFields {
    /// Overlay the given fields on a form.
    fn apply_to(self, form: &mut CollectionForm) {
        if self.title.is_some() {
            form.title = self.title;
        }
        if self.description.is_some() {
            form.description = self.description;
        }
        if self.oai_set.is_some() {
            form.oai_set = self.oai_set;
        }
        if self.oai_set_name.is_some() {
            form.oai_set_name = self.oai_set_name;
        }
    }
}

/// Arguments for the new command.
#[derive(Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: CollectionFields,

    #[command(flatten)]
    pub output: OutputSink,
}

impl NewArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let mut form = CollectionForm::default();
        self.fields.apply_to(&mut form);

        let info = collection_info(&create_collection(&repo, &form).await?)?;
        let text = format!("Successfully created new collection {}", info.pid);
        self.output.write(&info, global.json, &text).await?;
        Ok(())
    }
}

/// Arguments for the edit command.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Pid of the collection.
    pub pid: Pid,

    #[command(flatten)]
    pub fields: CollectionFields,

    /// Stop acting as an OAI set.
    #[arg(long, conflicts_with_all = ["oai_set", "oai_set_name"])]
    pub clear_oai_set: bool,

    #[command(flatten)]
    pub output: OutputSink,
}

impl EditArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let current = view_collection(&repo, &self.pid).await?;
        let mut form = CollectionForm::from_collection(&current);
        self.fields.apply_to(&mut form);
        if self.clear_oai_set {
            form.oai_set = None;
            form.oai_set_name = None;
        }

        let info = collection_info(&edit_collection(&repo, &self.pid, &form).await?)?;
        let text = format!("Successfully updated collection {}", info.pid);
        self.output.write(&info, global.json, &text).await?;
        Ok(())
    }
}

// =============================================================================
// Members
// =============================================================================

/// Arguments for the members command.
#[derive(Args, Debug)]
pub struct MembersArgs {
    /// Pid of the collection.
    pub pid: Pid,

    #[command(flatten)]
    pub output: OutputSink,
}

impl MembersArgs {
    pub async fn run(self, app: &App, global: &GlobalArgs) -> Result<()> {
        let repo = app.create_repo(global.to_create_repo_context()).await?;
        let members = collection_members(&repo, &self.pid).await?;
        self.output
            .write(&members, global.json, &summary_lines(&members))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_overlay_form() {
        let mut form = CollectionForm {
            title: Some("Maps".to_string()),
            description: Some("Old".to_string()),
            ..Default::default()
        };
        CollectionFields {
            description: Some("New".to_string()),
            ..Default::default()
        }
        .apply_to(&mut form);
        assert_eq!(form.title.as_deref(), Some("Maps"));
        assert_eq!(form.description.as_deref(), Some("New"));
    }

    #[test]
    fn test_summary_lines() {
        let objects = vec![
            ObjectSummary {
                pid: Pid::parse("demo:1").unwrap(),
                label: "One".to_string(),
            },
            ObjectSummary {
                pid: Pid::parse("demo:2").unwrap(),
                label: "Two".to_string(),
            },
        ];
        assert_eq!(summary_lines(&objects), "demo:1\tOne\ndemo:2\tTwo");
    }
}
