//! The `kinds` command: show how objects are classified.

use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::cli::{GlobalArgs, OutputSink, Result};
use crate::kinds::{KindTable, ObjectKind, DIGITAL_OBJECT_KINDS};

/// Arguments for the kinds command.
#[derive(Args, Debug)]
pub struct KindsArgs {
    #[command(flatten)]
    pub output: OutputSink,
}

#[derive(Debug, Serialize)]
struct KindRow {
    kind: ObjectKind,
    master_dsid: &'static str,
    content_models: Vec<&'static str>,
    mimetypes: Vec<&'static str>,
    has_preview: bool,
}

#[derive(Debug, Serialize)]
struct KindsOutput {
    kinds: Vec<KindRow>,
    fallback: ObjectKind,
}

fn kinds_output(table: &KindTable<'static, ObjectKind>) -> KindsOutput {
    let kinds = table
        .specs()
        .iter()
        .map(|spec| KindRow {
            kind: spec.kind,
            master_dsid: spec.kind.master_dsid(),
            content_models: spec.content_models.to_vec(),
            mimetypes: spec.mimetypes.to_vec(),
            has_preview: spec.kind.has_preview(),
        })
        .collect();
    KindsOutput {
        kinds,
        fallback: table.fallback(),
    }
}

fn kinds_text(output: &KindsOutput) -> String {
    let mut lines = Vec::new();
    for (i, row) in output.kinds.iter().enumerate() {
        lines.push(format!("{}. {} (master: {})", i + 1, row.kind, row.master_dsid));
        lines.push(format!("   content models: {}", row.content_models.join(", ")));
        if !row.mimetypes.is_empty() {
            lines.push(format!("   mimetypes: {}", row.mimetypes.join(", ")));
        }
    }
    lines.push(format!("fallback: {}", output.fallback));
    lines.join("\n")
}

impl KindsArgs {
    pub async fn run(self, _app: &App, global: &GlobalArgs) -> Result<()> {
        let output = kinds_output(&DIGITAL_OBJECT_KINDS);
        self.output
            .write(&output, global.json, &kinds_text(&output))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_listed_in_table_order() {
        let output = kinds_output(&DIGITAL_OBJECT_KINDS);
        assert_eq!(output.kinds[0].kind, ObjectKind::Image);
        assert_eq!(output.fallback, ObjectKind::File);

        let text = kinds_text(&output);
        assert!(text.starts_with("1. image (master: source-image)"));
        assert!(text.ends_with("fallback: file"));
    }
}
