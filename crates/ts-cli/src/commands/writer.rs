//! Writer command for showing or relabeling this writer's identity.

use std::io::Write;

use anyhow::Result;

use crate::writer::{self, WriterIdentity};

pub fn run<W: Write>(out: &mut W, label: Option<&str>) -> Result<()> {
    let identity = writer::init_writer(label)?;
    print_identity(out, &identity)?;
    writeln!(out, "Saved to:  {}", writer::writer_json_path()?.display())?;
    Ok(())
}

fn print_identity<W: Write>(out: &mut W, identity: &WriterIdentity) -> Result<()> {
    writeln!(out, "Writer ID: {}", identity.writer_id)?;
    writeln!(out, "Label:     {}", identity.label)?;
    writeln!(out, "Tag:       {}", identity.tag())?;
    Ok(())
}
